// ============================================================================
// EDITOR PANEL — card text, background, branding and typography controls
// ============================================================================
//
// Mutates the visual state directly for in-process edits; anything that
// needs an app-level service (file dialogs, generation requests) comes back
// as an `EditorAction` for the app to run.

use eframe::egui;

use crate::ops::ai::VisualField;
use crate::visual::{
    TextAlign, TemplateStyle, VisualState, MAX_FONT_SIZE, MAX_IMAGE_SCALE, MIN_FONT_SIZE,
    MIN_IMAGE_SCALE,
};

/// Solid background swatches offered on the minimal template.
const MINIMAL_PALETTE: [[u8; 3]; 7] = [
    [0xFF, 0xFF, 0xFF],
    [0xF5, 0xF5, 0xF7],
    [0xE0, 0xF2, 0xFE],
    [0xFC, 0xE7, 0xF3],
    [0xFE, 0xF3, 0xC7],
    [0xD1, 0xFA, 0xE5],
    [0xEE, 0xEB, 0xFF],
];

const FONT_WEIGHTS: [(u16, &str); 4] = [
    (400, "Regular"),
    (500, "Medium"),
    (600, "Semibold"),
    (700, "Bold"),
];

/// Requests the panel cannot fulfil itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorAction {
    UploadBackground,
    UploadLogo,
    UploadAvatar,
    RegenerateField(VisualField),
}

#[derive(Default)]
pub struct EditorOutput {
    pub actions: Vec<EditorAction>,
    /// True when the visual state was edited and the preview must
    /// re-composite.
    pub changed: bool,
}

pub struct EditorPanel {
    /// System families for the typography dropdown, enumerated once.
    font_families: Option<Vec<String>>,
}

impl EditorPanel {
    pub fn new() -> Self {
        Self { font_families: None }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        visual: &mut VisualState,
        template: TemplateStyle,
        generation_available: bool,
    ) -> EditorOutput {
        let mut out = EditorOutput::default();

        self.text_section(ui, visual, generation_available, &mut out);
        ui.separator();
        self.background_section(ui, visual, template, &mut out);
        ui.separator();
        if template == TemplateStyle::MinimalTypography {
            self.author_section(ui, visual, &mut out);
            ui.separator();
        }
        self.logo_section(ui, visual, &mut out);
        ui.separator();
        self.typography_section(ui, visual, &mut out);

        out
    }

    // -- Card text ----------------------------------------------------------

    fn text_section(
        &mut self,
        ui: &mut egui::Ui,
        visual: &mut VisualState,
        generation_available: bool,
        out: &mut EditorOutput,
    ) {
        ui.label("Headline");
        ui.horizontal(|ui| {
            if ui
                .add(egui::TextEdit::multiline(&mut visual.headline).desired_rows(2))
                .changed()
            {
                out.changed = true;
            }
            if ui
                .add_enabled(generation_available, egui::Button::new("↻"))
                .on_hover_text("Regenerate headline")
                .clicked()
            {
                out.actions.push(EditorAction::RegenerateField(VisualField::Headline));
            }
        });

        ui.label("Sub-headline");
        ui.horizontal(|ui| {
            if ui
                .add(egui::TextEdit::multiline(&mut visual.sub_headline).desired_rows(2))
                .changed()
            {
                out.changed = true;
            }
            if ui
                .add_enabled(generation_available, egui::Button::new("↻"))
                .on_hover_text("Regenerate sub-headline")
                .clicked()
            {
                out.actions
                    .push(EditorAction::RegenerateField(VisualField::SubHeadline));
            }
        });
    }

    // -- Background ----------------------------------------------------------

    fn background_section(
        &mut self,
        ui: &mut egui::Ui,
        visual: &mut VisualState,
        template: TemplateStyle,
        out: &mut EditorOutput,
    ) {
        ui.label("Background");
        ui.horizontal(|ui| {
            if ui.button("Add image").clicked() {
                out.actions.push(EditorAction::UploadBackground);
            }
            if template == TemplateStyle::MinimalTypography
                && ui.button("Pattern").clicked()
            {
                visual.clear_background();
                out.changed = true;
            }
            if visual.background_image.is_some() || visual.background_color.is_some() {
                if ui.button("Remove").clicked() {
                    visual.clear_background();
                    out.changed = true;
                }
            }
        });

        if template == TemplateStyle::MinimalTypography {
            ui.horizontal(|ui| {
                for rgb in MINIMAL_PALETTE {
                    let selected = visual.background_color == Some(rgb);
                    let color = egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2]);
                    let (rect, resp) =
                        ui.allocate_exact_size(egui::vec2(20.0, 20.0), egui::Sense::click());
                    ui.painter().rect_filled(rect, 3.0, color);
                    if selected {
                        ui.painter().rect_stroke(
                            rect,
                            3.0,
                            egui::Stroke::new(2.0, ui.visuals().selection.stroke.color),
                        );
                    }
                    if resp.clicked() {
                        visual.set_background_color(rgb);
                        out.changed = true;
                    }
                }
            });
        }

        // Zoom only applies while a photo is set.
        if visual.background_image.is_some() {
            let mut scale = visual.image_scale;
            ui.horizontal(|ui| {
                ui.label("Zoom");
                if ui
                    .add(
                        egui::Slider::new(&mut scale, MIN_IMAGE_SCALE..=MAX_IMAGE_SCALE)
                            .step_by(0.05),
                    )
                    .changed()
                {
                    visual.set_image_scale(scale);
                    out.changed = true;
                }
            });
        }
    }

    // -- Author (minimal template only) ---------------------------------------

    fn author_section(&mut self, ui: &mut egui::Ui, visual: &mut VisualState, out: &mut EditorOutput) {
        ui.label("Author");
        if ui.text_edit_singleline(&mut visual.author_name).changed() {
            out.changed = true;
        }
        if ui.text_edit_singleline(&mut visual.author_handle).changed() {
            out.changed = true;
        }
        ui.horizontal(|ui| {
            if ui.button("Upload photo").clicked() {
                out.actions.push(EditorAction::UploadAvatar);
            }
            if visual.author_image.is_some() && ui.button("Remove").clicked() {
                visual.author_image = None;
                out.changed = true;
            }
        });
    }

    // -- Logo ----------------------------------------------------------

    fn logo_section(&mut self, ui: &mut egui::Ui, visual: &mut VisualState, out: &mut EditorOutput) {
        ui.label("Logo");
        ui.horizontal(|ui| {
            if ui.button("Add logo").clicked() {
                out.actions.push(EditorAction::UploadLogo);
            }
            if visual.logo_image.is_some() && ui.button("Remove").clicked() {
                visual.logo_image = None;
                out.changed = true;
            }
        });
    }

    // -- Typography ----------------------------------------------------------

    fn typography_section(
        &mut self,
        ui: &mut egui::Ui,
        visual: &mut VisualState,
        out: &mut EditorOutput,
    ) {
        ui.label("Typography");
        let settings = &mut visual.headline_settings;

        // Family
        let families = self
            .font_families
            .get_or_insert_with(crate::assets::enumerate_system_fonts);
        let selected_label = if settings.font_family.is_empty() {
            "Default".to_string()
        } else {
            settings.font_family.clone()
        };
        egui::ComboBox::from_label("Font")
            .selected_text(selected_label)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(settings.font_family.is_empty(), "Default")
                    .clicked()
                {
                    settings.font_family.clear();
                    out.changed = true;
                }
                for family in families.iter() {
                    if ui
                        .selectable_label(settings.font_family == *family, family)
                        .clicked()
                    {
                        settings.font_family = family.clone();
                        out.changed = true;
                    }
                }
            });

        // Weight
        let weight_label = FONT_WEIGHTS
            .iter()
            .find(|(w, _)| *w == settings.font_weight)
            .map(|(_, label)| *label)
            .unwrap_or("Semibold");
        egui::ComboBox::from_label("Weight")
            .selected_text(weight_label)
            .show_ui(ui, |ui| {
                for (weight, label) in FONT_WEIGHTS {
                    if ui
                        .selectable_label(settings.font_weight == weight, label)
                        .clicked()
                    {
                        settings.font_weight = weight;
                        out.changed = true;
                    }
                }
            });

        // Size / letter spacing
        ui.horizontal(|ui| {
            ui.label("Size");
            let mut size = settings.font_size;
            if ui
                .add(
                    egui::DragValue::new(&mut size)
                        .clamp_range(MIN_FONT_SIZE..=MAX_FONT_SIZE)
                        .speed(1.0),
                )
                .changed()
            {
                settings.set_font_size(size);
                out.changed = true;
            }

            ui.label("Spacing");
            let mut spacing_pct = settings.letter_spacing * 100.0;
            if ui
                .add(
                    egui::DragValue::new(&mut spacing_pct)
                        .clamp_range(-20.0..=50.0)
                        .speed(0.5)
                        .suffix("%"),
                )
                .changed()
            {
                settings.letter_spacing = spacing_pct / 100.0;
                out.changed = true;
            }
        });

        // Alignment / emphasis / color
        ui.horizontal(|ui| {
            for (align, label) in [
                (TextAlign::Left, "Left"),
                (TextAlign::Center, "Center"),
                (TextAlign::Right, "Right"),
            ] {
                if ui
                    .selectable_label(settings.text_align == align, label)
                    .clicked()
                {
                    settings.text_align = align;
                    out.changed = true;
                }
            }
        });
        ui.horizontal(|ui| {
            if ui.selectable_label(settings.is_italic, "Italic").clicked() {
                settings.is_italic = !settings.is_italic;
                out.changed = true;
            }
            if ui
                .selectable_label(settings.is_underline, "Underline")
                .clicked()
            {
                settings.is_underline = !settings.is_underline;
                out.changed = true;
            }

            let mut rgb = settings.color;
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                settings.color = rgb;
                out.changed = true;
            }
        });
    }
}

impl Default for EditorPanel {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// LINGENS APP — top-level egui application state and frame loop
// ============================================================================
//
// One editor session: raw notes on the left, generated post below them,
// template picker and the live card in the center, controls on the right.
// Generation runs on worker threads and reports through an mpsc channel;
// the UI thread only ever applies completed results.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::assets::FontLibrary;
use crate::components::card::CardView;
use crate::components::editor::{EditorAction, EditorPanel};
use crate::components::history::{show_history_window, GenerationHistory, HistoryItem};
use crate::ops::ai::{
    spawn_generation, GenerationJob, GenerationUpdate, HttpTextGenerationClient, PostLength,
    TextGenerationClient, VisualField,
};
use crate::ops::render::render_card;
use crate::visual::{Position, TemplateStyle, VisualState};

const TOAST_LIFETIME: Duration = Duration::from_secs(4);

struct Toast {
    text: String,
    is_error: bool,
    born: Instant,
}

pub struct LingensApp {
    // Card state
    visual: VisualState,
    template: TemplateStyle,

    // Generation
    raw_input: String,
    selected_length: PostLength,
    generated_post: String,
    client: Option<Arc<dyn TextGenerationClient>>,
    generating: bool,
    gen_tx: mpsc::Sender<GenerationUpdate>,
    gen_rx: mpsc::Receiver<GenerationUpdate>,

    // History
    history: GenerationHistory,
    show_history: bool,

    // UI
    card_view: CardView,
    editor: EditorPanel,
    fonts: FontLibrary,
    toasts: Vec<Toast>,
}

impl LingensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (gen_tx, gen_rx) = mpsc::channel();

        let client: Option<Arc<dyn TextGenerationClient>> = match HttpTextGenerationClient::from_env()
        {
            Some(client) => Some(Arc::new(client)),
            None => {
                crate::log_warn!("LINGENS_API_URL not set, text generation disabled");
                None
            }
        };

        Self {
            visual: VisualState::default(),
            template: TemplateStyle::BottomTextImage,
            raw_input: String::new(),
            selected_length: PostLength::Short,
            generated_post: String::new(),
            client,
            generating: false,
            gen_tx,
            gen_rx,
            history: GenerationHistory::load(GenerationHistory::default_path()),
            show_history: false,
            card_view: CardView::new(),
            editor: EditorPanel::new(),
            fonts: FontLibrary::new(),
            toasts: Vec::new(),
        }
    }

    fn toast(&mut self, text: impl Into<String>) {
        self.toasts.push(Toast {
            text: text.into(),
            is_error: false,
            born: Instant::now(),
        });
    }

    fn toast_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        crate::log_err!("{}", text);
        self.toasts.push(Toast {
            text,
            is_error: true,
            born: Instant::now(),
        });
    }

    fn submit(&mut self, job: GenerationJob) {
        let Some(client) = self.client.clone() else {
            self.toast_error("Text generation is not configured");
            return;
        };
        self.generating = true;
        spawn_generation(client, job, self.gen_tx.clone());
    }

    // -- Channel drain ------------------------------------------------------

    fn apply_generation_updates(&mut self) {
        while let Ok(update) = self.gen_rx.try_recv() {
            self.generating = false;
            match update {
                GenerationUpdate::PostGenerated(content) => {
                    self.generated_post = content.post_text.clone();
                    if !content.headline.is_empty() {
                        self.visual.headline = content.headline;
                    }
                    if !content.sub_headline.is_empty() {
                        self.visual.sub_headline = content.sub_headline;
                    }
                    self.card_view.invalidate();
                    self.history.prepend(HistoryItem::new(
                        content.post_text,
                        self.visual.clone(),
                        self.template,
                    ));
                }
                GenerationUpdate::TextRegenerated(text) => {
                    self.generated_post = text;
                }
                GenerationUpdate::FieldRegenerated(field, text) => {
                    match field {
                        VisualField::Headline => self.visual.headline = text,
                        VisualField::SubHeadline => self.visual.sub_headline = text,
                    }
                    self.card_view.invalidate();
                }
                GenerationUpdate::Failed(msg) => {
                    self.toast_error(format!("Generation failed: {}", msg));
                }
            }
        }
    }

    // -- Editor actions ------------------------------------------------------

    fn handle_editor_actions(&mut self, actions: Vec<EditorAction>) {
        for action in actions {
            match action {
                EditorAction::UploadBackground => {
                    if let Some(path) = crate::io::pick_image_file() {
                        match crate::io::load_image_file(&path) {
                            Ok(img) => {
                                self.visual.set_background_image(img);
                                // A fresh photo starts centered at cover fit.
                                self.visual.set_image_scale(1.0);
                                self.visual.update_image_position(Position::ZERO);
                                self.card_view.invalidate();
                            }
                            Err(e) => self.toast_error(e),
                        }
                    }
                }
                EditorAction::UploadLogo => {
                    if let Some(path) = crate::io::pick_image_file() {
                        match crate::io::load_image_file(&path) {
                            Ok(img) => {
                                self.visual.logo_image = Some(img);
                                self.card_view.invalidate();
                            }
                            Err(e) => self.toast_error(e),
                        }
                    }
                }
                EditorAction::UploadAvatar => {
                    if let Some(path) = crate::io::pick_image_file() {
                        match crate::io::load_image_file(&path) {
                            Ok(img) => {
                                self.visual.author_image = Some(img);
                                self.card_view.invalidate();
                            }
                            Err(e) => self.toast_error(e),
                        }
                    }
                }
                EditorAction::RegenerateField(field) => {
                    self.submit(GenerationJob::RegenerateField {
                        raw_input: self.raw_input.clone(),
                        field,
                    });
                }
            }
        }
    }

    // -- Export / clipboard --------------------------------------------------

    fn export_card(&mut self) {
        let Some(path) = crate::io::pick_export_path() else {
            return;
        };
        // Always composite fresh at 1x; the preview texture is never reused.
        let rendered = render_card(self.template, &self.visual, &self.fonts);
        match crate::io::write_card_png(&rendered.image, &path) {
            Ok(()) => {
                crate::log_info!("Exported card to {}", path.display());
                self.toast(format!("Saved {}", path.display()));
            }
            Err(e) => self.toast_error(e),
        }
    }

    fn copy_post_to_clipboard(&mut self) {
        let text = self.generated_post.clone();
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
            Ok(()) => self.toast("Post copied"),
            Err(e) => self.toast_error(format!("Clipboard error: {}", e)),
        }
    }

    // -- Panels ------------------------------------------------------

    fn input_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Notes");
        ui.add(
            egui::TextEdit::multiline(&mut self.raw_input)
                .desired_rows(8)
                .desired_width(f32::INFINITY)
                .hint_text("Raw thoughts, bullet points, a voice-note transcript..."),
        );

        ui.horizontal(|ui| {
            for length in PostLength::ALL {
                if ui
                    .selectable_label(self.selected_length == length, length.label())
                    .clicked()
                {
                    self.selected_length = length;
                }
            }
        });

        let can_generate =
            self.client.is_some() && !self.raw_input.trim().is_empty() && !self.generating;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_generate, egui::Button::new("Generate post"))
                .clicked()
            {
                self.submit(GenerationJob::GeneratePost {
                    raw_input: self.raw_input.clone(),
                    length: self.selected_length,
                });
            }
            if self.generating {
                ui.spinner();
            }
        });

        ui.separator();
        ui.heading("Post");
        egui::ScrollArea::vertical()
            .max_height(260.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.generated_post)
                        .desired_rows(10)
                        .desired_width(f32::INFINITY),
                );
            });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.generated_post.is_empty(), egui::Button::new("Copy"))
                .clicked()
            {
                self.copy_post_to_clipboard();
            }
            if ui
                .add_enabled(can_generate, egui::Button::new("Rewrite"))
                .clicked()
            {
                self.submit(GenerationJob::RegenerateText {
                    raw_input: self.raw_input.clone(),
                    length: self.selected_length,
                });
            }
        });

        ui.separator();
        if ui.button("History").clicked() {
            self.show_history = !self.show_history;
        }
    }

    fn template_picker(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Template:");
            for template in TemplateStyle::ALL {
                if ui
                    .selectable_label(self.template == template, template.label())
                    .clicked()
                    && self.template != template
                {
                    self.template = template;
                    self.visual.apply_template(template);
                    self.card_view.invalidate();
                }
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Download PNG").clicked() {
                    self.export_card();
                }
            });
        });
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        self.toasts.retain(|t| t.born.elapsed() < TOAST_LIFETIME);
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 16.0))
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    let color = if toast.is_error {
                        ui.visuals().error_fg_color
                    } else {
                        ui.visuals().strong_text_color()
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.colored_label(color, &toast.text);
                    });
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl eframe::App for LingensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_generation_updates();
        if self.generating {
            // Poll the channel while a worker is in flight.
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        egui::SidePanel::left("input_panel")
            .default_width(340.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.input_panel(ui);
                });
            });

        egui::SidePanel::right("editor_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let out = self.editor.show(
                        ui,
                        &mut self.visual,
                        self.template,
                        self.client.is_some() && !self.generating,
                    );
                    if out.changed {
                        self.card_view.invalidate();
                    }
                    self.handle_editor_actions(out.actions);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.template_picker(ui);
            ui.separator();
            ui.vertical_centered(|ui| {
                self.card_view
                    .show(ui, &mut self.visual, self.template, &self.fonts, true);
            });
        });

        let mut open = self.show_history;
        if let Some(id) = show_history_window(ctx, &mut open, &self.history) {
            if let Some(item) = self.history.get(id).cloned() {
                self.visual = item.visual;
                self.template = item.template;
                self.generated_post = item.post_text;
                self.card_view.invalidate();
                self.toast("Snapshot restored");
            }
        }
        self.show_history = open;

        self.show_toasts(ctx);
    }
}

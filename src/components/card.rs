// ============================================================================
// CARD PREVIEW — interactive 500×625 card shown at preview scale
// ============================================================================
//
// Wraps the pure renderer in an egui widget: composites to a texture,
// converts pointer coordinates from screen space to card space, and drives
// the drag controller. All coordinates handed to the layout model are card
// pixels, so drag distances are zoom-independent.

use eframe::egui;

use crate::assets::FontLibrary;
use crate::drag::{DragController, DragTarget};
use crate::ops::render::{render_card, CardRect};
use crate::visual::{Position, TemplateStyle, VisualState, CARD_HEIGHT, CARD_WIDTH};

/// On-screen preview scale. Export always composites at 1×.
const PREVIEW_SCALE: f32 = 0.65;

pub struct CardView {
    texture: Option<egui::TextureHandle>,
    headline_rect: CardRect,
    drag: DragController,
    dirty: bool,
}

impl CardView {
    pub fn new() -> Self {
        Self {
            texture: None,
            headline_rect: CardRect::default(),
            drag: DragController::new(),
            dirty: true,
        }
    }

    /// Force a re-composite on the next frame. Call after any mutation of
    /// the visual state or template outside this widget.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        visual: &mut VisualState,
        template: TemplateStyle,
        fonts: &FontLibrary,
        editable: bool,
    ) {
        if self.dirty || self.texture.is_none() {
            self.recomposite(ui.ctx(), visual, template, fonts);
        }

        let size = egui::vec2(
            CARD_WIDTH as f32 * PREVIEW_SCALE,
            CARD_HEIGHT as f32 * PREVIEW_SCALE,
        );
        let (rect, resp) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        ui.painter().rect_stroke(
            rect,
            4.0,
            egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
        );

        if !editable {
            return;
        }

        // Gesture start: headline block takes precedence over the photo.
        if resp.drag_started() {
            if let Some(pointer) = resp.interact_pointer_pos() {
                let card_pos = screen_to_card(rect.min, PREVIEW_SCALE, pointer);
                if self.headline_rect.contains(card_pos.x, card_pos.y) {
                    self.drag.begin(
                        DragTarget::Text,
                        card_pos,
                        visual.headline_settings.position,
                    );
                } else if visual.background_image.is_some() {
                    self.drag
                        .begin(DragTarget::Background, card_pos, visual.image_position);
                }
            }
        }

        // Track the pointer globally while the drag is live, so moves
        // outside the preview rect keep updating the position.
        if self.drag.is_dragging() {
            let (primary_down, pointer) = ui.input(|i| (i.pointer.primary_down(), i.pointer.interact_pos()));
            if primary_down {
                if let Some(pointer) = pointer {
                    let card_pos = screen_to_card(rect.min, PREVIEW_SCALE, pointer);
                    if let Some((target, pos)) = self.drag.update(card_pos) {
                        match target {
                            DragTarget::Background => visual.update_image_position(pos),
                            DragTarget::Text => visual.update_text_position(pos),
                        }
                        self.dirty = true;
                    }
                }
            } else {
                self.drag.end();
            }
        }

        let cursor = if self.drag.is_dragging() {
            egui::CursorIcon::Grabbing
        } else {
            egui::CursorIcon::Grab
        };
        let _ = resp.on_hover_cursor(cursor);
    }

    fn recomposite(
        &mut self,
        ctx: &egui::Context,
        visual: &VisualState,
        template: TemplateStyle,
        fonts: &FontLibrary,
    ) {
        let rendered = render_card(template, visual, fonts);
        self.headline_rect = rendered.headline_rect;

        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [rendered.image.width() as usize, rendered.image.height() as usize],
            rendered.image.as_raw(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("card-preview", color_image, egui::TextureOptions::LINEAR));
            }
        }
        self.dirty = false;
    }
}

impl Default for CardView {
    fn default() -> Self {
        Self::new()
    }
}

/// Screen pixels → card pixels, given the preview's top-left corner and
/// scale. Valid outside the preview rect too (drags may leave it).
fn screen_to_card(origin: egui::Pos2, scale: f32, pointer: egui::Pos2) -> Position {
    Position::new((pointer.x - origin.x) / scale, (pointer.y - origin.y) / scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn screen_to_card_inverts_the_preview_transform() {
        let origin = egui::pos2(100.0, 40.0);
        // Card center lands at origin + card_size/2 * scale on screen.
        let on_screen = egui::pos2(
            100.0 + CARD_WIDTH as f32 * 0.5 * PREVIEW_SCALE,
            40.0 + CARD_HEIGHT as f32 * 0.5 * PREVIEW_SCALE,
        );
        let card = screen_to_card(origin, PREVIEW_SCALE, on_screen);
        assert_eq!(card, Position::new(250.0, 312.5));
    }

    #[test]
    fn screen_to_card_handles_points_outside_the_preview() {
        let origin = egui::pos2(0.0, 0.0);
        let card = screen_to_card(origin, 0.5, egui::pos2(-10.0, 400.0));
        assert_eq!(card, Position::new(-20.0, 800.0));
    }

    #[test]
    fn drag_distance_is_scale_independent_in_card_space() {
        // The same card-space gesture at two zoom levels produces the same
        // card-space delta.
        let origin = egui::pos2(0.0, 0.0);
        for scale in [0.5_f32, 1.0] {
            let a = screen_to_card(origin, scale, egui::pos2(10.0 * scale, 0.0));
            let b = screen_to_card(origin, scale, egui::pos2(35.0 * scale, 0.0));
            let delta = b - a;
            assert!((delta.x - 25.0).abs() < 1e-3);
        }
    }
}

// ============================================================================
// TEMPLATE VARIANT RENDERER — (template, state) → composited 500×625 card
// ============================================================================
//
// A pure function over the layout model: the editable preview, the export
// path, and the headless CLI all call `render_card` and get byte-identical
// output for identical input. Editability (drag wiring, cursors) lives
// entirely in the view layer.

use image::{Rgba, RgbaImage};

use crate::assets::FontLibrary;
use crate::canvas::CardCanvas;
use crate::ops::text::{draw_text, parse_emphasis, shape_plain, shape_text, TextStyle};
use crate::visual::{TextAlign, TemplateStyle, VisualState, CARD_HEIGHT, CARD_WIDTH};

// Palette (shared with the original's Tailwind tokens).
const MINIMAL_BASE: [u8; 3] = [0xF9, 0xFA, 0xFB];
const SLATE_BASE: [u8; 3] = [0x33, 0x41, 0x55];
const DOT_COLOR: Rgba<u8> = Rgba([0x94, 0xA3, 0xB8, 102]);
const NAME_COLOR: [u8; 3] = [0x11, 0x18, 0x27];
const MUTED_COLOR: [u8; 3] = [0x6B, 0x72, 0x80];
const HEADLINE_DARK: [u8; 3] = [0x11, 0x11, 0x11];
const AVATAR_PLACEHOLDER: Rgba<u8> = Rgba([0xD1, 0xD5, 0xDB, 255]);

// Minimal template padding; the overlay templates run tighter.
const MINIMAL_PAD_X: f32 = 56.0;
const MINIMAL_PAD_Y: f32 = 48.0;
const OVERLAY_PAD_X: f32 = 32.0;

const LOGO_HEIGHT: f32 = 24.0;

/// An axis-aligned card-space rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CardRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl CardRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// A composited card plus the layout facts the interactive preview needs
/// for hit-testing (the headline block takes drag precedence over the
/// background wherever they overlap).
pub struct RenderedCard {
    pub image: RgbaImage,
    pub headline_rect: CardRect,
}

pub fn render_card(template: TemplateStyle, data: &VisualState, fonts: &FontLibrary) -> RenderedCard {
    match template {
        TemplateStyle::MinimalTypography => render_minimal(data, fonts),
        TemplateStyle::BoldTextOverlay => render_bold(data, fonts),
        TemplateStyle::BottomTextImage => render_bottom(data, fonts),
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

/// Full-bleed background for the overlay templates: photo (cover-fit with
/// zoom and drag offset) > solid color > slate fallback.
fn draw_overlay_background(canvas: &mut CardCanvas, data: &VisualState) {
    if let Some(img) = &data.background_image {
        canvas.draw_image_cover(&img.pixels, data.image_scale, data.image_position);
    } else if let Some(rgb) = data.background_color {
        canvas.fill_rect(
            0.0,
            0.0,
            CARD_WIDTH as f32,
            CARD_HEIGHT as f32,
            Rgba([rgb[0], rgb[1], rgb[2], 255]),
        );
    }
    // Otherwise the slate base fill shows through.
}

/// Draw a logo scaled to a fixed height, preserving aspect. Returns the
/// drawn width.
fn draw_logo(canvas: &mut CardCanvas, logo: &RgbaImage, x: f32, y: f32, height: f32) -> f32 {
    if logo.height() == 0 {
        return 0.0;
    }
    let w = logo.width() as f32 * height / logo.height() as f32;
    canvas.draw_image_scaled(logo, x, y, w, height);
    w
}

/// Shape and draw the headline with its typography settings; returns the
/// block rect actually used (drag offset included).
fn draw_headline(
    canvas: &mut CardCanvas,
    data: &VisualState,
    fonts: &FontLibrary,
    block_x: f32,
    block_y: f32,
    block_w: f32,
    color: [u8; 3],
) -> CardRect {
    let s = &data.headline_settings;
    let x = block_x + s.position.x;
    let y = block_y + s.position.y;

    let Some(font) = fonts.get(&s.font_family, s.font_weight, s.is_italic) else {
        crate::log_warn!("headline font unavailable, skipping text layer");
        return CardRect { x, y, w: block_w, h: s.font_size };
    };

    let segments = parse_emphasis(&data.headline);
    let shaped = shape_text(
        &font,
        &segments,
        s.font_size,
        s.letter_spacing,
        s.line_height,
        block_w,
    );
    let style = TextStyle {
        font: &font,
        color,
        align: s.text_align,
        italic: s.is_italic,
        underline: s.is_underline,
    };
    draw_text(canvas, &shaped, &style, x, y, block_w);

    CardRect {
        x,
        y,
        w: block_w,
        h: shaped.height().max(s.font_size),
    }
}

/// Measure the headline height without drawing (bottom-anchored layout
/// needs it before the draw position is known).
fn headline_height(data: &VisualState, fonts: &FontLibrary, block_w: f32) -> f32 {
    let s = &data.headline_settings;
    let Some(font) = fonts.get(&s.font_family, s.font_weight, s.is_italic) else {
        return s.font_size;
    };
    let segments = parse_emphasis(&data.headline);
    let shaped = shape_text(&font, &segments, s.font_size, s.letter_spacing, s.line_height, block_w);
    shaped.height().max(s.font_size)
}

// ============================================================================
// MINIMAL_TYPOGRAPHY
// ============================================================================
//
// Light card: photo-with-wash, flat color, or dot grid. Logo top-left,
// vertically centered author row + left-aligned headline, gray supporting
// line pinned at the bottom.

fn render_minimal(data: &VisualState, fonts: &FontLibrary) -> RenderedCard {
    let base = data.background_color.unwrap_or(MINIMAL_BASE);
    let mut canvas = CardCanvas::new_filled(CARD_WIDTH, CARD_HEIGHT, base);

    if let Some(photo) = data.user_background_image() {
        canvas.draw_image_cover(&photo.pixels, data.image_scale, data.image_position);
        // Translucent wash + slight blur keeps the dark text readable.
        canvas.box_blur(2);
        canvas.tint(Rgba([255, 255, 255, 128]));
    } else if data.background_color.is_none() {
        canvas.draw_dot_grid(20, 1.0, DOT_COLOR);
    }

    let content_w = CARD_WIDTH as f32 - 2.0 * MINIMAL_PAD_X;
    let mut content_top = MINIMAL_PAD_Y;

    // Logo only when present — no placeholder.
    if let Some(logo) = &data.logo_image {
        draw_logo(&mut canvas, &logo.pixels, MINIMAL_PAD_X, content_top + 8.0, LOGO_HEIGHT);
        content_top += 8.0 + LOGO_HEIGHT + 16.0;
    }

    // Bottom boundary shrinks when a sub-headline is pinned below.
    let sub_font = fonts.get("", 400, false);
    let sub_shaped = match (&sub_font, data.sub_headline.is_empty()) {
        (Some(font), false) => Some(shape_plain(font, &data.sub_headline, 16.0, 1.6, content_w)),
        _ => None,
    };
    let mut content_bottom = CARD_HEIGHT as f32 - MINIMAL_PAD_Y;
    if let Some(shaped) = &sub_shaped {
        content_bottom -= shaped.height() + 24.0;
    }

    // Center the author row + headline stack in the remaining space.
    const AVATAR: f32 = 48.0;
    const AUTHOR_GAP: f32 = 40.0;
    let headline_h = headline_height(data, fonts, content_w);
    let stack_h = AVATAR + AUTHOR_GAP + headline_h;
    let stack_top = (content_top + (content_bottom - content_top - stack_h) * 0.5).max(content_top);

    // Author row: avatar circle, bold name, muted handle.
    let avatar_cx = MINIMAL_PAD_X + AVATAR * 0.5;
    let avatar_cy = stack_top + AVATAR * 0.5;
    match &data.author_image {
        Some(img) => canvas.draw_image_circle(&img.pixels, avatar_cx, avatar_cy, AVATAR * 0.5),
        None => canvas.fill_circle(avatar_cx, avatar_cy, AVATAR * 0.5, AVATAR_PLACEHOLDER),
    }
    let text_x = MINIMAL_PAD_X + AVATAR + 16.0;
    let text_w = content_w - AVATAR - 16.0;
    if let (Some(bold), Some(regular)) = (fonts.get("", 700, false), &sub_font) {
        let name = shape_plain(&bold, &data.author_name, 20.0, 1.1, text_w);
        let name_style = TextStyle {
            font: &bold,
            color: NAME_COLOR,
            align: TextAlign::Left,
            italic: false,
            underline: false,
        };
        draw_text(&mut canvas, &name, &name_style, text_x, stack_top + 6.0, text_w);

        let handle = shape_plain(regular, &data.author_handle, 14.0, 1.1, text_w);
        let handle_style = TextStyle {
            font: regular,
            color: MUTED_COLOR,
            align: TextAlign::Left,
            italic: false,
            underline: false,
        };
        draw_text(&mut canvas, &handle, &handle_style, text_x, stack_top + 30.0, text_w);
    }

    let headline_rect = draw_headline(
        &mut canvas,
        data,
        fonts,
        MINIMAL_PAD_X,
        stack_top + AVATAR + AUTHOR_GAP,
        content_w,
        HEADLINE_DARK,
    );

    if let (Some(shaped), Some(font)) = (&sub_shaped, &sub_font) {
        let style = TextStyle {
            font,
            color: MUTED_COLOR,
            align: TextAlign::Left,
            italic: false,
            underline: false,
        };
        let y = CARD_HEIGHT as f32 - MINIMAL_PAD_Y - shaped.height();
        draw_text(&mut canvas, shaped, &style, MINIMAL_PAD_X, y, content_w);
    }

    RenderedCard {
        image: canvas.into_image(),
        headline_rect,
    }
}

// ============================================================================
// BOLD_TEXT_OVERLAY
// ============================================================================
//
// Full-bleed background under a top-weighted dark gradient; logo, uppercase
// sub-headline label and the headline anchored near the top.

fn render_bold(data: &VisualState, fonts: &FontLibrary) -> RenderedCard {
    let mut canvas = CardCanvas::new_filled(CARD_WIDTH, CARD_HEIGHT, SLATE_BASE);
    draw_overlay_background(&mut canvas, data);
    canvas.gradient_vertical(
        0.0,
        CARD_HEIGHT as f32 * 0.7,
        &[(0.0, 0.7), (0.5, 0.24), (1.0, 0.0)],
    );

    let content_w = CARD_WIDTH as f32 - 2.0 * OVERLAY_PAD_X;
    // Without a logo the text block starts a little higher up the card.
    let mut y = if data.logo_image.is_some() { 48.0 } else { 64.0 };

    if let Some(logo) = &data.logo_image {
        let w = logo.pixels.width() as f32 * LOGO_HEIGHT / logo.pixels.height().max(1) as f32;
        let x = (CARD_WIDTH as f32 - w) * 0.5;
        draw_logo(&mut canvas, &logo.pixels, x, y, LOGO_HEIGHT);
        y += LOGO_HEIGHT + 24.0;
    }

    if !data.sub_headline.is_empty() {
        if let Some(font) = fonts.get("", 500, false) {
            let label = data.sub_headline.to_uppercase();
            let segments = [crate::ops::text::RichSegment {
                text: label,
                emphasized: false,
            }];
            let shaped = shape_text(&font, &segments, 14.0, 0.05, 1.3, content_w);
            let style = TextStyle {
                font: &font,
                color: [0xE6, 0xE8, 0xEC],
                align: TextAlign::Center,
                italic: false,
                underline: false,
            };
            draw_text(&mut canvas, &shaped, &style, OVERLAY_PAD_X, y, content_w);
            y += shaped.height() + 12.0;
        }
    }

    let headline_rect = draw_headline(
        &mut canvas,
        data,
        fonts,
        OVERLAY_PAD_X,
        y,
        content_w,
        data.headline_settings.color,
    );

    RenderedCard {
        image: canvas.into_image(),
        headline_rect,
    }
}

// ============================================================================
// BOTTOM_TEXT_IMAGE
// ============================================================================
//
// Full-bleed background under a bottom-weighted gradient; headline near the
// bottom edge, with a divider and the logo below it only when one is set.

fn render_bottom(data: &VisualState, fonts: &FontLibrary) -> RenderedCard {
    let mut canvas = CardCanvas::new_filled(CARD_WIDTH, CARD_HEIGHT, SLATE_BASE);
    draw_overlay_background(&mut canvas, data);
    canvas.gradient_vertical(
        CARD_HEIGHT as f32 * 0.4,
        CARD_HEIGHT as f32,
        &[(0.0, 0.0), (1.0, 0.8)],
    );

    let content_w = CARD_WIDTH as f32 - 2.0 * OVERLAY_PAD_X;
    let headline_h = headline_height(data, fonts, content_w);

    // Stack measured bottom-up: padding, then (logo row + divider) when a
    // logo exists, then the headline.
    const LOGO_ROW: f32 = 32.0;
    let mut y = CARD_HEIGHT as f32 - 20.0;
    if data.logo_image.is_some() {
        y -= LOGO_ROW + 12.0 + 1.0 + 12.0;
    }
    y -= headline_h;

    let headline_rect = draw_headline(
        &mut canvas,
        data,
        fonts,
        OVERLAY_PAD_X,
        y,
        content_w,
        data.headline_settings.color,
    );

    if let Some(logo) = &data.logo_image {
        let mut line_y = y + headline_h + 12.0;
        canvas.fill_rect(OVERLAY_PAD_X, line_y, content_w, 1.0, Rgba([255, 255, 255, 77]));
        line_y += 1.0 + 12.0;
        let w = logo.pixels.width() as f32 * LOGO_HEIGHT / logo.pixels.height().max(1) as f32;
        let x = (CARD_WIDTH as f32 - w) * 0.5;
        draw_logo(&mut canvas, &logo.pixels, x, line_y + (LOGO_ROW - LOGO_HEIGHT) * 0.5, LOGO_HEIGHT);
    }

    RenderedCard {
        image: canvas.into_image(),
        headline_rect,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::{CardImage, Position};
    use pretty_assertions::assert_eq;

    fn render(template: TemplateStyle, data: &VisualState) -> RenderedCard {
        render_card(template, data, &FontLibrary::new())
    }

    #[test]
    fn every_template_renders_at_fixed_card_size() {
        let data = VisualState::default();
        for template in TemplateStyle::ALL {
            let card = render(template, &data);
            assert_eq!(card.image.width(), CARD_WIDTH);
            assert_eq!(card.image.height(), CARD_HEIGHT);
        }
    }

    #[test]
    fn rendering_is_deterministic_for_equal_state() {
        let mut data = VisualState::default();
        data.headline = "Ship *early*".to_string();
        data.set_image_scale(1.7);
        data.update_image_position(Position::new(-30.0, 14.0));
        data.update_text_position(Position::new(5.0, -9.0));

        let fonts = FontLibrary::new();
        let a = render_card(TemplateStyle::BoldTextOverlay, &data, &fonts);
        let b = render_card(TemplateStyle::BoldTextOverlay, &data.clone(), &fonts);
        assert_eq!(a.image.as_raw(), b.image.as_raw());
        assert_eq!(a.headline_rect, b.headline_rect);
    }

    #[test]
    fn minimal_without_background_shows_the_dot_grid() {
        let mut data = VisualState::default();
        data.apply_template(TemplateStyle::MinimalTypography);
        let card = render(TemplateStyle::MinimalTypography, &data);
        // Dot centers land on the half-spacing grid; (10, 10) carries a dot,
        // the card corner is untouched base color.
        let corner = card.image.get_pixel(0, 0);
        assert_eq!(corner.0[..3], MINIMAL_BASE);
        let dot = card.image.get_pixel(10, 10);
        assert!(dot[0] < corner[0], "expected a grid dot at (10, 10)");
    }

    #[test]
    fn minimal_with_color_has_no_dot_grid() {
        let mut data = VisualState::default();
        data.apply_template(TemplateStyle::MinimalTypography);
        data.set_background_color([0xE0, 0xF2, 0xFE]);
        let card = render(TemplateStyle::MinimalTypography, &data);
        assert_eq!(card.image.get_pixel(0, 0).0[..3], [0xE0, 0xF2, 0xFE]);
        assert_eq!(card.image.get_pixel(10, 10).0[..3], [0xE0, 0xF2, 0xFE]);
    }

    #[test]
    fn overlay_gradient_darkens_the_anchored_edge() {
        let mut data = VisualState::default();
        data.set_background_color([200, 200, 200]);

        let bold = render(TemplateStyle::BoldTextOverlay, &data);
        // Top edge darkened, bottom untouched (sample the left margin,
        // clear of any glyphs).
        assert!(bold.image.get_pixel(2, 2)[0] < 120);
        assert_eq!(bold.image.get_pixel(2, CARD_HEIGHT - 3).0[..3], [200, 200, 200]);

        let bottom = render(TemplateStyle::BottomTextImage, &data);
        assert!(bottom.image.get_pixel(2, CARD_HEIGHT - 3)[0] < 120);
        assert_eq!(bottom.image.get_pixel(2, 2).0[..3], [200, 200, 200]);
    }

    #[test]
    fn background_drag_offset_moves_pixels() {
        // A half-black half-white source photo makes the shift observable.
        let mut photo = image::RgbaImage::from_pixel(100, 125, image::Rgba([0, 0, 0, 255]));
        for y in 0..125 {
            for x in 50..100 {
                photo.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
        }
        let mut data = VisualState::default();
        data.headline.clear();
        data.sub_headline.clear();
        data.set_background_image(CardImage::from_pixels(photo));

        let centered = render(TemplateStyle::BottomTextImage, &data);
        data.update_image_position(Position::new(200.0, 0.0));
        let shifted = render(TemplateStyle::BottomTextImage, &data);
        assert_ne!(centered.image.as_raw(), shifted.image.as_raw());
        // The boundary column moved right by the offset.
        assert!(shifted.image.get_pixel(300, 10)[0] < 10);
        assert!(centered.image.get_pixel(300, 10)[0] > 245);
    }

    #[test]
    fn history_round_trip_renders_pixel_identically() {
        let mut data = VisualState::default();
        data.headline = "Don't *fear* shipping".to_string();
        data.sub_headline = "notes from the trenches".to_string();
        data.set_image_scale(2.0);
        data.update_image_position(Position::new(-12.0, 30.0));

        let json = serde_json::to_string(&data).expect("serialize");
        let restored: VisualState = serde_json::from_str(&json).expect("deserialize");

        let fonts = FontLibrary::new();
        let before = render_card(TemplateStyle::BoldTextOverlay, &data, &fonts);
        let after = render_card(TemplateStyle::BoldTextOverlay, &restored, &fonts);
        assert_eq!(before.image.as_raw(), after.image.as_raw());
    }
}

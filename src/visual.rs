// ============================================================================
// LAYOUT GEOMETRY MODEL — single source of truth for the 500×625 card
// ============================================================================
//
// Every coordinate stored here is in card space: the card is always
// 500×625 logical pixels no matter how the on-screen preview is zoomed.
// The model owns the cross-field invariants (background image and background
// color are mutually exclusive, image scale stays inside [1, 3]); everything
// else — drag resolution, rendering, export — lives in other modules and
// only reads or replaces fields through the operations below.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Logical card width in pixels. Fixed; zoom is a view-layer concern.
pub const CARD_WIDTH: u32 = 500;
/// Logical card height in pixels.
pub const CARD_HEIGHT: u32 = 625;

/// Background image zoom bounds (multiplier over cover-fit size).
pub const MIN_IMAGE_SCALE: f32 = 1.0;
pub const MAX_IMAGE_SCALE: f32 = 3.0;

/// Headline font size bounds in pixels (editor boundary clamp).
pub const MIN_FONT_SIZE: f32 = 10.0;
pub const MAX_FONT_SIZE: f32 = 200.0;

// ============================================================================
// Basic geometry
// ============================================================================

/// A pixel offset in card space. Unbounded: content may be dragged
/// off-canvas, that is creative freedom rather than an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Position {
    type Output = Position;
    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Position;
    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ============================================================================
// Embedded images
// ============================================================================

/// Decoded RGBA pixels embedded in the visual state (backgrounds, logos,
/// avatars). The original upload is resolved at the ingestion boundary, so
/// nothing here ever references an external file or URL — history snapshots
/// and exports are self-contained.
#[derive(Clone, Debug)]
pub struct CardImage {
    pub pixels: Arc<RgbaImage>,
    /// True for the built-in placeholder background that non-minimal
    /// templates restore when no user background is set. The minimal
    /// template treats a still-default background as "no photo".
    pub is_default: bool,
}

impl CardImage {
    pub fn from_pixels(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            is_default: false,
        }
    }

    /// The built-in placeholder background: a 500×625 slate gradient.
    /// Generated procedurally so the binary ships no image assets.
    pub fn default_background() -> Self {
        let mut img = RgbaImage::new(CARD_WIDTH, CARD_HEIGHT);
        for y in 0..CARD_HEIGHT {
            let t = y as f32 / (CARD_HEIGHT - 1) as f32;
            for x in 0..CARD_WIDTH {
                let s = x as f32 / (CARD_WIDTH - 1) as f32;
                // Slate-600 fading to slate-900, with a faint diagonal lift.
                let lift = (1.0 - t) * 0.12 + (1.0 - s) * 0.05;
                let r = lerp_u8(30, 71, 1.0 - t) as f32 * (1.0 + lift);
                let g = lerp_u8(41, 85, 1.0 - t) as f32 * (1.0 + lift);
                let b = lerp_u8(59, 105, 1.0 - t) as f32 * (1.0 + lift);
                img.put_pixel(
                    x,
                    y,
                    Rgba([r.min(255.0) as u8, g.min(255.0) as u8, b.min(255.0) as u8, 255]),
                );
            }
        }
        Self {
            pixels: Arc::new(img),
            is_default: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

impl PartialEq for CardImage {
    fn eq(&self, other: &Self) -> bool {
        self.is_default == other.is_default
            && (Arc::ptr_eq(&self.pixels, &other.pixels)
                || self.pixels.as_raw() == other.pixels.as_raw())
    }
}

/// Wire form: pixels as base64 PNG so history snapshots stay portable
/// (the original stored data URIs for the same reason).
#[derive(Serialize, Deserialize)]
struct CardImageRepr {
    png: String,
    is_default: bool,
}

impl Serialize for CardImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use base64::Engine as _;
        let bytes = crate::io::encode_png(&self.pixels)
            .map_err(|e| serde::ser::Error::custom(format!("png encode: {}", e)))?;
        CardImageRepr {
            png: base64::engine::general_purpose::STANDARD.encode(bytes),
            is_default: self.is_default,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CardImage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use base64::Engine as _;
        let repr = CardImageRepr::deserialize(deserializer)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(repr.png.as_bytes())
            .map_err(serde::de::Error::custom)?;
        let img = image::load_from_memory(&bytes)
            .map_err(serde::de::Error::custom)?
            .into_rgba8();
        Ok(Self {
            pixels: Arc::new(img),
            is_default: repr.is_default,
        })
    }
}

// ============================================================================
// Typography
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Headline text styling. `position` is the block's pixel offset from its
/// template-anchored location and is set solely via dragging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypographySettings {
    /// Font size in card pixels.
    pub font_size: f32,
    /// Unitless line-height multiplier.
    pub line_height: f32,
    /// Letter spacing in em (multiplied by font size per glyph).
    pub letter_spacing: f32,
    pub text_align: TextAlign,
    /// System font family name; empty string means the built-in default.
    pub font_family: String,
    pub is_italic: bool,
    pub is_underline: bool,
    /// Headline color as sRGB.
    pub color: [u8; 3],
    pub position: Position,
    /// CSS-style weight (400 regular … 700 bold).
    pub font_weight: u16,
}

impl Default for TypographySettings {
    fn default() -> Self {
        Self {
            font_size: 56.0,
            line_height: 1.0,
            letter_spacing: -0.05,
            text_align: TextAlign::Center,
            font_family: String::new(),
            is_italic: false,
            is_underline: false,
            color: [0xFF, 0xFF, 0xFF],
            position: Position::ZERO,
            font_weight: 600,
        }
    }
}

impl TypographySettings {
    /// Out-of-range sizes are clamped, never rejected.
    pub fn set_font_size(&mut self, size: f32) {
        if size.is_finite() {
            self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// The three mutually exclusive card layout policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStyle {
    MinimalTypography,
    BoldTextOverlay,
    BottomTextImage,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 3] = [
        TemplateStyle::MinimalTypography,
        TemplateStyle::BottomTextImage,
        TemplateStyle::BoldTextOverlay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TemplateStyle::MinimalTypography => "Minimal",
            TemplateStyle::BoldTextOverlay => "Bold overlay",
            TemplateStyle::BottomTextImage => "Bottom text",
        }
    }
}

// ============================================================================
// Visual state
// ============================================================================

/// The central entity of an editor session: everything needed to composite
/// one card. Created with defaults at app start, mutated by user edits and
/// generation results, snapshotted into history items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub headline: String,
    pub sub_headline: String,
    pub author_name: String,
    pub author_handle: String,
    /// Mutually exclusive with `background_color`.
    pub background_image: Option<CardImage>,
    /// Mutually exclusive with `background_image`.
    pub background_color: Option<[u8; 3]>,
    pub author_image: Option<CardImage>,
    pub logo_image: Option<CardImage>,
    /// Background zoom multiplier, always within [1, 3].
    pub image_scale: f32,
    /// Background offset relative to the cover-fit centered placement.
    pub image_position: Position,
    pub headline_settings: TypographySettings,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            headline: "Don't be scared of LinkedIn".to_string(),
            sub_headline: String::new(),
            author_name: "Your name".to_string(),
            author_handle: "Role".to_string(),
            background_image: Some(CardImage::default_background()),
            background_color: None,
            author_image: None,
            logo_image: None,
            image_scale: 1.0,
            image_position: Position::ZERO,
            headline_settings: TypographySettings::default(),
        }
    }
}

impl VisualState {
    /// Set a photographic background; clears any solid color.
    pub fn set_background_image(&mut self, img: CardImage) {
        self.background_image = Some(img);
        self.background_color = None;
    }

    /// Set a solid background color; clears any image.
    pub fn set_background_color(&mut self, rgb: [u8; 3]) {
        self.background_color = Some(rgb);
        self.background_image = None;
    }

    /// Clear both background modes (minimal template falls back to the
    /// dot-grid pattern).
    pub fn clear_background(&mut self) {
        self.background_image = None;
        self.background_color = None;
    }

    /// Clamp-and-store; out-of-range input is never an error.
    pub fn set_image_scale(&mut self, factor: f32) {
        if factor.is_finite() {
            self.image_scale = factor.clamp(MIN_IMAGE_SCALE, MAX_IMAGE_SCALE);
        }
    }

    /// Absolute replacement — the drag controller already resolved the
    /// target position, so this never accumulates deltas.
    pub fn update_image_position(&mut self, pos: Position) {
        self.image_position = pos;
    }

    /// Absolute replacement of the headline block offset.
    pub fn update_text_position(&mut self, pos: Position) {
        self.headline_settings.position = pos;
    }

    /// The background photo, ignoring the built-in placeholder. The minimal
    /// template only shows a photo the user explicitly chose.
    pub fn user_background_image(&self) -> Option<&CardImage> {
        self.background_image.as_ref().filter(|img| !img.is_default)
    }

    /// Template-selection policy:
    /// - Minimal: left-aligned headline, both background fields cleared
    ///   (the dot grid takes over until the user re-enables image/color).
    /// - Bold / Bottom: center-aligned headline; a non-minimal template is
    ///   never left with a fully empty background, so the placeholder is
    ///   restored when neither field is set.
    pub fn apply_template(&mut self, template: TemplateStyle) {
        match template {
            TemplateStyle::MinimalTypography => {
                self.headline_settings.text_align = TextAlign::Left;
                self.clear_background();
            }
            TemplateStyle::BoldTextOverlay | TemplateStyle::BottomTextImage => {
                self.headline_settings.text_align = TextAlign::Center;
                if self.background_image.is_none() && self.background_color.is_none() {
                    self.background_image = Some(CardImage::default_background());
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn image_scale_clamps_to_bounds() {
        let mut state = VisualState::default();
        state.set_image_scale(0.2);
        assert_eq!(state.image_scale, 1.0);
        state.set_image_scale(7.5);
        assert_eq!(state.image_scale, 3.0);
        state.set_image_scale(1.5);
        assert_eq!(state.image_scale, 1.5);
        state.set_image_scale(f32::NAN);
        assert_eq!(state.image_scale, 1.5);
    }

    #[test]
    fn background_modes_are_mutually_exclusive() {
        let mut state = VisualState::default();
        state.set_background_color([255, 255, 255]);
        assert!(state.background_image.is_none());
        assert_eq!(state.background_color, Some([255, 255, 255]));

        state.set_background_image(CardImage::from_pixels(RgbaImage::new(4, 4)));
        assert!(state.background_color.is_none());
        assert!(state.background_image.is_some());
    }

    #[test]
    fn minimal_template_clears_background_from_any_state() {
        let mut with_image = VisualState::default();
        with_image.set_background_image(CardImage::from_pixels(RgbaImage::new(4, 4)));
        with_image.apply_template(TemplateStyle::MinimalTypography);
        assert!(with_image.background_image.is_none());
        assert!(with_image.background_color.is_none());
        assert_eq!(with_image.headline_settings.text_align, TextAlign::Left);

        let mut with_color = VisualState::default();
        with_color.set_background_color([240, 240, 240]);
        with_color.apply_template(TemplateStyle::MinimalTypography);
        assert!(with_color.background_image.is_none());
        assert!(with_color.background_color.is_none());
    }

    #[test]
    fn bold_template_restores_default_background_when_empty() {
        let mut state = VisualState::default();
        state.clear_background();
        state.apply_template(TemplateStyle::BoldTextOverlay);
        let bg = state.background_image.expect("default background restored");
        assert!(bg.is_default);
        assert_eq!(state.headline_settings.text_align, TextAlign::Center);
    }

    #[test]
    fn bold_template_preserves_existing_background() {
        let mut state = VisualState::default();
        let user_img = CardImage::from_pixels(RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 255])));
        state.set_background_image(user_img.clone());
        state.apply_template(TemplateStyle::BoldTextOverlay);
        assert_eq!(state.background_image, Some(user_img));

        let mut colored = VisualState::default();
        colored.set_background_color([1, 2, 3]);
        colored.apply_template(TemplateStyle::BottomTextImage);
        assert_eq!(colored.background_color, Some([1, 2, 3]));
        assert!(colored.background_image.is_none());
    }

    #[test]
    fn default_placeholder_is_not_a_user_photo() {
        let state = VisualState::default();
        assert!(state.background_image.is_some());
        assert!(state.user_background_image().is_none());

        let mut with_photo = VisualState::default();
        with_photo.set_background_image(CardImage::from_pixels(RgbaImage::new(4, 4)));
        assert!(with_photo.user_background_image().is_some());
    }

    #[test]
    fn visual_state_survives_json_round_trip() {
        let mut state = VisualState::default();
        state.headline = "Ship *early*, learn fast".to_string();
        state.sub_headline = "Notes from week one".to_string();
        state.set_image_scale(2.25);
        state.update_image_position(Position::new(-40.0, 12.5));
        state.update_text_position(Position::new(3.0, -8.0));
        state.logo_image = Some(CardImage::from_pixels(RgbaImage::from_pixel(
            6,
            3,
            Rgba([10, 20, 30, 255]),
        )));

        let json = serde_json::to_string(&state).expect("serialize");
        let restored: VisualState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(state, restored);
    }

    #[test]
    fn font_size_clamps_at_editor_boundary() {
        let mut settings = TypographySettings::default();
        settings.set_font_size(5.0);
        assert_eq!(settings.font_size, MIN_FONT_SIZE);
        settings.set_font_size(999.0);
        assert_eq!(settings.font_size, MAX_FONT_SIZE);
    }
}

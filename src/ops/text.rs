// ============================================================================
// TEXT — emphasis markup, shaping with word wrap, glyph rasterization
// ============================================================================

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::Rgba;

use crate::canvas::CardCanvas;
use crate::visual::TextAlign;

// ============================================================================
// Rich-text emphasis markup
// ============================================================================

/// One run of headline text. Emphasized runs render with an underline
/// decoration (the `*…*` delimiter convention).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichSegment {
    pub text: String,
    pub emphasized: bool,
}

/// Split a headline on the `*` delimiter: odd split-indices are emphasized.
/// An unpaired trailing `*` degrades gracefully — the trailing segment still
/// renders, unflagged, since its opening delimiter was never closed.
pub fn parse_emphasis(text: &str) -> Vec<RichSegment> {
    if text.is_empty() {
        return Vec::new();
    }
    let parts: Vec<&str> = text.split('*').collect();
    // An even part count means an odd number of delimiters.
    let unterminated = parts.len() % 2 == 0;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| RichSegment {
            text: (*part).to_string(),
            emphasized: i % 2 == 1 && !(unterminated && i == parts.len() - 1),
        })
        .collect()
}

// ============================================================================
// Shaping
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct ShapedGlyph {
    pub id: GlyphId,
    /// X offset from the line start (alignment applied at draw time).
    pub x: f32,
    pub advance: f32,
    pub emphasized: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ShapedLine {
    pub glyphs: Vec<ShapedGlyph>,
    pub width: f32,
}

/// Lines of positioned glyphs for one text block, wrapped to a maximum
/// width. Positions are relative to the block's top-left corner.
#[derive(Clone, Debug)]
pub struct ShapedText {
    pub lines: Vec<ShapedLine>,
    pub font_size: f32,
    /// Baseline-to-baseline distance (`font_size * line_height`).
    pub line_advance: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl ShapedText {
    /// Block height from the first line's top to the last line's bottom.
    pub fn height(&self) -> f32 {
        if self.lines.is_empty() {
            return 0.0;
        }
        (self.lines.len() - 1) as f32 * self.line_advance + self.ascent - self.descent
    }

    pub fn max_line_width(&self) -> f32 {
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }
}

/// Greedy word-wrap shaping of styled runs. `letter_spacing_em` is added to
/// every glyph advance as a fraction of the font size; explicit `\n`
/// characters force breaks; a word longer than `max_width` is placed on its
/// own line rather than split.
pub fn shape_text(
    font: &FontArc,
    segments: &[RichSegment],
    font_size: f32,
    letter_spacing_em: f32,
    line_height: f32,
    max_width: f32,
) -> ShapedText {
    let scaled = font.as_scaled(font_size);
    let tracking = letter_spacing_em * font_size;

    let mut shaped = ShapedText {
        lines: Vec::new(),
        font_size,
        line_advance: font_size * line_height,
        ascent: scaled.ascent(),
        descent: scaled.descent(),
    };

    let mut line = ShapedLine::default();
    let mut cursor = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    // Current word buffer: glyphs not yet committed to the line.
    let mut word: Vec<ShapedGlyph> = Vec::new();
    let mut word_width = 0.0f32;

    let mut flush_word =
        |line: &mut ShapedLine,
         cursor: &mut f32,
         word: &mut Vec<ShapedGlyph>,
         word_width: &mut f32,
         lines: &mut Vec<ShapedLine>| {
            if word.is_empty() {
                return;
            }
            let fits = line.glyphs.is_empty() || *cursor + *word_width <= max_width;
            if !fits {
                // Trailing whitespace does not count toward the line width.
                lines.push(std::mem::take(line));
                *cursor = 0.0;
            }
            for g in word.iter() {
                line.glyphs.push(ShapedGlyph {
                    x: *cursor + g.x,
                    ..*g
                });
            }
            *cursor += *word_width;
            line.width = *cursor;
            word.clear();
            *word_width = 0.0;
        };

    for segment in segments {
        for ch in segment.text.chars() {
            if ch == '\n' {
                flush_word(
                    &mut line,
                    &mut cursor,
                    &mut word,
                    &mut word_width,
                    &mut shaped.lines,
                );
                shaped.lines.push(std::mem::take(&mut line));
                cursor = 0.0;
                last_glyph = None;
                continue;
            }

            let id = font.glyph_id(ch);
            let mut advance = scaled.h_advance(id) + tracking;
            if let Some(prev) = last_glyph {
                advance += scaled.kern(prev, id);
            }
            last_glyph = Some(id);

            if ch.is_whitespace() {
                flush_word(
                    &mut line,
                    &mut cursor,
                    &mut word,
                    &mut word_width,
                    &mut shaped.lines,
                );
                // Spaces are committed immediately; a wrap drops them.
                if !line.glyphs.is_empty() {
                    cursor += advance;
                }
                continue;
            }

            word.push(ShapedGlyph {
                id,
                x: word_width,
                advance,
                emphasized: segment.emphasized,
            });
            word_width += advance;
        }
    }
    flush_word(
        &mut line,
        &mut cursor,
        &mut word,
        &mut word_width,
        &mut shaped.lines,
    );
    if !line.glyphs.is_empty() {
        shaped.lines.push(line);
    }

    shaped
}

/// Shape text with no emphasis markup (author rows, sub-headlines).
pub fn shape_plain(
    font: &FontArc,
    text: &str,
    font_size: f32,
    line_height: f32,
    max_width: f32,
) -> ShapedText {
    let segments = [RichSegment {
        text: text.to_string(),
        emphasized: false,
    }];
    shape_text(font, &segments, font_size, 0.0, line_height, max_width)
}

// ============================================================================
// Rasterization
// ============================================================================

pub struct TextStyle<'a> {
    pub font: &'a FontArc,
    pub color: [u8; 3],
    pub align: TextAlign,
    pub italic: bool,
    /// Underline the whole block (the emphasis runs underline regardless).
    pub underline: bool,
}

/// Blend a shaped block onto the canvas. `block_x`/`block_y` is the block's
/// top-left corner; alignment offsets each line within `block_w`.
pub fn draw_text(
    canvas: &mut CardCanvas,
    shaped: &ShapedText,
    style: &TextStyle,
    block_x: f32,
    block_y: f32,
    block_w: f32,
) {
    let size = shaped.font_size;
    let rgb = style.color;

    for (i, line) in shaped.lines.iter().enumerate() {
        let align_off = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (block_w - line.width) * 0.5,
            TextAlign::Right => block_w - line.width,
        };
        let line_x = block_x + align_off;
        let baseline = block_y + shaped.ascent + i as f32 * shaped.line_advance;

        for g in &line.glyphs {
            let glyph = g.id.with_scale_and_position(size, point(line_x + g.x, baseline));
            if let Some(outlined) = style.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let italic = style.italic;
                // Collect first: `draw` borrows the outline immutably while
                // we need the canvas mutably.
                let mut coverage: Vec<(f32, f32, f32)> = Vec::new();
                outlined.draw(|px, py, cov| {
                    if cov > 0.003 {
                        let mut cx = bounds.min.x + px as f32;
                        let cy = bounds.min.y + py as f32;
                        if italic {
                            cx += (baseline - cy) * 0.2;
                        }
                        coverage.push((cx, cy, cov));
                    }
                });
                for (cx, cy, cov) in coverage {
                    let a = (cov * 255.0).round().min(255.0) as u8;
                    canvas.blend_pixel(
                        cx.round() as i32,
                        cy.round() as i32,
                        Rgba([rgb[0], rgb[1], rgb[2], a]),
                    );
                }
            }
        }

        // Decorations sit slightly below the baseline: 0.1em drop,
        // 0.06em thickness.
        let deco_y = baseline + size * 0.1;
        let thickness = (size * 0.06).max(1.0);
        if style.underline && line.width > 0.0 {
            canvas.fill_rect(
                line_x,
                deco_y,
                line.width,
                thickness,
                Rgba([rgb[0], rgb[1], rgb[2], 255]),
            );
        } else {
            for (x0, x1) in emphasis_runs(line) {
                canvas.fill_rect(
                    line_x + x0,
                    deco_y,
                    x1 - x0,
                    thickness,
                    Rgba([rgb[0], rgb[1], rgb[2], 255]),
                );
            }
        }
    }
}

/// Contiguous emphasized glyph spans of one line as (start_x, end_x) pairs.
fn emphasis_runs(line: &ShapedLine) -> Vec<(f32, f32)> {
    let mut runs = Vec::new();
    let mut current: Option<(f32, f32)> = None;
    for g in &line.glyphs {
        if g.emphasized {
            let end = g.x + g.advance;
            current = match current {
                Some((start, _)) => Some((start, end)),
                None => Some((g.x, end)),
            };
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(text: &str, emphasized: bool) -> RichSegment {
        RichSegment {
            text: text.to_string(),
            emphasized,
        }
    }

    #[test]
    fn emphasis_split_alternates_segments() {
        let segments = parse_emphasis("Don't *fear* shipping");
        assert_eq!(
            segments,
            vec![
                seg("Don't ", false),
                seg("fear", true),
                seg(" shipping", false),
            ]
        );
    }

    #[test]
    fn unpaired_delimiter_renders_trailing_text_unflagged() {
        let segments = parse_emphasis("brand *new world");
        assert_eq!(segments, vec![seg("brand ", false), seg("new world", false)]);

        // Three delimiters: the first pair closes, the dangling one doesn't.
        let segments = parse_emphasis("a *b* c *d");
        assert_eq!(
            segments,
            vec![seg("a ", false), seg("b", true), seg(" c ", false), seg("d", false)]
        );
    }

    #[test]
    fn plain_text_is_a_single_unflagged_segment() {
        let segments = parse_emphasis("no markup here");
        assert_eq!(segments, vec![seg("no markup here", false)]);
        assert!(parse_emphasis("").is_empty());
    }

    // Shaping tests need a real font; skip quietly on systems without one.
    fn test_font() -> Option<FontArc> {
        crate::assets::FontLibrary::new().default_font()
    }

    #[test]
    fn wrapping_respects_max_width() {
        let Some(font) = test_font() else { return };
        let narrow = shape_plain(&font, "one two three four five", 20.0, 1.0, 90.0);
        let wide = shape_plain(&font, "one two three four five", 20.0, 1.0, 10_000.0);
        assert_eq!(wide.lines.len(), 1);
        assert!(narrow.lines.len() > 1, "expected a wrap at 90px");
        for line in &narrow.lines {
            assert!(line.width <= 90.0 + f32::EPSILON, "line width {}", line.width);
        }
    }

    #[test]
    fn explicit_newline_forces_a_break() {
        let Some(font) = test_font() else { return };
        let shaped = shape_plain(&font, "top\nbottom", 20.0, 1.2, 10_000.0);
        assert_eq!(shaped.lines.len(), 2);
        assert_eq!(shaped.line_advance, 24.0);
    }

    #[test]
    fn letter_spacing_widens_lines() {
        let Some(font) = test_font() else { return };
        let segments = parse_emphasis("spacing");
        let tight = shape_text(&font, &segments, 20.0, -0.05, 1.0, 10_000.0);
        let loose = shape_text(&font, &segments, 20.0, 0.1, 1.0, 10_000.0);
        assert!(loose.max_line_width() > tight.max_line_width());
    }

    #[test]
    fn emphasized_glyphs_form_contiguous_runs() {
        let Some(font) = test_font() else { return };
        let segments = parse_emphasis("aa *bb* cc");
        let shaped = shape_text(&font, &segments, 20.0, 0.0, 1.0, 10_000.0);
        assert_eq!(shaped.lines.len(), 1);
        let runs = emphasis_runs(&shaped.lines[0]);
        assert_eq!(runs.len(), 1);
        let (x0, x1) = runs[0];
        assert!(x0 > 0.0 && x1 > x0);
        assert!(x1 < shaped.lines[0].width);
    }
}

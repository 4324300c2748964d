// ============================================================================
// CARD CANVAS — CPU compositor for one 500×625 card
// ============================================================================
//
// All drawing is plain src-over blending into an `RgbaImage`. The same
// canvas backs both the on-screen preview texture and the exported PNG, so
// what the editor shows is by construction what the file contains.
//
// Coordinates are card-space f32; every primitive clamps to the canvas
// bounds itself, callers never pre-clip.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::visual::Position;

pub struct CardCanvas {
    img: RgbaImage,
}

impl CardCanvas {
    /// A canvas pre-filled with an opaque color.
    pub fn new_filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            img: RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255])),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    /// Src-over blend of a single pixel. Out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
            return;
        }
        let dst = self.img.get_pixel_mut(x as u32, y as u32);
        *dst = blend(*dst, color);
    }

    /// Axis-aligned filled rectangle, blended.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let x0 = x.floor().max(0.0) as i32;
        let y0 = y.floor().max(0.0) as i32;
        let x1 = ((x + w).ceil() as i32).min(self.img.width() as i32);
        let y1 = ((y + h).ceil() as i32).min(self.img.height() as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Blend a uniform tint over the entire canvas (legibility overlays).
    pub fn tint(&mut self, color: Rgba<u8>) {
        for dst in self.img.pixels_mut() {
            *dst = blend(*dst, color);
        }
    }

    /// The procedural fallback background of the minimal template: round
    /// dots on a regular grid, offset half a cell so the pattern never
    /// starts flush with the card edge.
    pub fn draw_dot_grid(&mut self, spacing: u32, radius: f32, color: Rgba<u8>) {
        let (w, h) = (self.img.width(), self.img.height());
        let half = (spacing / 2) as i32;
        let mut cy = half;
        while cy < h as i32 {
            let mut cx = half;
            while cx < w as i32 {
                self.fill_circle(cx as f32, cy as f32, radius, color);
                cx += spacing as i32;
            }
            cy += spacing as i32;
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
        let x0 = (cx - radius).floor() as i32;
        let x1 = (cx + radius).ceil() as i32;
        let y0 = (cy - radius).floor() as i32;
        let y1 = (cy + radius).ceil() as i32;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                // 1px anti-aliased rim.
                let cov = (radius - d + 0.5).clamp(0.0, 1.0);
                if cov > 0.0 {
                    let mut c = color;
                    c[3] = (c[3] as f32 * cov) as u8;
                    self.blend_pixel(px, py, c);
                }
            }
        }
    }

    /// Full-bleed background: scale the source to cover the whole canvas
    /// (preserving aspect), multiply by the user zoom, center, then apply
    /// the drag offset. Bilinear sampled, parallel per row.
    pub fn draw_image_cover(&mut self, src: &RgbaImage, scale: f32, offset: Position) {
        let (cw, ch) = (self.img.width() as f32, self.img.height() as f32);
        let (sw, sh) = (src.width() as f32, src.height() as f32);
        if sw < 1.0 || sh < 1.0 {
            return;
        }
        let cover = (cw / sw).max(ch / sh);
        let s = cover * scale.max(0.01);
        let left = (cw - sw * s) * 0.5 + offset.x;
        let top = (ch - sh * s) * 0.5 + offset.y;

        let width = self.img.width() as usize;
        let buf: &mut [u8] = &mut self.img;
        buf.par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let fy = (y as f32 + 0.5 - top) / s - 0.5;
                for x in 0..width {
                    let fx = (x as f32 + 0.5 - left) / s - 0.5;
                    if let Some(c) = sample_bilinear(src, fx, fy) {
                        let i = x * 4;
                        let dst = Rgba([row[i], row[i + 1], row[i + 2], row[i + 3]]);
                        let out = blend(dst, c);
                        row[i..i + 4].copy_from_slice(&out.0);
                    }
                }
            });
    }

    /// Draw the source scaled into a destination rectangle (logos, stretched
    /// fits). Aspect handling is the caller's business.
    pub fn draw_image_scaled(&mut self, src: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
        if w < 1.0 || h < 1.0 || src.width() == 0 || src.height() == 0 {
            return;
        }
        let sx = src.width() as f32 / w;
        let sy = src.height() as f32 / h;
        let x0 = x.floor().max(0.0) as i32;
        let y0 = y.floor().max(0.0) as i32;
        let x1 = ((x + w).ceil() as i32).min(self.img.width() as i32);
        let y1 = ((y + h).ceil() as i32).min(self.img.height() as i32);
        for py in y0..y1 {
            let fy = (py as f32 + 0.5 - y) * sy - 0.5;
            for px in x0..x1 {
                let fx = (px as f32 + 0.5 - x) * sx - 0.5;
                if let Some(c) = sample_bilinear(src, fx, fy) {
                    self.blend_pixel(px, py, c);
                }
            }
        }
    }

    /// Cover-fit the source into a circle (author avatars).
    pub fn draw_image_circle(&mut self, src: &RgbaImage, cx: f32, cy: f32, radius: f32) {
        if src.width() == 0 || src.height() == 0 || radius < 1.0 {
            return;
        }
        let (sw, sh) = (src.width() as f32, src.height() as f32);
        let d = radius * 2.0;
        let s = (d / sw).max(d / sh);
        let left = cx - sw * s * 0.5;
        let top = cy - sh * s * 0.5;

        let x0 = (cx - radius).floor() as i32;
        let x1 = (cx + radius).ceil() as i32;
        let y0 = (cy - radius).floor() as i32;
        let y1 = (cy + radius).ceil() as i32;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let cov = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
                if cov <= 0.0 {
                    continue;
                }
                let fx = (px as f32 + 0.5 - left) / s - 0.5;
                let fy = (py as f32 + 0.5 - top) / s - 0.5;
                if let Some(mut c) = sample_bilinear(src, fx, fy) {
                    c[3] = (c[3] as f32 * cov) as u8;
                    self.blend_pixel(px, py, c);
                }
            }
        }
    }

    /// Vertical black gradient between `y0` and `y1`. `stops` map a
    /// fraction of that span to an opacity; opacity is interpolated
    /// linearly between consecutive stops.
    pub fn gradient_vertical(&mut self, y0: f32, y1: f32, stops: &[(f32, f32)]) {
        if stops.len() < 2 || y1 <= y0 {
            return;
        }
        let iy0 = y0.floor().max(0.0) as i32;
        let iy1 = (y1.ceil() as i32).min(self.img.height() as i32);
        let span = y1 - y0;
        for py in iy0..iy1 {
            let t = ((py as f32 + 0.5 - y0) / span).clamp(0.0, 1.0);
            let alpha = sample_stops(stops, t);
            if alpha <= 0.0 {
                continue;
            }
            let a = (alpha * 255.0).round().clamp(0.0, 255.0) as u8;
            for px in 0..self.img.width() as i32 {
                self.blend_pixel(px, py, Rgba([0, 0, 0, a]));
            }
        }
    }

    /// Separable box blur, two passes. Small radii only (the minimal
    /// template uses radius 2 under its white wash).
    pub fn box_blur(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        let w = self.img.width() as i32;
        let h = self.img.height() as i32;
        let r = radius as i32;

        // Horizontal pass, parallel per row.
        let src = self.img.clone();
        let width = w as usize;
        let buf: &mut [u8] = &mut self.img;
        buf.par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    let mut acc = [0u32; 4];
                    let mut n = 0u32;
                    for k in -r..=r {
                        let sx = x + k;
                        if sx >= 0 && sx < w {
                            let p = src.get_pixel(sx as u32, y as u32);
                            for c in 0..4 {
                                acc[c] += p[c] as u32;
                            }
                            n += 1;
                        }
                    }
                    let i = x as usize * 4;
                    for c in 0..4 {
                        row[i + c] = (acc[c] / n) as u8;
                    }
                }
            });

        // Vertical pass.
        let src = self.img.clone();
        for x in 0..w {
            for y in 0..h {
                let mut acc = [0u32; 4];
                let mut n = 0u32;
                for k in -r..=r {
                    let sy = y + k;
                    if sy >= 0 && sy < h {
                        let p = src.get_pixel(x as u32, sy as u32);
                        for c in 0..4 {
                            acc[c] += p[c] as u32;
                        }
                        n += 1;
                    }
                }
                let out = self.img.get_pixel_mut(x as u32, y as u32);
                for c in 0..4 {
                    out[c] = (acc[c] / n) as u8;
                }
            }
        }
    }
}

/// Integer src-over blend of non-premultiplied RGBA.
fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src[c] as u32;
        let d = dst[c] as u32;
        out[c] = ((s * sa + d * da * (255 - sa) / 255) / out_a) as u8;
    }
    out[3] = out_a as u8;
    Rgba(out)
}

/// Bilinear sample at fractional source coordinates. Returns `None` when
/// the footprint lies entirely outside the source.
fn sample_bilinear(src: &RgbaImage, fx: f32, fy: f32) -> Option<Rgba<u8>> {
    let (w, h) = (src.width() as i32, src.height() as i32);
    if fx < -1.0 || fy < -1.0 || fx > w as f32 || fy > h as f32 {
        return None;
    }
    let x0 = fx.floor() as i32;
    let y0 = fy.floor() as i32;
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let fetch = |x: i32, y: i32| -> [f32; 4] {
        let cx = x.clamp(0, w - 1);
        let cy = y.clamp(0, h - 1);
        let p = src.get_pixel(cx as u32, cy as u32);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * tx;
        let bot = p01[c] + (p11[c] - p01[c]) * tx;
        out[c] = (top + (bot - top) * ty).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}

fn sample_stops(stops: &[(f32, f32)], t: f32) -> f32 {
    if t <= stops[0].0 {
        return stops[0].1;
    }
    for pair in stops.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            if t1 <= t0 {
                return a1;
            }
            let f = (t - t0) / (t1 - t0);
            return a0 + (a1 - a0) * f;
        }
    }
    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cover_fit_leaves_no_gaps_at_unit_scale() {
        let mut canvas = CardCanvas::new_filled(50, 62, [1, 2, 3]);
        let src = RgbaImage::from_pixel(10, 40, Rgba([200, 100, 50, 255]));
        canvas.draw_image_cover(&src, 1.0, Position::ZERO);
        let img = canvas.into_image();
        for p in img.pixels() {
            assert_eq!(p.0, [200, 100, 50, 255]);
        }
    }

    #[test]
    fn gradient_opacity_fades_between_stops() {
        let mut canvas = CardCanvas::new_filled(4, 100, [255, 255, 255]);
        canvas.gradient_vertical(0.0, 100.0, &[(0.0, 0.8), (1.0, 0.0)]);
        let img = canvas.into_image();
        let top = img.get_pixel(0, 0)[0];
        let mid = img.get_pixel(0, 50)[0];
        let bottom = img.get_pixel(0, 99)[0];
        // Darkest at the top, untouched at the bottom.
        assert!(top < mid, "top {} should be darker than mid {}", top, mid);
        assert!(mid < bottom, "mid {} should be darker than bottom {}", mid, bottom);
        assert_eq!(bottom, 255);
    }

    #[test]
    fn blend_is_identity_for_transparent_and_opaque() {
        let d = Rgba([10, 20, 30, 255]);
        assert_eq!(blend(d, Rgba([0, 0, 0, 0])), d);
        assert_eq!(blend(d, Rgba([9, 9, 9, 255])), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn dot_grid_marks_cell_centers_only() {
        let mut canvas = CardCanvas::new_filled(40, 40, [255, 255, 255]);
        canvas.draw_dot_grid(20, 1.0, Rgba([0, 0, 0, 255]));
        let img = canvas.into_image();
        // Dot centered at (10, 10); corner stays white.
        assert!(img.get_pixel(10, 10)[0] < 128);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}

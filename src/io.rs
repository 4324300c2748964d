// ============================================================================
// FILE I/O — image ingestion, PNG export, dialogs, data directory
// ============================================================================

use image::codecs::png::PngEncoder;
use image::{ImageError, RgbaImage};
use rfd::FileDialog;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::visual::CardImage;

/// Ingestion cap: uploads above this are downscaled before they enter the
/// layout model. The card composites at 500×625, so anything beyond 16 MP
/// is wasted memory in history snapshots.
pub const MAX_SOURCE_PIXELS: u32 = 16_000_000;

/// Raster formats accepted for background / logo / avatar uploads.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Encode an RGBA image to an in-memory PNG.
/// Standalone (no `&mut self`) so history snapshots and background export
/// threads can call it freely.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(out)
}

/// Load an upload from disk, decoding to RGBA and downscaling oversized
/// sources. Errors are user-facing strings.
pub fn load_image_file(path: &Path) -> Result<CardImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open image: {}", e))?
        .to_rgba8();
    Ok(CardImage::from_pixels(bounded(img, MAX_SOURCE_PIXELS)))
}

/// Downscale an image so its pixel count stays at or below `max_pixels`,
/// preserving aspect ratio. Images already within bounds pass through
/// untouched.
pub fn bounded(img: RgbaImage, max_pixels: u32) -> RgbaImage {
    let pixels = img.width() as u64 * img.height() as u64;
    if pixels <= max_pixels as u64 {
        return img;
    }
    let factor = (max_pixels as f64 / pixels as f64).sqrt();
    let w = ((img.width() as f64 * factor) as u32).max(1);
    let h = ((img.height() as f64 * factor) as u32).max(1);
    image::imageops::resize(&img, w, h, image::imageops::FilterType::Lanczos3)
}

/// Default export file name, unique per invocation.
pub fn export_filename() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("lingens-{}.png", millis)
}

/// Write a composited card to disk as PNG. Encodes to memory first so a
/// failed encode never leaves a truncated file behind.
pub fn write_card_png(image: &RgbaImage, path: &Path) -> Result<(), String> {
    let bytes = encode_png(image).map_err(|e| format!("PNG encode error: {}", e))?;
    std::fs::write(path, bytes).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Native open dialog for image uploads.
pub fn pick_image_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Native save dialog for card export, pre-filled with a timestamped name.
pub fn pick_export_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("PNG Image", &["png"])
        .set_file_name(export_filename())
        .save_file()
}

/// Per-user application data directory.
///
/// `%APPDATA%\Lingens\`       (Windows)
/// `~/.local/share/Lingens/`  (Linux)
/// `~/Library/Application Support/Lingens/`  (macOS)
pub fn app_data_dir() -> PathBuf {
    data_dir().join("Lingens")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    // Linux / fallback
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort: current working directory
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn png_round_trip_preserves_pixels() {
        let mut img = RgbaImage::new(7, 5);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = image::Rgba([x as u8 * 30, y as u8 * 40, 200, 255]);
        }
        let bytes = encode_png(&img).expect("encode");
        let back = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(img.as_raw(), back.as_raw());
    }

    #[test]
    fn bounded_passes_small_images_through() {
        let img = RgbaImage::new(100, 80);
        let out = bounded(img.clone(), 16_000_000);
        assert_eq!(out.dimensions(), (100, 80));
    }

    #[test]
    fn bounded_downscales_preserving_aspect() {
        let img = RgbaImage::new(400, 100);
        let out = bounded(img, 10_000);
        assert!(out.width() as u64 * out.height() as u64 <= 10_000);
        // 4:1 aspect survives the downscale
        let ratio = out.width() as f64 / out.height() as f64;
        assert!((ratio - 4.0).abs() < 0.2, "aspect drifted: {}", ratio);
    }

    #[test]
    fn export_filename_is_png_with_prefix() {
        let name = export_filename();
        assert!(name.starts_with("lingens-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn write_card_png_produces_decodable_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("card.png");
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([9, 8, 7, 255]));
        write_card_png(&img, &path).expect("write");
        let back = image::open(&path).expect("reopen").to_rgba8();
        assert_eq!(back.dimensions(), (4, 4));
        assert_eq!(back.get_pixel(0, 0).0, [9, 8, 7, 255]);
    }
}

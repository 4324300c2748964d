// ============================================================================
// FONT ASSETS — system font discovery and cached loading
// ============================================================================
//
// The card renderer asks for (family, weight, italic) triples; fonts are
// resolved through font-kit and cached as `ab_glyph::FontArc`. No font data
// is bundled with the binary — when a requested family is missing we walk a
// fallback chain ending at the platform's generic sans-serif, and when even
// that fails the renderer skips text rather than erroring.

use std::cell::RefCell;
use std::collections::HashMap;

use ab_glyph::FontArc;
use font_kit::family_name::FamilyName;
use font_kit::properties::{Properties, Style, Weight};
use font_kit::source::SystemSource;

/// Families tried when the requested one is unavailable.
const FALLBACK_FAMILIES: &[&str] = &[
    "Inter",
    "Liberation Sans",
    "DejaVu Sans",
    "Helvetica",
    "Arial",
];

pub struct FontLibrary {
    cache: RefCell<HashMap<(String, u16, bool), Option<FontArc>>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Resolve a font, walking the fallback chain when the exact family is
    /// missing. Returns `None` only when the system has no usable
    /// sans-serif at all.
    pub fn get(&self, family: &str, weight: u16, italic: bool) -> Option<FontArc> {
        let key = (family.to_string(), weight, italic);
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }

        let mut families: Vec<FamilyName> = Vec::new();
        if !family.is_empty() {
            families.push(FamilyName::Title(family.to_string()));
        }
        for fb in FALLBACK_FAMILIES {
            families.push(FamilyName::Title((*fb).to_string()));
        }
        families.push(FamilyName::SansSerif);

        let loaded = load_font(&families, weight, italic);
        self.cache.borrow_mut().insert(key, loaded.clone());
        loaded
    }

    /// The regular-weight fallback font.
    pub fn default_font(&self) -> Option<FontArc> {
        self.get("", 400, false)
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the best match for the given family chain via font-kit.
fn load_font(families: &[FamilyName], weight: u16, italic: bool) -> Option<FontArc> {
    let mut props = Properties::new();
    props.weight = Weight(weight as f32);
    if italic {
        props.style = Style::Italic;
    }

    let handle = SystemSource::new().select_best_match(families, &props).ok()?;
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    let bytes: Vec<u8> = (*data).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// Enumerate system font families for the typography dropdown.
/// Family names only — fast, no font data is loaded.
pub fn enumerate_system_fonts() -> Vec<String> {
    match SystemSource::new().all_families() {
        Ok(mut families) => {
            families.sort();
            families.dedup();
            families
        }
        Err(_) => FALLBACK_FAMILIES.iter().map(|s| s.to_string()).collect(),
    }
}

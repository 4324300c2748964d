// ============================================================================
// GENERATION HISTORY — capped, persisted, restorable snapshots
// ============================================================================
//
// Every successful full generation is snapshotted: post body plus the
// complete visual state, self-contained (embedded images serialize as
// base64 PNG). Restoring an item replays the session exactly as it was.

use eframe::egui;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::visual::{TemplateStyle, VisualState};

/// Most-recent-first, capped; the oldest item falls off on overflow.
pub const HISTORY_CAP: usize = 20;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub timestamp_ms: u64,
    pub post_text: String,
    pub visual: VisualState,
    pub template: TemplateStyle,
}

impl HistoryItem {
    pub fn new(post_text: String, visual: VisualState, template: TemplateStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            post_text,
            visual,
            template,
        }
    }
}

pub struct GenerationHistory {
    items: Vec<HistoryItem>,
    /// None disables persistence (tests, headless runs).
    path: Option<PathBuf>,
}

impl GenerationHistory {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            items: Vec::new(),
            path,
        }
    }

    /// The on-disk history location inside the app data directory.
    pub fn default_path() -> PathBuf {
        crate::io::app_data_dir().join("history.json")
    }

    /// Load persisted history. Missing or corrupt files degrade to an empty
    /// history rather than failing startup.
    pub fn load(path: PathBuf) -> Self {
        let items = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<Vec<HistoryItem>>(&json) {
                Ok(mut items) => {
                    items.truncate(HISTORY_CAP);
                    items
                }
                Err(e) => {
                    crate::log_warn!("History file unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            items,
            path: Some(path),
        }
    }

    /// Prepend a snapshot, dropping the oldest past the cap, and persist.
    pub fn prepend(&mut self, item: HistoryItem) {
        self.items.insert(0, item);
        self.items.truncate(HISTORY_CAP);
        self.persist();
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&self) {
        let Some(path) = &self.path else { return };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string(&self.items) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    crate::log_err!("Failed to persist history: {}", e);
                }
            }
            Err(e) => crate::log_err!("Failed to serialize history: {}", e),
        }
    }
}

/// History window listing snapshots newest-first. Returns the id of the
/// item the user chose to restore, if any.
pub fn show_history_window(
    ctx: &egui::Context,
    open: &mut bool,
    history: &GenerationHistory,
) -> Option<Uuid> {
    let mut restore = None;
    egui::Window::new("History")
        .open(open)
        .default_width(320.0)
        .resizable(true)
        .show(ctx, |ui| {
            if history.is_empty() {
                ui.label("No generations yet.");
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for item in history.items() {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.strong(truncated(&item.visual.headline, 40));
                            ui.small(truncated(&item.post_text, 80));
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Restore").clicked() {
                                restore = Some(item.id);
                            }
                        });
                    });
                    ui.separator();
                }
            });
        });
    restore
}

fn truncated(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(n: usize) -> HistoryItem {
        HistoryItem::new(
            format!("post {}", n),
            VisualState::default(),
            TemplateStyle::BoldTextOverlay,
        )
    }

    #[test]
    fn prepend_keeps_newest_first_and_caps_at_twenty() {
        let mut history = GenerationHistory::new(None);
        for n in 0..21 {
            history.prepend(item(n));
        }
        assert_eq!(history.items().len(), HISTORY_CAP);
        assert_eq!(history.items()[0].post_text, "post 20");
        // The very first snapshot fell off the end.
        assert_eq!(history.items().last().unwrap().post_text, "post 1");
    }

    #[test]
    fn lookup_by_id_finds_the_right_snapshot() {
        let mut history = GenerationHistory::new(None);
        let a = item(1);
        let a_id = a.id;
        history.prepend(a);
        history.prepend(item(2));

        let found = history.get(a_id).expect("item present");
        assert_eq!(found.post_text, "post 1");
        assert!(history.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn history_persists_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");

        let mut history = GenerationHistory::new(Some(path.clone()));
        let mut visual = VisualState::default();
        visual.headline = "Persisted headline".to_string();
        history.prepend(HistoryItem::new(
            "persisted post".to_string(),
            visual,
            TemplateStyle::MinimalTypography,
        ));

        let reloaded = GenerationHistory::load(path);
        assert_eq!(reloaded.items().len(), 1);
        let back = &reloaded.items()[0];
        assert_eq!(back.post_text, "persisted post");
        assert_eq!(back.visual.headline, "Persisted headline");
        assert_eq!(back.template, TemplateStyle::MinimalTypography);
    }

    #[test]
    fn corrupt_history_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").expect("write");

        let history = GenerationHistory::load(path);
        assert!(history.is_empty());
    }
}

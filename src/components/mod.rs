// ============================================================================
// COMPONENTS MODULE — egui panels and widgets
// ============================================================================
//
//   card.rs    — interactive card preview (texture upload + drag wiring)
//   editor.rs  — text, background, branding and typography controls
//   history.rs — capped generation history with persistence + window
// ============================================================================

pub mod card;
pub mod editor;
pub mod history;

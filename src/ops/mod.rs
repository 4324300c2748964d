// ============================================================================
// OPS MODULE — the operations behind the editor surface
// ============================================================================
//
//   text.rs   — emphasis parsing, glyph shaping, word wrap, rasterization
//   render.rs — template policies compositing the 500×625 card
//   ai.rs     — generation backend client + background job pipeline
// ============================================================================

pub mod ai;
pub mod render;
pub mod text;

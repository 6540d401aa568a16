//! TUI rendering components.

mod render;
pub mod text_layout;

pub use render::draw;

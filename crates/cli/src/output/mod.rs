//! Rendering of session views for the terminal and for machines.

mod format;
mod render;

pub use format::OutputFormat;
pub use render::Renderer;

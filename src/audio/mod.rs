// Audio module - stream format and the real-time render path

pub mod format;
pub mod render;

// Re-export commonly used types for convenience
pub use format::StreamFormat;
pub use render::{RenderCallback, RenderGate, RenderStats};

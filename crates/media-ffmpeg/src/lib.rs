mod error;
mod expr;
mod format;
mod render;

pub use error::{MediaFfmpegError, Result};
pub use expr::{CropX, PanEasing};
pub use format::{format_decimal, format_seconds, sanitize_file_stem, shell_quote};
pub use render::{
    Assembly, Encoding, FfmpegCommand, RenderRequest, RenderSegment, build_filter_complex,
    build_render_command,
};

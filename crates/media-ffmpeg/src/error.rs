use std::fmt::{Display, Formatter};

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, MediaFfmpegError>;

/// Error type for FFmpeg command synthesis.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaFfmpegError {
    InvalidRenderRequest {
        reason: &'static str,
    },
    InvalidSegmentRange {
        index: usize,
        start: f64,
        end: f64,
    },
    NonFiniteValue {
        context: &'static str,
        value: f64,
    },
}

impl Display for MediaFfmpegError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRenderRequest { reason } => {
                write!(f, "invalid render request: {reason}")
            }
            Self::InvalidSegmentRange { index, start, end } => {
                write!(f, "segment {index} range is not positive: {start}..{end}")
            }
            Self::NonFiniteValue { context, value } => {
                write!(f, "non-finite value ({context}): {value}")
            }
        }
    }
}

impl std::error::Error for MediaFfmpegError {}

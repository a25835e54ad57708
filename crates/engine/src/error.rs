use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::timeline::{ClipId, SceneId};

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by timeline edits, project loading and command synthesis.
#[derive(Debug)]
pub enum EngineError {
    InvalidDimensions {
        value: String,
    },
    DimensionsOutOfRange {
        width: u64,
        height: u64,
    },
    InvalidField {
        field: &'static str,
        value: String,
    },
    InvalidSceneRange {
        clip: String,
        scene: usize,
        start: f64,
        end: f64,
    },
    ClipNotFound {
        clip_id: ClipId,
    },
    SceneNotFound {
        clip_id: ClipId,
        scene_id: SceneId,
    },
    FirstSceneClipStart {
        clip_id: ClipId,
    },
    SceneIndexOutOfRange {
        clip_id: ClipId,
        index: usize,
        len: usize,
    },
    PlaybackUnavailable {
        what: &'static str,
    },
    EmptyProject,
    EmptyClip {
        clip: String,
    },
    Context {
        context: String,
        source: Box<EngineError>,
    },
    ProjectIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    ProjectSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidProjectFile {
        reason: String,
    },
    Media(media_ffmpeg::MediaFfmpegError),
}

impl EngineError {
    /// Wraps the error with the identity of the item being processed.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping context wrappers.
    pub fn root(&self) -> &EngineError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDimensions { value } => {
                write!(f, "invalid dimensions {value:?}: expected WIDTHxHEIGHT")
            }
            Self::DimensionsOutOfRange { width, height } => write!(
                f,
                "dimensions {width}x{height} out of range: 1x1 to {}x{}",
                crate::geometry::MAX_WIDTH,
                crate::geometry::MAX_HEIGHT
            ),
            Self::InvalidField { field, value } => write!(f, "invalid {field}: {value}"),
            Self::InvalidSceneRange {
                clip,
                scene,
                start,
                end,
            } => write!(
                f,
                "clip {clip:?} scene {scene}: end ({end:.2}) must be after start ({start:.2})"
            ),
            Self::ClipNotFound { clip_id } => write!(f, "clip not found: {clip_id}"),
            Self::SceneNotFound { clip_id, scene_id } => {
                write!(f, "scene {scene_id} not found in clip {clip_id}")
            }
            Self::FirstSceneClipStart { clip_id } => {
                write!(f, "clip start of the first scene in clip {clip_id} is fixed at 0")
            }
            Self::SceneIndexOutOfRange {
                clip_id,
                index,
                len,
            } => write!(
                f,
                "scene index {index} out of range for clip {clip_id} with {len} scenes"
            ),
            Self::PlaybackUnavailable { what } => write!(f, "playback surface has no {what}"),
            Self::EmptyProject => write!(f, "project has no clips"),
            Self::EmptyClip { clip } => write!(f, "clip {clip:?} has no scenes"),
            Self::Context { context, source } => write!(f, "{context}: {source}"),
            Self::ProjectIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::ProjectSerialization { path, source } => {
                write!(
                    f,
                    "project serialization/deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::InvalidProjectFile { reason } => write!(f, "invalid project file: {reason}"),
            Self::Media(err) => write!(f, "command synthesis error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source.as_ref()),
            Self::ProjectIo { source, .. } => Some(source),
            Self::ProjectSerialization { source, .. } => Some(source),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<media_ffmpeg::MediaFfmpegError> for EngineError {
    fn from(value: media_ffmpeg::MediaFfmpegError) -> Self {
        Self::Media(value)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineError;

    #[test]
    fn context_prefixes_message_and_keeps_root() {
        let error = EngineError::EmptyClip {
            clip: "Intro".to_string(),
        }
        .context("clip 2");

        assert_eq!(error.to_string(), "clip 2: clip \"Intro\" has no scenes");
        assert!(matches!(error.root(), EngineError::EmptyClip { .. }));
    }
}

//! UI-agnostic scene timeline and FFmpeg command synthesis for Scenecut.

pub mod api;
pub mod continuity;
pub mod error;
pub mod export;
pub mod geometry;
pub mod playback;
pub mod project;
pub mod script;
pub mod time;
pub mod timeline;

pub use api::{ClipSummary, Command, Engine, Event, ProjectSnapshot, SceneField, SceneSummary};
pub use continuity::{CONTINUITY_EPSILON, ContinuityGap, ContinuityWarning};
pub use error::{EngineError, Result};
pub use export::{
    ClipCommand, ExportSettings, NO_SCENES_MARKER, SceneSelection, build_render_request,
    clip_command, scene_command,
};
pub use geometry::{CropWindow, Dimensions};
pub use playback::{NoPlayback, PlaybackSurface};
pub use project::{ClipDescription, Project, ProjectDescription, ProjectSettings, SceneDescription};
pub use script::build_script;
pub use timeline::{Clip, ClipId, PanMethod, Scene, SceneId, Timeline};

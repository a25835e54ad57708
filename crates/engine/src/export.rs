use media_ffmpeg::{
    Assembly, CropX, Encoding, PanEasing, RenderRequest, RenderSegment, build_render_command,
    sanitize_file_stem,
};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::geometry::{CropWindow, Dimensions};
use crate::project::Project;
use crate::time::round_seconds;
use crate::timeline::{Clip, ClipId, PanMethod, Scene, SceneId, ensure_scene_range};

/// Text shown in place of a command for a clip without scenes.
pub const NO_SCENES_MARKER: &str = "# no scenes";

/// Encoder options and batch-script header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub overwrite: bool,
    pub shebang: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        let encoding = Encoding::default();
        Self {
            video_codec: encoding.video_codec,
            audio_codec: encoding.audio_codec,
            overwrite: encoding.overwrite,
            shebang: "#!/bin/bash".to_string(),
        }
    }
}

impl ExportSettings {
    fn encoding(&self) -> Encoding {
        Encoding {
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            overwrite: self.overwrite,
        }
    }
}

/// Generated command for one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipCommand {
    Ready(String),
    /// The clip has no scenes yet; not an error.
    NoScenes,
}

impl ClipCommand {
    /// Command text, or [`NO_SCENES_MARKER`].
    pub fn text(&self) -> &str {
        match self {
            Self::Ready(text) => text,
            Self::NoScenes => NO_SCENES_MARKER,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Which scenes of a clip go into one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSelection {
    /// Every scene, concatenated in order.
    Whole,
    /// One scene by 0-based position, rendered on its own.
    One(usize),
}

/// `<sanitized clip name>.mp4`
pub fn clip_output_file(clip: &Clip) -> String {
    format!("{}.mp4", sanitize_file_stem(clip.name()))
}

/// `<sanitized clip name>-<1-based scene position>.mp4`
pub fn scene_output_file(clip: &Clip, scene_index: usize) -> String {
    format!("{}-{}.mp4", sanitize_file_stem(clip.name()), scene_index + 1)
}

/// Horizontal crop position of `scene` inside `input`.
pub fn crop_x(scene: &Scene, input: Dimensions, crop: CropWindow) -> CropX {
    let start_x = crop.x_at(input, scene.h_crop());
    if !scene.pan() {
        return CropX::Fixed(start_x);
    }
    CropX::Pan {
        from: start_x,
        to: crop.x_at(input, scene.h_crop_end()),
        duration: round_seconds(scene.end() - scene.start()),
        easing: match scene.pan_method() {
            PanMethod::Linear => PanEasing::Linear,
            PanMethod::Ease => PanEasing::Cosine,
        },
    }
}

/// Builds the render request for `selection` of one clip.
///
/// Returns `None` for a clip with no scenes. Every selected scene must end
/// after it starts.
pub fn build_render_request(
    project: &Project,
    clip_id: ClipId,
    selection: SceneSelection,
    settings: &ExportSettings,
) -> Result<Option<RenderRequest>> {
    let clip = project.timeline.clip(clip_id)?;
    let (scenes, assembly, output_path) = match selection {
        SceneSelection::Whole => {
            if clip.is_empty() {
                return Ok(None);
            }
            (
                clip.scenes().iter().enumerate().collect::<Vec<_>>(),
                Assembly::Concat,
                clip_output_file(clip),
            )
        }
        SceneSelection::One(index) => {
            let scene = clip
                .scenes()
                .get(index)
                .ok_or(EngineError::SceneIndexOutOfRange {
                    clip_id,
                    index,
                    len: clip.scenes().len(),
                })?;
            (
                vec![(index, scene)],
                Assembly::Single,
                scene_output_file(clip, index),
            )
        }
    };

    let input = project.settings.input_dims;
    let crop = project.crop_window();
    let mut segments = Vec::with_capacity(scenes.len());
    for (index, scene) in scenes {
        ensure_scene_range(clip, index, scene)?;
        segments.push(RenderSegment {
            start: scene.start(),
            end: scene.end(),
            crop_width: crop.width,
            crop_height: crop.height,
            crop_x: crop_x(scene, input, crop),
        });
    }

    Ok(Some(RenderRequest {
        input: project.settings.input_name.clone(),
        segments,
        output_width: project.settings.output_dims.width(),
        output_height: project.settings.output_dims.height(),
        assembly,
        encoding: settings.encoding(),
        output_path,
    }))
}

/// Synthesizes the concatenating command for a whole clip.
pub fn clip_command(
    project: &Project,
    clip_id: ClipId,
    settings: &ExportSettings,
) -> Result<ClipCommand> {
    let Some(request) = build_render_request(project, clip_id, SceneSelection::Whole, settings)?
    else {
        debug!(clip_id, "clip has no scenes");
        return Ok(ClipCommand::NoScenes);
    };
    let text = render_text(project, clip_id, &request)?;
    debug!(
        clip_id,
        scene_count = request.segments.len(),
        output = %request.output_path,
        "clip command synthesized"
    );
    Ok(ClipCommand::Ready(text))
}

/// Synthesizes the standalone command for one scene.
pub fn scene_command(
    project: &Project,
    clip_id: ClipId,
    scene_id: SceneId,
    settings: &ExportSettings,
) -> Result<String> {
    let index = project
        .timeline
        .clip(clip_id)?
        .scene_index(scene_id)
        .ok_or(EngineError::SceneNotFound { clip_id, scene_id })?;
    let request = build_render_request(project, clip_id, SceneSelection::One(index), settings)?
        .ok_or(EngineError::SceneNotFound { clip_id, scene_id })?;
    let text = render_text(project, clip_id, &request)?;
    debug!(clip_id, scene_id, output = %request.output_path, "scene command synthesized");
    Ok(text)
}

fn render_text(project: &Project, clip_id: ClipId, request: &RenderRequest) -> Result<String> {
    let clip = project.timeline.clip(clip_id)?;
    let command = build_render_command(request)
        .map_err(|error| EngineError::from(error).context(format!("clip {:?}", clip.name())))?;
    Ok(command.to_shell())
}

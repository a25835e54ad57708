use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ClipSummary, ProjectSnapshot, SceneSummary};
use crate::error::{EngineError, Result};
use crate::export::clip_output_file;
use crate::geometry::{CropWindow, Dimensions};
use crate::timeline::{ClipDraft, PanMethod, SceneDraft, Timeline};

/// Project state: global settings plus the clip timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub settings: ProjectSettings,
    pub timeline: Timeline,
}

/// Project-wide source and output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub input_name: String,
    pub input_dims: Dimensions,
    pub output_dims: Dimensions,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            input_name: "input.mp4".to_string(),
            input_dims: Dimensions::FULL_HD,
            output_dims: Dimensions::PORTRAIT_HD,
        }
    }
}

impl ProjectSettings {
    /// Crop window shared by every scene of the project.
    pub fn crop_window(&self) -> CropWindow {
        CropWindow::fit(self.input_dims, self.output_dims)
    }
}

/// Persisted project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescription {
    #[serde(default)]
    pub input_name: String,
    pub in_dim: String,
    pub out_dim: String,
    #[serde(default)]
    pub clips: Vec<ClipDescription>,
}

/// Persisted clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDescription {
    pub name: String,
    #[serde(default)]
    pub scenes: Vec<SceneDescription>,
}

/// Persisted scene. Derived fields are not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    pub start: f64,
    pub end: f64,
    pub h_crop: f64,
    #[serde(default)]
    pub pan: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_crop_end: Option<f64>,
    #[serde(default)]
    pub pan_method: PanMethod,
}

impl Project {
    /// Builds a project with one clip holding one default scene.
    pub fn new(settings: ProjectSettings) -> Self {
        Self {
            settings,
            timeline: Timeline::starter(),
        }
    }

    /// Crop window derived from the current dimensions.
    pub fn crop_window(&self) -> CropWindow {
        self.settings.crop_window()
    }

    /// Validates a persisted document and rebuilds the project from it.
    ///
    /// Nothing is partially applied: the first invalid field aborts the load.
    pub fn from_description(description: ProjectDescription) -> Result<Self> {
        let input_name = description.input_name.trim();
        if input_name.is_empty() {
            return Err(EngineError::InvalidField {
                field: "inputName",
                value: description.input_name.clone(),
            });
        }
        let input_dims =
            Dimensions::parse(&description.in_dim).map_err(|error| error.context("inDim"))?;
        let output_dims =
            Dimensions::parse(&description.out_dim).map_err(|error| error.context("outDim"))?;

        let drafts = description
            .clips
            .into_iter()
            .map(|clip| ClipDraft {
                name: clip.name,
                scenes: clip
                    .scenes
                    .into_iter()
                    .map(|scene| SceneDraft {
                        start: scene.start,
                        end: scene.end,
                        h_crop: scene.h_crop,
                        pan: scene.pan,
                        h_crop_end: scene.h_crop_end.unwrap_or(scene.h_crop),
                        pan_method: scene.pan_method,
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            settings: ProjectSettings {
                input_name: input_name.to_string(),
                input_dims,
                output_dims,
            },
            timeline: Timeline::restore(drafts)?,
        })
    }

    /// Produces the persisted document. Fails unless the timeline is fully specified.
    pub fn to_description(&self) -> Result<ProjectDescription> {
        self.timeline.ensure_fully_specified()?;
        Ok(ProjectDescription {
            input_name: self.settings.input_name.clone(),
            in_dim: self.settings.input_dims.to_string(),
            out_dim: self.settings.output_dims.to_string(),
            clips: self
                .timeline
                .drafts()
                .into_iter()
                .map(|clip| ClipDescription {
                    name: clip.name,
                    scenes: clip
                        .scenes
                        .into_iter()
                        .map(|scene| SceneDescription {
                            start: scene.start,
                            end: scene.end,
                            h_crop: scene.h_crop,
                            pan: scene.pan,
                            h_crop_end: Some(scene.h_crop_end),
                            pan_method: scene.pan_method,
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    /// Parses a project from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let description = serde_json::from_str::<ProjectDescription>(text).map_err(|error| {
            EngineError::InvalidProjectFile {
                reason: error.to_string(),
            }
        })?;
        Self::from_description(description)
    }

    /// Renders the project as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        let description = self.to_description()?;
        serde_json::to_string_pretty(&description).map_err(|error| {
            EngineError::InvalidProjectFile {
                reason: error.to_string(),
            }
        })
    }

    /// Loads a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::ProjectIo {
            context: "read project file",
            path: path.to_path_buf(),
            source,
        })?;
        let description = serde_json::from_str::<ProjectDescription>(&text).map_err(|source| {
            EngineError::ProjectSerialization {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let project = Self::from_description(description)?;

        info!(
            path = %path.display(),
            clip_count = project.timeline.clips().len(),
            scene_count = project.timeline.scene_count(),
            "project loaded"
        );
        Ok(project)
    }

    /// Saves the project file. Nothing is written when the timeline is incomplete.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let description = self.to_description()?;
        let text = serde_json::to_string_pretty(&description).map_err(|source| {
            EngineError::ProjectSerialization {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, text).map_err(|source| EngineError::ProjectIo {
            context: "write project file",
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            clip_count = description.clips.len(),
            "project saved"
        );
        Ok(())
    }

    /// Creates an immutable snapshot for presentation layers.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            input_name: self.settings.input_name.clone(),
            input_dims: self.settings.input_dims,
            output_dims: self.settings.output_dims,
            crop: self.crop_window(),
            clips: self
                .timeline
                .clips()
                .iter()
                .map(|clip| ClipSummary {
                    id: clip.id(),
                    name: clip.name().to_string(),
                    output_file: clip_output_file(clip),
                    duration: clip.duration(),
                    scenes: clip
                        .scenes()
                        .iter()
                        .map(|scene| SceneSummary {
                            id: scene.id(),
                            start: scene.start(),
                            end: scene.end(),
                            length: scene.length(),
                            clip_start: scene.clip_start(),
                            clip_start_editable: scene.clip_start_editable(),
                            h_crop: scene.h_crop(),
                            pan: scene.pan(),
                            h_crop_end: scene.h_crop_end(),
                            pan_method: scene.pan_method(),
                            continuity_gap: scene.continuity_gap(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectDescription, ProjectSettings};
    use crate::error::EngineError;
    use crate::timeline::PanMethod;

    const SAMPLE: &str = r#"{
        "inputName": "talk.mp4",
        "inDim": "1920x1080",
        "outDim": "720x1280",
        "clips": [
            {
                "name": "Intro",
                "scenes": [
                    { "start": 0, "end": 4, "hCrop": 20, "pan": true, "hCropEnd": 80, "panMethod": "zoom" },
                    { "start": 4, "end": 9.5, "hCrop": 80 }
                ]
            },
            { "name": "Body", "scenes": [ { "start": 9.5, "end": 20, "hCrop": 50 } ] }
        ]
    }"#;

    #[test]
    fn from_json_reads_optional_fields_with_defaults() {
        let project = Project::from_json(SAMPLE).expect("sample should load");

        assert_eq!(project.settings.input_name, "talk.mp4");
        assert_eq!(project.settings.output_dims.to_string(), "720x1280");
        let clips = project.timeline.clips();
        assert_eq!(clips.len(), 2);

        let first = &clips[0].scenes()[0];
        assert!(first.pan());
        assert_eq!(first.pan_method(), PanMethod::Ease);
        assert_eq!(first.h_crop_end(), 80.0);

        let second = &clips[0].scenes()[1];
        assert!(!second.pan());
        assert_eq!(second.h_crop_end(), 80.0);
        assert_eq!(second.pan_method(), PanMethod::Linear);
        assert_eq!(second.clip_start(), 4.0);
    }

    #[test]
    fn description_round_trip_is_stable() {
        let project = Project::from_json(SAMPLE).expect("sample should load");
        let description = project.to_description().expect("describe");
        let reloaded = Project::from_description(description.clone()).expect("reload");

        assert_eq!(reloaded, project);
        assert_eq!(reloaded.to_description().expect("describe"), description);
    }

    #[test]
    fn missing_clips_is_structural_error() {
        let result = Project::from_json(r#"{ "inputName": "a.mp4", "inDim": "1920x1080", "outDim": "1080x1920" }"#);
        assert!(matches!(result, Err(EngineError::EmptyProject)));
    }

    #[test]
    fn non_array_scenes_is_invalid_project_file() {
        let result = Project::from_json(
            r#"{ "inputName": "a.mp4", "inDim": "1920x1080", "outDim": "1080x1920",
                 "clips": [ { "name": "A", "scenes": 3 } ] }"#,
        );
        assert!(matches!(result, Err(EngineError::InvalidProjectFile { .. })));
    }

    #[test]
    fn malformed_dimensions_are_reported_with_field_name() {
        let mut description: ProjectDescription =
            serde_json::from_str(SAMPLE).expect("sample parses");
        description.out_dim = "720:1280".to_string();

        let error = Project::from_description(description).expect_err("must fail");
        assert!(error.to_string().starts_with("outDim: invalid dimensions"));
        assert!(matches!(error.root(), EngineError::InvalidDimensions { .. }));
    }

    #[test]
    fn save_refuses_empty_clip() {
        let mut project = Project::new(ProjectSettings::default());
        project.timeline.add_clip(Some("Later")).expect("add clip");

        let path = std::env::temp_dir().join(format!(
            "scenecut-save-refused-{}.json",
            std::process::id()
        ));
        let result = project.save(&path);
        assert!(matches!(result, Err(EngineError::EmptyClip { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn save_then_load_restores_project() {
        let project = Project::from_json(SAMPLE).expect("sample should load");
        let path = std::env::temp_dir().join(format!(
            "scenecut-roundtrip-{}-{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system clock must be after unix epoch")
                .as_nanos()
        ));

        project.save(&path).expect("save should succeed");
        let loaded = Project::load(&path).expect("load should succeed");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, project);
    }

    #[test]
    fn load_missing_file_reports_io_context() {
        let error = Project::load("/nonexistent/scenecut/project.json").expect_err("must fail");
        assert!(matches!(
            error,
            EngineError::ProjectIo {
                context: "read project file",
                ..
            }
        ));
    }
}

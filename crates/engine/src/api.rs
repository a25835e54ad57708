use tracing::{debug, info, warn};

use crate::continuity::{ContinuityGap, ContinuityWarning};
use crate::error::{EngineError, Result};
use crate::export::{self, ClipCommand, ExportSettings};
use crate::geometry::{CropWindow, Dimensions};
use crate::playback::PlaybackSurface;
use crate::project::{Project, ProjectDescription, ProjectSettings};
use crate::script::build_script;
use crate::time::{parse_number, round_seconds};
use crate::timeline::{ClipId, PanMethod, SceneId};

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Appends a clip; without a name it is called `Clip <id>`.
    AddClip {
        name: Option<String>,
    },
    RemoveClip {
        clip_id: ClipId,
    },
    RenameClip {
        clip_id: ClipId,
        name: String,
    },
    /// Appends a scene. `start: None` continues from the preceding scene.
    ///
    /// # Example
    /// ```
    /// use engine::{Command, Engine, NoPlayback};
    ///
    /// let mut engine = Engine::new(NoPlayback);
    /// let clip_id = engine.project().timeline.clips()[0].id();
    /// engine
    ///     .handle_command(Command::AddScene { clip_id, start: None })
    ///     .expect("add scene");
    /// let scenes = engine.project().timeline.clips()[0].scenes();
    /// assert_eq!((scenes[1].start(), scenes[1].end()), (5.0, 10.0));
    /// ```
    AddScene {
        clip_id: ClipId,
        start: Option<f64>,
    },
    /// Appends a scene starting at the current playhead.
    AddSceneAtPlayhead {
        clip_id: ClipId,
    },
    RemoveScene {
        clip_id: ClipId,
        scene_id: SceneId,
    },
    /// Moves a scene to `to_index` within its clip.
    MoveScene {
        clip_id: ClipId,
        scene_id: SceneId,
        to_index: usize,
    },
    SetSceneStart {
        clip_id: ClipId,
        scene_id: SceneId,
        start: f64,
    },
    SetSceneEnd {
        clip_id: ClipId,
        scene_id: SceneId,
        end: f64,
    },
    SetSceneLength {
        clip_id: ClipId,
        scene_id: SceneId,
        length: f64,
    },
    /// Moves the output-time boundary before `scene_id` by resizing the
    /// preceding scene. Rejected for the first scene of a clip.
    SetClipStart {
        clip_id: ClipId,
        scene_id: SceneId,
        clip_start: f64,
    },
    /// Sets the scene start to the current playhead.
    MarkSceneStart {
        clip_id: ClipId,
        scene_id: SceneId,
    },
    /// Sets the scene end to the current playhead.
    MarkSceneEnd {
        clip_id: ClipId,
        scene_id: SceneId,
    },
    SetHCrop {
        clip_id: ClipId,
        scene_id: SceneId,
        h_crop: f64,
    },
    /// Toggles panning. `None` fields keep their stored values.
    SetPan {
        clip_id: ClipId,
        scene_id: SceneId,
        enabled: bool,
        h_crop_end: Option<f64>,
        method: Option<PanMethod>,
    },
    /// Applies user-entered text to one numeric scene field. Non-numeric text
    /// is rejected and the stored value kept.
    ///
    /// # Example
    /// ```
    /// use engine::{Command, Engine, NoPlayback, SceneField};
    ///
    /// let mut engine = Engine::new(NoPlayback);
    /// let clip = &engine.project().timeline.clips()[0];
    /// let (clip_id, scene_id) = (clip.id(), clip.scenes()[0].id());
    /// let edit = |text: &str| Command::SetSceneField {
    ///     clip_id,
    ///     scene_id,
    ///     field: SceneField::Length,
    ///     text: text.to_string(),
    /// };
    /// assert!(engine.handle_command(edit("abc")).is_err());
    /// engine.handle_command(edit("3.5")).expect("numeric text");
    /// assert_eq!(engine.project().timeline.clips()[0].scenes()[0].end(), 3.5);
    /// ```
    SetSceneField {
        clip_id: ClipId,
        scene_id: SceneId,
        field: SceneField,
        text: String,
    },
    SetInputName {
        name: String,
    },
    /// Parses and applies `WIDTHxHEIGHT` texts. Both are validated before
    /// either is applied.
    SetDimensions {
        input: Option<String>,
        output: Option<String>,
    },
    /// Copies the native size of the loaded source into the input dimensions.
    AdoptSourceDimensions,
    /// Replaces the whole project. The current project is kept on failure.
    LoadProject {
        description: ProjectDescription,
    },
}

/// Numeric scene fields editable from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneField {
    Start,
    End,
    Length,
    ClipStart,
    HCrop,
    HCropEnd,
}

impl SceneField {
    fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Length => "length",
            Self::ClipStart => "clipStart",
            Self::HCrop => "hCrop",
            Self::HCropEnd => "hCropEnd",
        }
    }
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ProjectChanged(ProjectSnapshot),
    /// Advisory; emitted after `ProjectChanged` only when gaps exist.
    ContinuityWarnings(Vec<ContinuityWarning>),
}

/// Immutable project snapshot consumed by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub input_name: String,
    pub input_dims: Dimensions,
    pub output_dims: Dimensions,
    pub crop: CropWindow,
    pub clips: Vec<ClipSummary>,
}

/// Snapshot representation of one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSummary {
    pub id: ClipId,
    pub name: String,
    pub output_file: String,
    pub duration: f64,
    pub scenes: Vec<SceneSummary>,
}

/// Snapshot representation of one scene, derived fields included.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub id: SceneId,
    pub start: f64,
    pub end: f64,
    pub length: f64,
    pub clip_start: f64,
    pub clip_start_editable: bool,
    pub h_crop: f64,
    pub pan: bool,
    pub h_crop_end: f64,
    pub pan_method: PanMethod,
    pub continuity_gap: Option<ContinuityGap>,
}

/// Editing engine over one project.
#[derive(Debug)]
pub struct Engine<P> {
    playback: P,
    project: Project,
    export_settings: ExportSettings,
}

impl<P> Engine<P>
where
    P: PlaybackSurface,
{
    /// Creates an engine holding the starter project.
    ///
    /// # Example
    /// ```
    /// use engine::{Engine, NoPlayback};
    ///
    /// let engine = Engine::new(NoPlayback);
    /// assert_eq!(engine.snapshot().clips[0].name, "Clip 1");
    /// ```
    pub fn new(playback: P) -> Self {
        Self::with_project(playback, Project::new(ProjectSettings::default()))
    }

    pub fn with_project(playback: P, project: Project) -> Self {
        Self {
            playback,
            project,
            export_settings: ExportSettings::default(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn export_settings(&self) -> &ExportSettings {
        &self.export_settings
    }

    pub fn set_export_settings(&mut self, settings: ExportSettings) {
        self.export_settings = settings;
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        self.project.snapshot()
    }

    /// Applies one command and returns emitted events.
    ///
    /// A rejected command leaves the project untouched.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::AddClip { name } => {
                self.project.timeline.add_clip(name.as_deref())?;
            }
            Command::RemoveClip { clip_id } => {
                self.project.timeline.remove_clip(clip_id)?;
            }
            Command::RenameClip { clip_id, name } => {
                self.project.timeline.rename_clip(clip_id, &name)?;
            }
            Command::AddScene { clip_id, start } => {
                let start = start.or_else(|| self.first_scene_start());
                self.project.timeline.add_scene(clip_id, start)?;
            }
            Command::AddSceneAtPlayhead { clip_id } => {
                let start = self.playhead()?;
                self.project.timeline.add_scene(clip_id, Some(start))?;
            }
            Command::RemoveScene { clip_id, scene_id } => {
                self.project.timeline.remove_scene(clip_id, scene_id)?;
            }
            Command::MoveScene {
                clip_id,
                scene_id,
                to_index,
            } => self.project.timeline.move_scene(clip_id, scene_id, to_index)?,
            Command::SetSceneStart {
                clip_id,
                scene_id,
                start,
            } => self.project.timeline.set_scene_start(clip_id, scene_id, start)?,
            Command::SetSceneEnd {
                clip_id,
                scene_id,
                end,
            } => self.project.timeline.set_scene_end(clip_id, scene_id, end)?,
            Command::SetSceneLength {
                clip_id,
                scene_id,
                length,
            } => self
                .project
                .timeline
                .set_scene_length(clip_id, scene_id, length)?,
            Command::SetClipStart {
                clip_id,
                scene_id,
                clip_start,
            } => self
                .project
                .timeline
                .set_clip_start(clip_id, scene_id, clip_start)?,
            Command::MarkSceneStart { clip_id, scene_id } => {
                let at = self.playhead()?;
                self.project.timeline.set_scene_start(clip_id, scene_id, at)?;
            }
            Command::MarkSceneEnd { clip_id, scene_id } => {
                let at = self.playhead()?;
                self.project.timeline.set_scene_end(clip_id, scene_id, at)?;
            }
            Command::SetHCrop {
                clip_id,
                scene_id,
                h_crop,
            } => self.project.timeline.set_h_crop(clip_id, scene_id, h_crop)?,
            Command::SetPan {
                clip_id,
                scene_id,
                enabled,
                h_crop_end,
                method,
            } => self
                .project
                .timeline
                .set_pan(clip_id, scene_id, enabled, h_crop_end, method)?,
            Command::SetSceneField {
                clip_id,
                scene_id,
                field,
                text,
            } => self.set_scene_field(clip_id, scene_id, field, &text)?,
            Command::SetInputName { name } => self.set_input_name(&name)?,
            Command::SetDimensions { input, output } => {
                self.set_dimensions(input.as_deref(), output.as_deref())?;
            }
            Command::AdoptSourceDimensions => {
                let dims = self
                    .playback
                    .source_dimensions()
                    .ok_or(EngineError::PlaybackUnavailable {
                        what: "source dimensions",
                    })?;
                self.project.settings.input_dims = dims;
                info!(input_dims = %dims, "input dimensions adopted from source");
            }
            Command::LoadProject { description } => {
                self.project = Project::from_description(description)?;
                info!(
                    clip_count = self.project.timeline.clips().len(),
                    scene_count = self.project.timeline.scene_count(),
                    "project loaded"
                );
            }
        }
        Ok(self.changed_events())
    }

    /// Command for a whole clip, or the no-scenes placeholder.
    pub fn clip_command(&self, clip_id: ClipId) -> Result<ClipCommand> {
        export::clip_command(&self.project, clip_id, &self.export_settings)
    }

    /// Standalone command for one scene.
    pub fn scene_command(&self, clip_id: ClipId, scene_id: SceneId) -> Result<String> {
        export::scene_command(&self.project, clip_id, scene_id, &self.export_settings)
    }

    /// Batch script covering every clip with scenes.
    pub fn script(&self) -> Result<String> {
        build_script(&self.project, &self.export_settings)
    }

    /// Persisted form of the current project.
    pub fn description(&self) -> Result<ProjectDescription> {
        self.project.to_description()
    }

    fn playhead(&self) -> Result<f64> {
        let at = self
            .playback
            .current_time()
            .ok_or(EngineError::PlaybackUnavailable { what: "playhead" })?;
        Ok(round_seconds(at))
    }

    fn set_scene_field(
        &mut self,
        clip_id: ClipId,
        scene_id: SceneId,
        field: SceneField,
        text: &str,
    ) -> Result<()> {
        let value = parse_number(field.name(), text)?;
        let timeline = &mut self.project.timeline;
        match field {
            SceneField::Start => timeline.set_scene_start(clip_id, scene_id, value),
            SceneField::End => timeline.set_scene_end(clip_id, scene_id, value),
            SceneField::Length => timeline.set_scene_length(clip_id, scene_id, value),
            SceneField::ClipStart => timeline.set_clip_start(clip_id, scene_id, value),
            SceneField::HCrop => timeline.set_h_crop(clip_id, scene_id, value),
            SceneField::HCropEnd => {
                let pan = timeline.scene(clip_id, scene_id)?.pan();
                timeline.set_pan(clip_id, scene_id, pan, Some(value), None)
            }
        }
    }

    /// The first scene of a project starts at the playhead when one exists.
    fn first_scene_start(&self) -> Option<f64> {
        if self.project.timeline.scene_count() > 0 {
            return None;
        }
        self.playback.current_time().map(round_seconds)
    }

    fn set_input_name(&mut self, name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidField {
                field: "inputName",
                value: name.to_string(),
            });
        }
        self.project.settings.input_name = trimmed.to_string();
        Ok(())
    }

    fn set_dimensions(&mut self, input: Option<&str>, output: Option<&str>) -> Result<()> {
        let input = input
            .map(|text| Dimensions::parse(text).map_err(|error| error.context("inDim")))
            .transpose()?;
        let output = output
            .map(|text| Dimensions::parse(text).map_err(|error| error.context("outDim")))
            .transpose()?;
        if let Some(input) = input {
            self.project.settings.input_dims = input;
        }
        if let Some(output) = output {
            self.project.settings.output_dims = output;
        }
        debug!(
            input_dims = %self.project.settings.input_dims,
            output_dims = %self.project.settings.output_dims,
            "dimensions applied"
        );
        Ok(())
    }

    fn changed_events(&self) -> Vec<Event> {
        let mut events = vec![Event::ProjectChanged(self.project.snapshot())];
        let warnings = self.project.timeline.continuity_warnings();
        if !warnings.is_empty() {
            for warning in &warnings {
                warn!(
                    clip_id = warning.clip_id,
                    scene_id = warning.scene_id,
                    gap = warning.gap.gap,
                    "{warning}"
                );
            }
            events.push(Event::ContinuityWarnings(warnings));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{Command, Engine, Event, SceneField};
    use crate::error::EngineError;
    use crate::geometry::Dimensions;
    use crate::playback::{NoPlayback, PlaybackSurface};
    use crate::timeline::{ClipId, PanMethod, SceneId};

    #[derive(Debug, Default)]
    struct MockPlayback {
        time: Cell<Option<f64>>,
        dims: Option<Dimensions>,
    }

    impl MockPlayback {
        fn at(seconds: f64) -> Self {
            Self {
                time: Cell::new(Some(seconds)),
                dims: None,
            }
        }
    }

    impl PlaybackSurface for MockPlayback {
        fn current_time(&self) -> Option<f64> {
            self.time.get()
        }

        fn source_dimensions(&self) -> Option<Dimensions> {
            self.dims
        }
    }

    fn first_ids<P: PlaybackSurface>(engine: &Engine<P>) -> (ClipId, SceneId) {
        let clip = &engine.project().timeline.clips()[0];
        (clip.id(), clip.scenes()[0].id())
    }

    #[test]
    fn edit_emits_snapshot_with_derived_fields() {
        let mut engine = Engine::new(NoPlayback);
        let (clip_id, scene_id) = first_ids(&engine);

        let events = engine
            .handle_command(Command::SetSceneLength {
                clip_id,
                scene_id,
                length: 7.5,
            })
            .expect("edit should succeed");

        assert_eq!(events.len(), 1);
        let Event::ProjectChanged(snapshot) = &events[0] else {
            panic!("first event must be ProjectChanged");
        };
        let scene = &snapshot.clips[0].scenes[0];
        assert_eq!(scene.end, 7.5);
        assert_eq!(scene.length, 7.5);
        assert!(!scene.clip_start_editable);
        assert_eq!(snapshot.clips[0].output_file, "Clip_1.mp4");
        assert_eq!(snapshot.clips[0].duration, 7.5);
    }

    #[test]
    fn gap_emits_continuity_warning_after_snapshot() {
        let mut engine = Engine::new(NoPlayback);
        let (clip_id, _) = first_ids(&engine);

        let events = engine
            .handle_command(Command::AddScene {
                clip_id,
                start: Some(9.0),
            })
            .expect("add scene");

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::ProjectChanged(_)));
        let Event::ContinuityWarnings(warnings) = &events[1] else {
            panic!("second event must be ContinuityWarnings");
        };
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].scene_index, 1);
        assert_eq!(warnings[0].gap.gap, 4.0);
    }

    #[test]
    fn mark_commands_read_the_playhead() {
        let playback = MockPlayback::at(2.344);
        let mut engine = Engine::new(&playback);
        let (clip_id, scene_id) = first_ids(&engine);

        engine
            .handle_command(Command::MarkSceneStart { clip_id, scene_id })
            .expect("mark start");
        playback.time.set(Some(6.0));
        engine
            .handle_command(Command::MarkSceneEnd { clip_id, scene_id })
            .expect("mark end");

        let scene = &engine.project().timeline.clips()[0].scenes()[0];
        assert_eq!(scene.start(), 2.34);
        assert_eq!(scene.end(), 6.0);
        assert_eq!(scene.length(), 3.66);
    }

    #[test]
    fn first_scene_of_project_starts_at_playhead() {
        let playback = MockPlayback::at(12.0);
        let mut engine = Engine::new(&playback);
        let (clip_id, _) = first_ids(&engine);
        engine
            .handle_command(Command::RemoveClip { clip_id })
            .expect("remove");
        let clip_id = engine.project().timeline.clips()[0].id();

        engine
            .handle_command(Command::AddScene {
                clip_id,
                start: None,
            })
            .expect("add first scene");
        playback.time.set(Some(40.0));
        engine
            .handle_command(Command::AddScene {
                clip_id,
                start: None,
            })
            .expect("add second scene");

        let scenes = engine.project().timeline.clips()[0].scenes();
        assert_eq!((scenes[0].start(), scenes[0].end()), (12.0, 17.0));
        assert_eq!(scenes[1].start(), 17.0);
    }

    #[test]
    fn text_field_edits_reject_non_numeric_input() {
        let mut engine = Engine::new(NoPlayback);
        let (clip_id, scene_id) = first_ids(&engine);
        let edit = |field, text: &str| Command::SetSceneField {
            clip_id,
            scene_id,
            field,
            text: text.to_string(),
        };

        let error = engine
            .handle_command(edit(SceneField::HCrop, "left"))
            .expect_err("non-numeric");
        assert_eq!(error.to_string(), "invalid hCrop: left");
        assert!(engine.handle_command(edit(SceneField::HCrop, "120")).is_err());
        assert_eq!(engine.project().timeline.clips()[0].scenes()[0].h_crop(), 50.0);

        engine
            .handle_command(edit(SceneField::HCropEnd, " 75.25 "))
            .expect("numeric");
        let scene = &engine.project().timeline.clips()[0].scenes()[0];
        assert_eq!(scene.h_crop_end(), 75.3);
        assert!(!scene.pan());
    }

    #[test]
    fn mark_without_player_is_rejected() {
        let mut engine = Engine::new(NoPlayback);
        let (clip_id, scene_id) = first_ids(&engine);
        let before = engine.snapshot();

        let error = engine
            .handle_command(Command::MarkSceneStart { clip_id, scene_id })
            .expect_err("no playhead");
        assert!(matches!(
            error,
            EngineError::PlaybackUnavailable { what: "playhead" }
        ));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn adopt_source_dimensions_updates_crop_window() {
        let playback = MockPlayback {
            dims: Some(Dimensions::parse("3840x2160").expect("valid")),
            ..MockPlayback::default()
        };
        let mut engine = Engine::new(playback);

        let events = engine
            .handle_command(Command::AdoptSourceDimensions)
            .expect("adopt");
        let Event::ProjectChanged(snapshot) = &events[0] else {
            panic!("first event must be ProjectChanged");
        };
        assert_eq!(snapshot.input_dims.to_string(), "3840x2160");
        assert_eq!(snapshot.crop.height, 2160.0);
        assert_eq!(snapshot.crop.width, 1215.0);
    }

    #[test]
    fn set_dimensions_is_all_or_nothing() {
        let mut engine = Engine::new(NoPlayback);
        let error = engine
            .handle_command(Command::SetDimensions {
                input: Some("1280x720".to_string()),
                output: Some("wide".to_string()),
            })
            .expect_err("malformed output");
        assert_eq!(
            error.to_string(),
            "outDim: invalid dimensions \"wide\": expected WIDTHxHEIGHT"
        );
        assert_eq!(engine.project().settings.input_dims.to_string(), "1920x1080");
    }

    #[test]
    fn pan_toggle_changes_generated_command() {
        let mut engine = Engine::new(NoPlayback);
        let (clip_id, scene_id) = first_ids(&engine);

        engine
            .handle_command(Command::SetPan {
                clip_id,
                scene_id,
                enabled: true,
                h_crop_end: Some(100.0),
                method: Some(PanMethod::Ease),
            })
            .expect("set pan");

        let command = engine.clip_command(clip_id).expect("command");
        assert!(command.text().contains("*(1-cos(PI*t/5.00))/2'"));
    }

    #[test]
    fn failed_load_keeps_current_project() {
        let mut engine = Engine::new(NoPlayback);
        let mut description = engine.description().expect("description");
        description.clips.clear();
        let before = engine.snapshot();

        let error = engine
            .handle_command(Command::LoadProject { description })
            .expect_err("empty project");
        assert!(matches!(error, EngineError::EmptyProject));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn remove_last_clip_leaves_empty_clip_with_placeholder_command() {
        let mut engine = Engine::new(NoPlayback);
        let (clip_id, _) = first_ids(&engine);

        engine
            .handle_command(Command::RemoveClip { clip_id })
            .expect("remove");
        let clip_id = engine.project().timeline.clips()[0].id();
        let command = engine.clip_command(clip_id).expect("placeholder");
        assert_eq!(command.text(), "# no scenes");
        assert_eq!(engine.script().expect("script"), "#!/bin/bash\n");
    }
}

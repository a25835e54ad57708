use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::continuity::{self, ContinuityGap, ContinuityWarning};
use crate::error::{EngineError, Result};
use crate::time::{percent_field, round_seconds, seconds_field};

/// Opaque identifier for clips.
pub type ClipId = u64;
/// Opaque identifier for scenes.
pub type SceneId = u64;

/// Length given to a freshly added scene, in seconds.
pub const DEFAULT_SCENE_LENGTH: f64 = 5.0;
/// Crop position of the very first scene, in percent.
pub const DEFAULT_H_CROP: f64 = 50.0;

/// How the crop window travels while a scene pans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanMethod {
    #[default]
    Linear,
    /// Zoom-like ease-in/ease-out.
    #[serde(alias = "zoom")]
    Ease,
}

/// One time-bounded range of the source with its own crop settings.
///
/// `length`, `clip_start` and the continuity annotation are derived and only
/// change through [`Timeline`] operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    id: SceneId,
    start: f64,
    end: f64,
    length: f64,
    clip_start: f64,
    clip_start_editable: bool,
    h_crop: f64,
    pan: bool,
    h_crop_end: f64,
    pan_method: PanMethod,
    continuity_gap: Option<ContinuityGap>,
}

/// Plain scene fields used to restore or persist a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDraft {
    pub start: f64,
    pub end: f64,
    pub h_crop: f64,
    pub pan: bool,
    pub h_crop_end: f64,
    pub pan_method: PanMethod,
}

/// Plain clip fields used to restore or persist a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipDraft {
    pub name: String,
    pub scenes: Vec<SceneDraft>,
}

impl Scene {
    fn new(id: SceneId, start: f64, h_crop: f64) -> Self {
        let end = round_seconds(start + DEFAULT_SCENE_LENGTH);
        Self {
            id,
            start,
            end,
            length: clamped_length(start, end),
            clip_start: 0.0,
            clip_start_editable: false,
            h_crop,
            pan: false,
            h_crop_end: h_crop,
            pan_method: PanMethod::Linear,
            continuity_gap: None,
        }
    }

    fn from_draft(id: SceneId, draft: &SceneDraft, clip: &str, number: usize) -> Result<Self> {
        let start = seconds_field("start", draft.start)?;
        let end = seconds_field("end", draft.end)?;
        if end <= start {
            return Err(EngineError::InvalidSceneRange {
                clip: clip.to_string(),
                scene: number,
                start,
                end,
            });
        }
        Ok(Self {
            id,
            start,
            end,
            length: clamped_length(start, end),
            clip_start: 0.0,
            clip_start_editable: false,
            h_crop: percent_field("hCrop", draft.h_crop)?,
            pan: draft.pan,
            h_crop_end: percent_field("hCropEnd", draft.h_crop_end)?,
            pan_method: draft.pan_method,
            continuity_gap: None,
        })
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Offset of this scene inside its clip's output.
    pub fn clip_start(&self) -> f64 {
        self.clip_start
    }

    /// False only for the first scene of a clip.
    pub fn clip_start_editable(&self) -> bool {
        self.clip_start_editable
    }

    pub fn h_crop(&self) -> f64 {
        self.h_crop
    }

    pub fn pan(&self) -> bool {
        self.pan
    }

    pub fn h_crop_end(&self) -> f64 {
        self.h_crop_end
    }

    pub fn pan_method(&self) -> PanMethod {
        self.pan_method
    }

    pub fn continuity_gap(&self) -> Option<ContinuityGap> {
        self.continuity_gap
    }

    /// Crop position the scene finishes at.
    pub fn exit_h_crop(&self) -> f64 {
        if self.pan { self.h_crop_end } else { self.h_crop }
    }

    pub fn draft(&self) -> SceneDraft {
        SceneDraft {
            start: self.start,
            end: self.end,
            h_crop: self.h_crop,
            pan: self.pan,
            h_crop_end: self.h_crop_end,
            pan_method: self.pan_method,
        }
    }

    pub(crate) fn set_continuity_gap(&mut self, gap: Option<ContinuityGap>) {
        self.continuity_gap = gap;
    }

    fn apply_start(&mut self, start: f64) {
        self.start = start;
        self.length = clamped_length(self.start, self.end);
    }

    fn apply_end(&mut self, end: f64) {
        self.end = end;
        self.length = clamped_length(self.start, self.end);
    }

    fn apply_length(&mut self, length: f64) {
        self.length = length;
        self.end = round_seconds(self.start + length);
    }
}

/// Named, ordered sequence of scenes that concatenate into one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    id: ClipId,
    name: String,
    scenes: Vec<Scene>,
}

impl Clip {
    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Finds the position of `scene_id` in this clip.
    pub fn scene_index(&self, scene_id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|scene| scene.id == scene_id)
    }

    /// Total output duration: the sum of scene lengths.
    pub fn duration(&self) -> f64 {
        round_seconds(self.scenes.iter().map(|scene| scene.length).sum())
    }

    pub(crate) fn scenes_mut(&mut self) -> impl Iterator<Item = &mut Scene> {
        self.scenes.iter_mut()
    }

    fn recalc_clip_starts(&mut self) {
        let mut offset = 0.0;
        for (index, scene) in self.scenes.iter_mut().enumerate() {
            scene.clip_start = if index == 0 { 0.0 } else { round_seconds(offset) };
            scene.clip_start_editable = index > 0;
            offset = scene.clip_start + scene.length;
        }
    }
}

/// Ordered clips of one project.
///
/// Every mutating operation recomputes clip starts for the touched clip and
/// revalidates continuity across all clips before returning, so derived fields
/// are always current when observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    clips: Vec<Clip>,
    next_clip_id: ClipId,
    next_scene_id: SceneId,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Creates a timeline holding one empty clip.
    pub fn new() -> Self {
        let mut timeline = Self {
            clips: Vec::new(),
            next_clip_id: 1,
            next_scene_id: 1,
        };
        timeline.push_fresh_clip();
        timeline
    }

    /// Creates a timeline holding one clip with one default scene.
    pub fn starter() -> Self {
        let mut timeline = Self::new();
        let scene_id = timeline.allocate_scene_id();
        timeline.clips[0]
            .scenes
            .push(Scene::new(scene_id, 0.0, DEFAULT_H_CROP));
        timeline.refresh(0);
        timeline
    }

    /// Rebuilds a timeline from persisted drafts.
    ///
    /// Fails on the first invalid clip or scene; the error names the clip and
    /// scene by 1-based position.
    pub fn restore(drafts: Vec<ClipDraft>) -> Result<Self> {
        if drafts.is_empty() {
            return Err(EngineError::EmptyProject);
        }

        let mut timeline = Self {
            clips: Vec::with_capacity(drafts.len()),
            next_clip_id: 1,
            next_scene_id: 1,
        };
        for (clip_index, draft) in drafts.iter().enumerate() {
            let clip_label = format!("clip {}", clip_index + 1);
            let name = validate_clip_name(&draft.name).map_err(|error| error.context(&clip_label))?;
            if draft.scenes.is_empty() {
                return Err(EngineError::EmptyClip { clip: name });
            }

            let id = timeline.allocate_clip_id();
            let mut scenes = Vec::with_capacity(draft.scenes.len());
            for (scene_index, scene) in draft.scenes.iter().enumerate() {
                let scene_id = timeline.allocate_scene_id();
                let scene = Scene::from_draft(scene_id, scene, &name, scene_index + 1).map_err(
                    |error| match error {
                        EngineError::InvalidSceneRange { .. } => error,
                        other => {
                            other.context(format!("{clip_label} ({name:?}) scene {}", scene_index + 1))
                        }
                    },
                )?;
                scenes.push(scene);
            }
            let mut clip = Clip { id, name, scenes };
            clip.recalc_clip_starts();
            timeline.clips.push(clip);
        }
        continuity::annotate(&mut timeline.clips);

        debug!(
            clip_count = timeline.clips.len(),
            scene_count = timeline.scene_count(),
            "timeline restored"
        );
        Ok(timeline)
    }

    /// Returns the drafts needed to rebuild this timeline.
    pub fn drafts(&self) -> Vec<ClipDraft> {
        self.clips
            .iter()
            .map(|clip| ClipDraft {
                name: clip.name.clone(),
                scenes: clip.scenes.iter().map(Scene::draft).collect(),
            })
            .collect()
    }

    /// Checks that every clip has scenes and every scene ends after it starts.
    pub fn ensure_fully_specified(&self) -> Result<()> {
        if self.clips.is_empty() {
            return Err(EngineError::EmptyProject);
        }
        for clip in &self.clips {
            if clip.scenes.is_empty() {
                return Err(EngineError::EmptyClip {
                    clip: clip.name.clone(),
                });
            }
            for (index, scene) in clip.scenes.iter().enumerate() {
                ensure_scene_range(clip, index, scene)?;
            }
        }
        Ok(())
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn scene_count(&self) -> usize {
        self.clips.iter().map(|clip| clip.scenes.len()).sum()
    }

    pub fn clip(&self, clip_id: ClipId) -> Result<&Clip> {
        let index = self.clip_index(clip_id)?;
        Ok(&self.clips[index])
    }

    pub fn clip_index(&self, clip_id: ClipId) -> Result<usize> {
        self.clips
            .iter()
            .position(|clip| clip.id == clip_id)
            .ok_or(EngineError::ClipNotFound { clip_id })
    }

    pub fn scene(&self, clip_id: ClipId, scene_id: SceneId) -> Result<&Scene> {
        let (clip_index, scene_index) = self.locate(clip_id, scene_id)?;
        Ok(&self.clips[clip_index].scenes[scene_index])
    }

    /// Warnings from the latest continuity pass.
    pub fn continuity_warnings(&self) -> Vec<ContinuityWarning> {
        continuity::collect_warnings(&self.clips)
    }

    /// Appends a clip. Without a name it is called `Clip <id>`.
    pub fn add_clip(&mut self, name: Option<&str>) -> Result<ClipId> {
        let name = name.map(validate_clip_name).transpose()?;
        let id = self.allocate_clip_id();
        let name = name.unwrap_or_else(|| default_clip_name(id));
        debug!(clip_id = id, name = %name, "clip added");
        self.clips.push(Clip {
            id,
            name,
            scenes: Vec::new(),
        });
        self.revalidate();
        Ok(id)
    }

    /// Removes a clip with its scenes. Removing the last clip leaves a fresh
    /// empty clip in its place.
    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<Clip> {
        let index = self.clip_index(clip_id)?;
        let removed = self.clips.remove(index);
        if self.clips.is_empty() {
            self.push_fresh_clip();
        }
        self.revalidate();
        debug!(
            clip_id,
            scene_count = removed.scenes.len(),
            clip_count = self.clips.len(),
            "clip removed"
        );
        Ok(removed)
    }

    pub fn rename_clip(&mut self, clip_id: ClipId, name: &str) -> Result<()> {
        let name = validate_clip_name(name)?;
        let index = self.clip_index(clip_id)?;
        self.clips[index].name = name;
        self.revalidate();
        Ok(())
    }

    /// Appends a scene to `clip_id`.
    ///
    /// The start defaults to the end of the preceding scene, looking back into
    /// earlier clips when `clip_id` is empty, or 0 for the first scene of the
    /// project. The crop position is inherited from that same scene's exit
    /// position.
    pub fn add_scene(&mut self, clip_id: ClipId, start: Option<f64>) -> Result<SceneId> {
        let clip_index = self.clip_index(clip_id)?;
        let start = start.map(|value| seconds_field("start", value)).transpose()?;
        let (inherited_start, h_crop) = self.clips[clip_index]
            .scenes
            .last()
            .or_else(|| self.last_scene_before(clip_index))
            .map(|previous| (previous.end, previous.exit_h_crop()))
            .unwrap_or((0.0, DEFAULT_H_CROP));
        let start = start.unwrap_or(inherited_start);

        let scene_id = self.allocate_scene_id();
        self.clips[clip_index]
            .scenes
            .push(Scene::new(scene_id, start, h_crop));
        self.refresh(clip_index);

        debug!(clip_id, scene_id, start, h_crop, "scene added");
        Ok(scene_id)
    }

    pub fn remove_scene(&mut self, clip_id: ClipId, scene_id: SceneId) -> Result<Scene> {
        let (clip_index, scene_index) = self.locate(clip_id, scene_id)?;
        let removed = self.clips[clip_index].scenes.remove(scene_index);
        self.refresh(clip_index);
        debug!(clip_id, scene_id, "scene removed");
        Ok(removed)
    }

    /// Moves a scene to `to_index` inside its own clip.
    pub fn move_scene(&mut self, clip_id: ClipId, scene_id: SceneId, to_index: usize) -> Result<()> {
        let (clip_index, from_index) = self.locate(clip_id, scene_id)?;
        let len = self.clips[clip_index].scenes.len();
        if to_index >= len {
            warn!(clip_id, scene_id, to_index, len, "move rejected: index out of range");
            return Err(EngineError::SceneIndexOutOfRange {
                clip_id,
                index: to_index,
                len,
            });
        }
        let scene = self.clips[clip_index].scenes.remove(from_index);
        self.clips[clip_index].scenes.insert(to_index, scene);
        self.refresh(clip_index);
        debug!(clip_id, scene_id, from_index, to_index, "scene moved");
        Ok(())
    }

    /// Sets the source start; `length` follows as `end - start`, clamped at 0.
    pub fn set_scene_start(&mut self, clip_id: ClipId, scene_id: SceneId, start: f64) -> Result<()> {
        let start = self.checked_seconds(clip_id, scene_id, "start", start)?;
        self.edit_scene(clip_id, scene_id, |scene| scene.apply_start(start))
    }

    /// Sets the source end; `length` follows as `end - start`, clamped at 0.
    pub fn set_scene_end(&mut self, clip_id: ClipId, scene_id: SceneId, end: f64) -> Result<()> {
        let end = self.checked_seconds(clip_id, scene_id, "end", end)?;
        self.edit_scene(clip_id, scene_id, |scene| scene.apply_end(end))
    }

    /// Sets the length; `end` follows as `start + length`.
    pub fn set_scene_length(
        &mut self,
        clip_id: ClipId,
        scene_id: SceneId,
        length: f64,
    ) -> Result<()> {
        let length = self.checked_seconds(clip_id, scene_id, "length", length)?;
        self.edit_scene(clip_id, scene_id, |scene| scene.apply_length(length))
    }

    /// Moves the boundary before `scene_id` to `clip_start` in output time.
    ///
    /// The preceding scene is resized to `max(0, clip_start - preceding.clip_start)`
    /// keeping its start; the edited scene itself does not move in the source.
    pub fn set_clip_start(
        &mut self,
        clip_id: ClipId,
        scene_id: SceneId,
        clip_start: f64,
    ) -> Result<()> {
        let (clip_index, scene_index) = self.locate(clip_id, scene_id)?;
        if scene_index == 0 {
            warn!(clip_id, scene_id, "clip start edit rejected: first scene");
            return Err(EngineError::FirstSceneClipStart { clip_id });
        }
        let clip_start = self.checked_seconds(clip_id, scene_id, "clipStart", clip_start)?;

        let previous = &mut self.clips[clip_index].scenes[scene_index - 1];
        let length = round_seconds(clip_start - previous.clip_start).max(0.0);
        previous.apply_length(length);
        let previous_id = previous.id;
        self.refresh(clip_index);

        debug!(
            clip_id,
            scene_id,
            previous_id,
            clip_start,
            previous_length = length,
            "clip start edit applied"
        );
        Ok(())
    }

    /// Sets the static crop position, or the pan start position.
    pub fn set_h_crop(&mut self, clip_id: ClipId, scene_id: SceneId, h_crop: f64) -> Result<()> {
        self.locate(clip_id, scene_id)?;
        let h_crop = percent_field("hCrop", h_crop)?;
        self.edit_scene(clip_id, scene_id, |scene| scene.h_crop = h_crop)
    }

    /// Enables or disables panning. `None` keeps the stored value.
    pub fn set_pan(
        &mut self,
        clip_id: ClipId,
        scene_id: SceneId,
        enabled: bool,
        h_crop_end: Option<f64>,
        method: Option<PanMethod>,
    ) -> Result<()> {
        self.locate(clip_id, scene_id)?;
        let h_crop_end = h_crop_end
            .map(|value| percent_field("hCropEnd", value))
            .transpose()?;
        self.edit_scene(clip_id, scene_id, |scene| {
            scene.pan = enabled;
            if let Some(h_crop_end) = h_crop_end {
                scene.h_crop_end = h_crop_end;
            }
            if let Some(method) = method {
                scene.pan_method = method;
            }
        })
    }

    /// Recomputes every `clip_start` of one clip as the running sum of lengths.
    pub fn recalc_clip_starts(&mut self, clip_id: ClipId) -> Result<()> {
        let index = self.clip_index(clip_id)?;
        self.clips[index].recalc_clip_starts();
        Ok(())
    }

    /// Re-runs the continuity pass over all clips.
    pub fn revalidate(&mut self) {
        continuity::annotate(&mut self.clips);
    }

    fn refresh(&mut self, clip_index: usize) {
        self.clips[clip_index].recalc_clip_starts();
        self.revalidate();
    }

    fn edit_scene(
        &mut self,
        clip_id: ClipId,
        scene_id: SceneId,
        edit: impl FnOnce(&mut Scene),
    ) -> Result<()> {
        let (clip_index, scene_index) = self.locate(clip_id, scene_id)?;
        edit(&mut self.clips[clip_index].scenes[scene_index]);
        self.refresh(clip_index);
        let scene = &self.clips[clip_index].scenes[scene_index];
        debug!(
            clip_id,
            scene_id,
            start = scene.start,
            end = scene.end,
            length = scene.length,
            clip_start = scene.clip_start,
            "scene edit applied"
        );
        Ok(())
    }

    fn checked_seconds(
        &self,
        clip_id: ClipId,
        scene_id: SceneId,
        field: &'static str,
        value: f64,
    ) -> Result<f64> {
        self.locate(clip_id, scene_id)?;
        seconds_field(field, value).inspect_err(|error| {
            warn!(clip_id, scene_id, field, value, %error, "scene edit rejected");
        })
    }

    fn locate(&self, clip_id: ClipId, scene_id: SceneId) -> Result<(usize, usize)> {
        let clip_index = self.clip_index(clip_id)?;
        let scene_index = self.clips[clip_index]
            .scene_index(scene_id)
            .ok_or(EngineError::SceneNotFound { clip_id, scene_id })?;
        Ok((clip_index, scene_index))
    }

    fn last_scene_before(&self, clip_index: usize) -> Option<&Scene> {
        self.clips[..clip_index]
            .iter()
            .rev()
            .find_map(|clip| clip.scenes.last())
    }

    fn push_fresh_clip(&mut self) {
        let id = self.allocate_clip_id();
        self.clips.push(Clip {
            id,
            name: default_clip_name(id),
            scenes: Vec::new(),
        });
    }

    fn allocate_clip_id(&mut self) -> ClipId {
        let id = self.next_clip_id;
        self.next_clip_id += 1;
        id
    }

    fn allocate_scene_id(&mut self) -> SceneId {
        let id = self.next_scene_id;
        self.next_scene_id += 1;
        id
    }
}

pub(crate) fn ensure_scene_range(clip: &Clip, index: usize, scene: &Scene) -> Result<()> {
    if scene.end <= scene.start {
        return Err(EngineError::InvalidSceneRange {
            clip: clip.name.clone(),
            scene: index + 1,
            start: scene.start,
            end: scene.end,
        });
    }
    Ok(())
}

fn clamped_length(start: f64, end: f64) -> f64 {
    round_seconds(end - start).max(0.0)
}

fn default_clip_name(id: ClipId) -> String {
    format!("Clip {id}")
}

fn validate_clip_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidField {
            field: "clip name",
            value: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::time::round_seconds;
use crate::timeline::{Clip, ClipId, SceneId};

/// Largest tolerated distance between a scene start and its predecessor's end.
pub const CONTINUITY_EPSILON: f64 = 0.05;

/// Measured mismatch between the expected and the actual scene start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuityGap {
    pub expected_start: f64,
    pub actual_start: f64,
    pub gap: f64,
}

/// Advisory warning for one scene; never blocks command generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuityWarning {
    pub clip_id: ClipId,
    pub clip_index: usize,
    pub clip_name: String,
    pub scene_id: SceneId,
    pub scene_index: usize,
    pub gap: ContinuityGap,
}

impl Display for ContinuityWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "clip {:?} scene {}: expected start {:.2}, found {:.2} (gap {:.2}s)",
            self.clip_name,
            self.scene_index + 1,
            self.gap.expected_start,
            self.gap.actual_start,
            self.gap.gap
        )
    }
}

/// Compares a scene start against the end it should continue from.
///
/// # Example
/// ```
/// use engine::continuity::check_gap;
///
/// assert!(check_gap(5.0, 5.03).is_none());
/// let gap = check_gap(5.0, 5.10).expect("gap above tolerance");
/// assert_eq!(gap.gap, 0.1);
/// ```
pub fn check_gap(expected_start: f64, actual_start: f64) -> Option<ContinuityGap> {
    let gap = round_seconds((actual_start - expected_start).abs());
    (gap > CONTINUITY_EPSILON).then_some(ContinuityGap {
        expected_start,
        actual_start,
        gap,
    })
}

/// Re-annotates every scene of every clip, in project order.
///
/// The chain runs through clip boundaries: the first scene of a clip continues
/// from the last scene of the nearest preceding clip that has scenes. The very
/// first scene of the project is never flagged.
pub(crate) fn annotate(clips: &mut [Clip]) {
    let mut previous_end: Option<f64> = None;
    let mut flagged = 0_usize;
    for clip in clips.iter_mut() {
        for scene in clip.scenes_mut() {
            let gap = previous_end.and_then(|expected| check_gap(expected, scene.start()));
            if gap.is_some() {
                flagged += 1;
            }
            scene.set_continuity_gap(gap);
            previous_end = Some(scene.end());
        }
    }
    debug!(clip_count = clips.len(), flagged, "continuity revalidated");
}

/// Collects the warnings left by the last [`annotate`] pass.
pub(crate) fn collect_warnings(clips: &[Clip]) -> Vec<ContinuityWarning> {
    let mut warnings = Vec::new();
    for (clip_index, clip) in clips.iter().enumerate() {
        for (scene_index, scene) in clip.scenes().iter().enumerate() {
            if let Some(gap) = scene.continuity_gap() {
                warnings.push(ContinuityWarning {
                    clip_id: clip.id(),
                    clip_index,
                    clip_name: clip.name().to_string(),
                    scene_id: scene.id(),
                    scene_index,
                    gap,
                });
            }
        }
    }
    warnings
}

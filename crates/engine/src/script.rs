use tracing::info;

use crate::error::Result;
use crate::export::{ClipCommand, ExportSettings, clip_command};
use crate::project::Project;

/// Joins the commands of every clip that has scenes into one shell script.
///
/// Clips without scenes are skipped. Any other synthesis failure aborts the
/// whole script.
///
/// # Example
/// ```
/// use engine::{ExportSettings, Project, ProjectSettings, build_script};
///
/// let project = Project::new(ProjectSettings::default());
/// let script = build_script(&project, &ExportSettings::default()).expect("script");
/// assert!(script.starts_with("#!/bin/bash\n\n# Clip: Clip 1\nffmpeg -y -i 'input.mp4'"));
/// ```
pub fn build_script(project: &Project, settings: &ExportSettings) -> Result<String> {
    let mut script = String::from(settings.shebang.as_str());
    script.push('\n');
    let mut written = 0_usize;
    for clip in project.timeline.clips() {
        let ClipCommand::Ready(command) = clip_command(project, clip.id(), settings)? else {
            continue;
        };
        script.push_str("\n# Clip: ");
        script.push_str(&comment_text(clip.name()));
        script.push('\n');
        script.push_str(&command);
        script.push('\n');
        written += 1;
    }
    info!(
        clip_count = project.timeline.clips().len(),
        written, "batch script assembled"
    );
    Ok(script)
}

fn comment_text(name: &str) -> String {
    name.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::build_script;
    use crate::error::EngineError;
    use crate::export::ExportSettings;
    use crate::project::{Project, ProjectSettings};

    #[test]
    fn empty_clips_are_skipped_and_order_is_kept() {
        let mut project = Project::new(ProjectSettings::default());
        project.timeline.add_clip(Some("Empty")).expect("add clip");
        let outro = project.timeline.add_clip(Some("Outro")).expect("add clip");
        project.timeline.add_scene(outro, None).expect("add scene");

        let script = build_script(&project, &ExportSettings::default()).expect("script");
        let headers: Vec<&str> = script
            .lines()
            .filter(|line| line.starts_with("# Clip: "))
            .collect();
        assert_eq!(headers, vec!["# Clip: Clip 1", "# Clip: Outro"]);
        assert_eq!(script.matches("ffmpeg ").count(), 2);
        assert!(!script.contains("# no scenes"));
    }

    #[test]
    fn project_without_scenes_yields_header_only() {
        let project = Project {
            settings: ProjectSettings::default(),
            timeline: crate::timeline::Timeline::new(),
        };
        let settings = ExportSettings {
            shebang: "#!/bin/sh".to_string(),
            ..ExportSettings::default()
        };
        assert_eq!(build_script(&project, &settings).expect("script"), "#!/bin/sh\n");
    }

    #[test]
    fn newlines_in_clip_names_stay_inside_the_comment() {
        let mut project = Project::new(ProjectSettings::default());
        let clip_id = project.timeline.clips()[0].id();
        project
            .timeline
            .rename_clip(clip_id, "two\nlines")
            .expect("rename");

        let script = build_script(&project, &ExportSettings::default()).expect("script");
        assert!(script.contains("\n# Clip: two lines\nffmpeg "));
    }

    #[test]
    fn invalid_scene_aborts_the_script() {
        let mut project = Project::new(ProjectSettings::default());
        let clip = &project.timeline.clips()[0];
        let (clip_id, scene_id) = (clip.id(), clip.scenes()[0].id());
        project
            .timeline
            .set_scene_length(clip_id, scene_id, 0.0)
            .expect("zero length is accepted while editing");

        let error = build_script(&project, &ExportSettings::default()).expect_err("must fail");
        assert!(matches!(error.root(), EngineError::InvalidSceneRange { .. }));
    }
}

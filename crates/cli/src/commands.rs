use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result, bail};
use engine::{Clip, ClipCommand, Dimensions, ExportSettings, Project, ProjectSettings};
use tracing::info;

use crate::cli::{CheckArgs, ClipArgs, InitArgs, SceneArgs, ScriptArgs};

pub fn init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to replace it",
            args.path.display()
        );
    }
    let settings = ProjectSettings {
        input_name: args.input,
        input_dims: Dimensions::parse(&args.in_dim).context("parse --in-dim")?,
        output_dims: Dimensions::parse(&args.out_dim).context("parse --out-dim")?,
    };
    Project::new(settings)
        .save(&args.path)
        .context("write starter project")?;
    info!(path = %args.path.display(), "starter project written");
    Ok(())
}

pub fn script(args: ScriptArgs, settings: &ExportSettings) -> Result<()> {
    let project = load(&args.project)?;
    let script = engine::build_script(&project, settings).context("build batch script")?;
    match args.output {
        Some(path) => {
            fs::write(&path, &script)
                .with_context(|| format!("write script to {}", path.display()))?;
            make_executable(&path)?;
            info!(path = %path.display(), "batch script written");
        }
        None => print_stdout(&script)?,
    }
    Ok(())
}

pub fn clip(args: ClipArgs, settings: &ExportSettings) -> Result<()> {
    let project = load(&args.project)?;
    let clip = select_clip(&project, &args.clip)?;
    let command = engine::clip_command(&project, clip.id(), settings)
        .with_context(|| format!("build command for clip {:?}", clip.name()))?;
    if let ClipCommand::NoScenes = command {
        info!(clip = clip.name(), "clip has no scenes");
    }
    print_stdout(&format!("{}\n", command.text()))
}

pub fn scene(args: SceneArgs, settings: &ExportSettings) -> Result<()> {
    let project = load(&args.project)?;
    let clip = select_clip(&project, &args.clip)?;
    let position = usize::try_from(args.scene).context("scene position")?;
    let Some(scene) = position
        .checked_sub(1)
        .and_then(|index| clip.scenes().get(index))
    else {
        bail!(
            "clip {:?} has {} scenes, no scene {}",
            clip.name(),
            clip.scenes().len(),
            args.scene
        );
    };
    let command = engine::scene_command(&project, clip.id(), scene.id(), settings)
        .with_context(|| format!("build command for clip {:?} scene {}", clip.name(), args.scene))?;
    print_stdout(&format!("{command}\n"))
}

pub fn check(args: CheckArgs) -> Result<()> {
    let project = load(&args.project)?;
    let warnings = project.timeline.continuity_warnings();
    let mut report = String::new();
    for warning in &warnings {
        report.push_str(&warning.to_string());
        report.push('\n');
    }
    if warnings.is_empty() {
        report.push_str("no continuity gaps\n");
    }
    print_stdout(&report)
}

fn load(path: &Path) -> Result<Project> {
    Project::load(path).with_context(|| format!("load project {}", path.display()))
}

/// Resolves a clip by exact name first, then by 1-based position.
fn select_clip<'a>(project: &'a Project, selector: &str) -> Result<&'a Clip> {
    let clips = project.timeline.clips();
    if let Some(clip) = clips.iter().find(|clip| clip.name() == selector) {
        return Ok(clip);
    }
    if let Ok(position) = selector.parse::<usize>() {
        if let Some(clip) = position.checked_sub(1).and_then(|index| clips.get(index)) {
            return Ok(clip);
        }
    }
    bail!("no clip named or numbered {selector:?}")
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes()).context("write stdout")?;
    stdout.flush().context("flush stdout")
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .with_context(|| format!("read permissions of {}", path.display()))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

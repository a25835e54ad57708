use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use engine::ExportSettings;

#[derive(Parser, Debug)]
#[command(
    name = "scenecut",
    version,
    about = "Builds FFmpeg crop/concat commands from a scene timeline project"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(flatten)]
    pub encoding: EncodingArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Writes a starter project with one clip and one scene.
    Init(InitArgs),
    /// Prints or writes the batch script for every clip with scenes.
    Script(ScriptArgs),
    /// Prints the command for one clip.
    Clip(ClipArgs),
    /// Prints the command for one scene.
    Scene(SceneArgs),
    /// Reports continuity gaps between consecutive scenes.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct EncodingArgs {
    /// Video codec passed to `-c:v`.
    #[arg(long, global = true, default_value = "libx264", value_name = "CODEC")]
    pub video_codec: String,

    /// Audio codec passed to `-c:a`.
    #[arg(long, global = true, default_value = "aac", value_name = "CODEC")]
    pub audio_codec: String,

    /// Leave out `-y` so ffmpeg asks before overwriting outputs.
    #[arg(long, global = true)]
    pub no_overwrite: bool,
}

impl EncodingArgs {
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            overwrite: !self.no_overwrite,
            ..ExportSettings::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project file to create.
    #[arg(value_name = "PROJECT")]
    pub path: PathBuf,

    /// Source video file name written into the commands.
    #[arg(long, default_value = "input.mp4", value_name = "FILE")]
    pub input: String,

    /// Source frame size.
    #[arg(long, default_value = "1920x1080", value_name = "WxH")]
    pub in_dim: String,

    /// Output frame size.
    #[arg(long, default_value = "1080x1920", value_name = "WxH")]
    pub out_dim: String,

    /// Replace an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ScriptArgs {
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Write the script here and mark it executable instead of printing it.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ClipArgs {
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Clip name, or its 1-based position.
    #[arg(value_name = "CLIP")]
    pub clip: String,
}

#[derive(Args, Debug)]
pub struct SceneArgs {
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,

    /// Clip name, or its 1-based position.
    #[arg(value_name = "CLIP")]
    pub clip: String,

    /// 1-based scene position within the clip.
    #[arg(value_name = "SCENE", value_parser = clap::value_parser!(u32).range(1..))]
    pub scene: u32,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(value_name = "PROJECT")]
    pub project: PathBuf,
}

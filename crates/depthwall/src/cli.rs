use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parallax::Viewpoint;
use sceneconfig::MotionKind;

#[derive(Parser, Debug)]
#[command(
    name = "depthwall",
    author,
    version,
    about = "Depth-map parallax wallpaper renderer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Scene pack handle (e.g. `scene://lake` or `packs/lake`)
    #[arg(value_name = "SCENE")]
    pub scene: Option<String>,

    /// Still color image; replaces the scene pack's sources.
    #[arg(long, value_name = "PATH", requires = "depth")]
    pub image: Option<PathBuf>,

    /// Depth map matching `--image`.
    #[arg(long, value_name = "PATH", requires = "image")]
    pub depth: Option<PathBuf>,

    /// Animated color source (GIF or a directory of numbered frames).
    #[arg(long, value_name = "PATH", requires = "video_depth")]
    pub video: Option<PathBuf>,

    /// Depth frames matching `--video`.
    #[arg(long, value_name = "PATH", requires = "video")]
    pub video_depth: Option<PathBuf>,

    /// Scene configuration file; defaults to `depthwall.toml` in the config directory.
    #[arg(long, env = "DEPTHWALL_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output resolution (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Number of frames to render.
    #[arg(long, value_name = "N", value_parser = parse_frames)]
    pub frames: Option<u32>,

    /// Directory that receives the numbered PNG frames.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Viewpoint motion: `sweep`, `orbit`, `still` or `wander`.
    #[arg(long, value_name = "KIND", value_parser = parse_motion)]
    pub motion: Option<MotionKind>,

    /// Pointer sensitivity multiplier.
    #[arg(long, value_name = "K", value_parser = parse_sensitivity)]
    pub sensitivity: Option<f32>,

    /// Depth compression constant in (0, 1].
    #[arg(long, value_name = "C")]
    pub compression: Option<f32>,

    /// Zoom around the image centre (1.0 disables it).
    #[arg(long, value_name = "U")]
    pub upscale: Option<f32>,

    /// Per-pixel perspective skew of the far endpoint.
    #[arg(long, value_name = "P", allow_negative_numbers = true)]
    pub perspective: Option<f32>,

    /// Export a single frame to the provided PNG path then exit.
    #[arg(long, value_name = "PATH", value_parser = parse_export_path)]
    pub still_export: Option<PathBuf>,

    /// Viewpoint used for `--still-export` and `--motion still`.
    #[arg(
        long,
        value_name = "X,Y",
        value_parser = parse_viewpoint,
        allow_hyphen_values = true
    )]
    pub viewpoint: Option<Viewpoint>,

    /// Render worker threads (defaults to one per core).
    #[arg(long, value_name = "N", value_parser = parse_threads)]
    pub threads: Option<usize>,

    /// Seed for `--motion wander`.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print resolved config, data and share directories and scene roots.
    Paths,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    sceneconfig::parse_size(value)
}

pub fn parse_motion(value: &str) -> Result<MotionKind, String> {
    value.parse()
}

pub fn parse_frames(value: &str) -> Result<u32, String> {
    let frames: u32 = value
        .trim()
        .parse()
        .map_err(|err| format!("invalid frame count '{value}': {err}"))?;
    if frames == 0 {
        return Err("frame count must be at least 1".to_string());
    }
    Ok(frames)
}

pub fn parse_threads(value: &str) -> Result<usize, String> {
    let threads: usize = value
        .trim()
        .parse()
        .map_err(|err| format!("invalid thread count '{value}': {err}"))?;
    if threads == 0 {
        return Err("thread count must be at least 1".to_string());
    }
    Ok(threads)
}

pub fn parse_sensitivity(value: &str) -> Result<f32, String> {
    let sensitivity: f32 = value
        .trim()
        .parse()
        .map_err(|err| format!("invalid sensitivity '{value}': {err}"))?;
    if !(sensitivity.is_finite() && sensitivity > 0.0) {
        return Err(format!("sensitivity must be positive, got {value}"));
    }
    Ok(sensitivity)
}

pub fn parse_viewpoint(value: &str) -> Result<Viewpoint, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("invalid viewpoint '{value}'; expected X,Y"))?;
    let x: f32 = x
        .trim()
        .parse()
        .map_err(|err| format!("invalid viewpoint x in '{value}': {err}"))?;
    let y: f32 = y
        .trim()
        .parse()
        .map_err(|err| format!("invalid viewpoint y in '{value}': {err}"))?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(format!("viewpoint '{value}' must be finite"));
    }
    Ok(Viewpoint::new(x, y))
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value.trim());
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(path),
        Some(ext) => Err(format!(
            "unsupported export extension '.{ext}'; only .png is supported"
        )),
        None => Err(format!("export path '{value}' must end in .png")),
    }
}

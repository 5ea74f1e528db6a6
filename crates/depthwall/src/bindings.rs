//! Folds the scene file, the selected scene pack and command-line overrides
//! into the settings the frame driver and motion sources consume. Command
//! line flags win everywhere. For tunables the scene file wins over pack
//! hints; for sources a selected pack replaces the scene file's sources.
use std::path::PathBuf;

use motion::MotionPlan;
use parallax::{DefaultSources, DriverConfig, KernelParams, ProjectionSettings, SceneProperties};
use sceneconfig::{KernelSection, MotionSection, ProjectionSection, SceneConfig, SceneSources};
use scenepack::LocalPack;

use crate::cli::RunArgs;

pub const DEFAULT_FRAMES: u32 = 120;

pub fn kernel_params(section: &KernelSection, args: &RunArgs) -> KernelParams {
    let defaults = KernelParams::default();
    KernelParams {
        compression: args
            .compression
            .or(section.compression)
            .unwrap_or(defaults.compression),
        steps: section.steps.unwrap_or(defaults.steps),
        max_steps: section.max_steps.unwrap_or(defaults.max_steps),
        confidence_max: section.confidence_max.unwrap_or(defaults.confidence_max),
        anti_alias: section.anti_alias.unwrap_or(defaults.anti_alias),
        aa_trigger: section.aa_trigger.unwrap_or(defaults.aa_trigger),
        correct: section.correct.unwrap_or(defaults.correct),
        correct_power: section.correct_power.unwrap_or(defaults.correct_power),
    }
}

pub fn projection_settings(section: &ProjectionSection, args: &RunArgs) -> ProjectionSettings {
    let defaults = ProjectionSettings::default();
    ProjectionSettings {
        upscale: args.upscale.or(section.upscale).unwrap_or(defaults.upscale),
        perspective: args
            .perspective
            .or(section.perspective)
            .unwrap_or(defaults.perspective),
        ..defaults
    }
}

pub fn pack_sources(pack: &LocalPack) -> SceneSources {
    let sources = pack.sources();
    SceneSources {
        image: sources.image,
        depth: sources.depth,
        video: sources.video,
        video_depth: sources.video_depth,
    }
}

pub fn cli_sources(args: &RunArgs) -> SceneSources {
    SceneSources {
        image: args.image.clone(),
        depth: args.depth.clone(),
        video: args.video.clone(),
        video_depth: args.video_depth.clone(),
    }
}

/// The highest layer that names any source wins as a whole: flags, then the
/// pack, then the scene file. Layers never mix, so an image left in a lower
/// layer cannot replace a clip picked above it.
pub fn resolve_sources(
    config: &SceneSources,
    pack: Option<&LocalPack>,
    args: &RunArgs,
) -> SceneSources {
    let flags = cli_sources(args);
    if !flags.is_empty() {
        return flags;
    }
    match pack {
        Some(pack) => pack_sources(pack),
        None => config.clone(),
    }
}

pub fn resolve_sensitivity(
    section: &MotionSection,
    pack: Option<&LocalPack>,
    args: &RunArgs,
) -> Option<f32> {
    args.sensitivity
        .or(section.sensitivity)
        .or_else(|| pack.and_then(|pack| pack.manifest().sensitivity))
}

/// Texture requests for the driver. With nothing selected the bundled
/// still image pair stands in.
pub fn scene_properties(
    sources: &SceneSources,
    sensitivity: Option<f32>,
    defaults: &DefaultSources,
) -> SceneProperties {
    if sources.is_empty() {
        return SceneProperties {
            image: defaults.image.clone(),
            image_depth: defaults.image_depth.clone(),
            sensitivity,
            ..SceneProperties::default()
        };
    }
    SceneProperties {
        video: sources.video.clone(),
        video_depth: sources.video_depth.clone(),
        image: sources.image.clone(),
        image_depth: sources.depth.clone(),
        sensitivity,
    }
}

pub fn motion_plan(
    section: &MotionSection,
    sensitivity: Option<f32>,
    args: &RunArgs,
) -> MotionPlan {
    let mut plan = MotionPlan::from_section(section);
    if let Some(kind) = args.motion {
        plan.kind = kind;
    }
    if let Some(sensitivity) = sensitivity {
        plan.sensitivity = sensitivity;
    }
    if let Some(seed) = args.seed {
        plan.seed = seed;
    }
    if let Some(viewpoint) = args.viewpoint {
        plan.viewpoint = viewpoint;
    }
    plan
}

pub fn driver_config(
    config: &SceneConfig,
    args: &RunArgs,
    sensitivity: Option<f32>,
    defaults: DefaultSources,
) -> DriverConfig {
    let base = DriverConfig::default();
    DriverConfig {
        size: args.size.or(config.output.size).unwrap_or(base.size),
        params: kernel_params(&config.kernel, args),
        projection: projection_settings(&config.projection, args),
        sensitivity: sensitivity.unwrap_or(base.sensitivity),
        threads: args.threads.or(config.output.threads),
        defaults,
    }
}

/// Where and how much to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub frames: u32,
    pub directory: PathBuf,
    pub still: Option<PathBuf>,
}

pub fn output_plan(config: &SceneConfig, args: &RunArgs, fallback_dir: PathBuf) -> OutputPlan {
    OutputPlan {
        frames: args.frames.or(config.output.frames).unwrap_or(DEFAULT_FRAMES),
        directory: args
            .output
            .clone()
            .or_else(|| config.output.directory.clone())
            .unwrap_or(fallback_dir),
        still: args
            .still_export
            .clone()
            .or_else(|| config.output.still.clone()),
    }
}

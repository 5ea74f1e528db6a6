use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use motion::MotionPlan;
use parallax::{
    export_png, AsyncLoader, DefaultSources, FrameDriver, FsLoader, PngSequenceSink,
    SceneProperties,
};
use sceneconfig::SceneConfig;
use scenepack::{LocalPack, SceneHandle, SceneRepository};
use tracing_subscriber::EnvFilter;

use crate::bindings::{
    driver_config, motion_plan, output_plan, resolve_sensitivity, resolve_sources,
    scene_properties, OutputPlan,
};
use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(&args, &paths)?;
    let pack = resolve_pack(&args, &paths)?;
    let defaults = DefaultSources::from_dir(&paths.defaults_dir());
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        share = %paths.share_dir().display(),
        defaults = ?defaults,
        "resolved depthwall paths"
    );

    let sources = resolve_sources(&config.scene, pack.as_ref(), &args);
    let sensitivity = resolve_sensitivity(&config.motion, pack.as_ref(), &args);
    let properties = scene_properties(&sources, sensitivity, &defaults);
    if properties.requests().is_empty() {
        bail!(
            "no scene selected and no bundled defaults found under {}",
            paths.defaults_dir().display()
        );
    }

    let output = output_plan(&config, &args, paths.frames_dir());
    let settings = driver_config(&config, &args, sensitivity, defaults.clone());
    let mut driver = FrameDriver::new(settings)?;
    load_scene(&mut driver, &properties, defaults)?;

    let plan = motion_plan(&config.motion, sensitivity, &args);
    match output.still.as_deref() {
        Some(path) => export_still(&mut driver, &plan, path),
        None => render_sequence(&mut driver, &plan, &output),
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<SceneConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let path = paths.config_file();
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "no scene config found; using defaults");
                return Ok(SceneConfig {
                    version: 1,
                    ..SceneConfig::default()
                });
            }
            path
        }
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read scene config {}", path.display()))?;
    let config = SceneConfig::from_toml_str_at(&raw, &path)
        .with_context(|| format!("invalid scene config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded scene config");
    Ok(config)
}

fn resolve_pack(args: &RunArgs, paths: &AppPaths) -> Result<Option<LocalPack>> {
    let Some(input) = args.scene.as_deref() else {
        return Ok(None);
    };
    let handle = SceneHandle::from_input(input);
    let repo = SceneRepository::new(paths.scene_roots());
    let pack = repo
        .resolve(&handle)
        .with_context(|| format!("failed to resolve scene '{input}'"))?;
    tracing::info!(
        scene = %pack.name(),
        root = %pack.root().display(),
        "selected scene pack"
    );
    Ok(Some(pack))
}

/// Loads the selected sources on the loader thread and applies them in
/// request order before the first frame.
fn load_scene(
    driver: &mut FrameDriver,
    properties: &SceneProperties,
    defaults: DefaultSources,
) -> Result<()> {
    let mut loader = AsyncLoader::spawn(Arc::new(FsLoader), defaults)?;
    for request in properties.requests() {
        loader.submit(request)?;
    }

    let mut failed = 0usize;
    for outcome in loader.wait_all()? {
        if driver.apply_outcome(outcome).is_err() {
            failed += 1;
        }
    }
    loader.shutdown()?;

    if let Some(sensitivity) = properties.sensitivity {
        driver.set_sensitivity(sensitivity);
    }
    if failed > 0 {
        tracing::warn!(failed, "some scene sources could not be loaded");
    }

    let (width, height) = driver.color().frame(0).dimensions();
    tracing::info!(
        color_frames = driver.color().len(),
        depth_frames = driver.depth().len(),
        width,
        height,
        "scene sources ready"
    );
    Ok(())
}

fn export_still(driver: &mut FrameDriver, plan: &MotionPlan, path: &Path) -> Result<()> {
    let frame = driver.update(plan.viewpoint);
    export_png(&frame, path)?;
    tracing::info!(
        path = %path.display(),
        viewpoint = ?plan.viewpoint.vector(),
        "exported still frame"
    );
    Ok(())
}

fn render_sequence(
    driver: &mut FrameDriver,
    plan: &MotionPlan,
    output: &OutputPlan,
) -> Result<()> {
    let mut source = plan.build(output.frames)?;
    source.set_sensitivity(driver.sensitivity());
    let mut sink = PngSequenceSink::create(&output.directory)?;

    tracing::info!(
        frames = output.frames,
        motion = plan.kind.as_str(),
        output = %output.directory.display(),
        "rendering frame sequence"
    );

    let started = Instant::now();
    let mut fallback_pixels = 0usize;
    for _ in 0..output.frames {
        let viewpoint = source.sample();
        let frame = driver.present(viewpoint, &mut sink)?;
        fallback_pixels += frame.fallback_pixels();
    }

    let elapsed = started.elapsed();
    tracing::info!(
        frames = sink.written(),
        fallback_pixels,
        elapsed_ms = elapsed.as_millis() as u64,
        output = %sink.dir().display(),
        "render complete"
    );
    Ok(())
}

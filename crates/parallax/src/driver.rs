use anyhow::{anyhow, Result};
use tracing::{debug, error, info, warn};

use crate::error::ParamsError;
use crate::frame::render_frame;
use crate::loader::{load_request, AsyncLoader, LoadOutcome, LoadedSource};
use crate::sink::FrameSink;
use crate::source::{
    ColorSource, DefaultSources, DepthSource, SceneProperties, SourceRequest, TextureLoader,
};
use crate::texture::FrameBuffer;
use crate::types::{KernelParams, ProjectionSettings, Viewpoint};

#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub size: (u32, u32),
    pub params: KernelParams,
    pub projection: ProjectionSettings,
    pub sensitivity: f32,
    /// Worker threads for row evaluation; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub defaults: DefaultSources,
}

impl DriverConfig {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(ParamsError::Size(self.size.0, self.size.1));
        }
        self.params.validate()?;
        self.projection.validate()
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            size: (1920, 1080),
            params: KernelParams::default(),
            projection: ProjectionSettings::default(),
            sensitivity: 1.0,
            threads: None,
            defaults: DefaultSources::default(),
        }
    }
}

/// What [`FrameDriver::apply_properties`] changed.
#[derive(Debug, Default, PartialEq)]
pub struct PropertyReport {
    pub applied: Vec<SourceRequest>,
    pub failed: Vec<(SourceRequest, String)>,
    pub sensitivity: Option<f32>,
}

impl PropertyReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty() && self.sensitivity.is_none()
    }
}

/// Owns every piece of state shared across frames: the active color/depth
/// pair, the sensitivity scalar and the frame counter.
///
/// All mutation goes through `&mut self`, so it can only happen between
/// frames and never while rows of a frame are being evaluated.
pub struct FrameDriver {
    size: (u32, u32),
    params: KernelParams,
    projection: ProjectionSettings,
    sensitivity: f32,
    defaults: DefaultSources,
    color: ColorSource,
    depth: DepthSource,
    frame_index: u64,
    pool: Option<rayon::ThreadPool>,
}

impl FrameDriver {
    /// Starts with placeholder textures; a usable pair is installed through
    /// [`replace_color`](Self::replace_color) and friends.
    pub fn new(config: DriverConfig) -> Result<Self> {
        config.validate()?;
        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|index| format!("depthwall-render-{index}"))
                    .build()
                    .map_err(|err| anyhow!("failed to build render pool: {err}"))?,
            ),
            None => None,
        };

        info!(
            width = config.size.0,
            height = config.size.1,
            threads = ?config.threads,
            "frame driver ready"
        );

        Ok(Self {
            size: config.size,
            params: config.params,
            projection: config.projection,
            sensitivity: config.sensitivity,
            defaults: config.defaults,
            color: ColorSource::placeholder(),
            depth: DepthSource::placeholder(),
            frame_index: 0,
            pool,
        })
    }

    /// Renders the next frame for `viewpoint`. Animated sources advance one
    /// frame per call and loop.
    pub fn update(&mut self, viewpoint: Viewpoint) -> FrameBuffer {
        let index = self.frame_index;
        let color = self.color.frame(index);
        let depth = self.depth.frame(index);
        let render = || {
            render_frame(
                color,
                depth,
                viewpoint,
                self.size,
                &self.params,
                &self.projection,
                index,
            )
        };
        let frame = match &self.pool {
            Some(pool) => pool.install(render),
            None => render(),
        };

        if frame.fallback_pixels() > 0 {
            debug!(
                frame = index,
                fallback_pixels = frame.fallback_pixels(),
                "pixels fell back to the first candidate"
            );
        }
        self.frame_index += 1;
        frame
    }

    /// Renders the next frame and hands it to `sink`.
    pub fn present(
        &mut self,
        viewpoint: Viewpoint,
        sink: &mut dyn FrameSink,
    ) -> Result<FrameBuffer> {
        let frame = self.update(viewpoint);
        sink.consume(&frame)?;
        Ok(frame)
    }

    pub fn replace_color(&mut self, source: ColorSource) {
        self.color = source;
    }

    pub fn replace_depth(&mut self, source: DepthSource) {
        self.depth = source;
    }

    pub fn color(&self) -> &ColorSource {
        &self.color
    }

    pub fn depth(&self) -> &DepthSource {
        &self.depth
    }

    /// Applies host property changes in order: video, video depth, image,
    /// image depth, sensitivity. A slot whose source and default both fail
    /// keeps its previous texture.
    pub fn apply_properties(
        &mut self,
        properties: &SceneProperties,
        loader: &dyn TextureLoader,
    ) -> PropertyReport {
        let mut report = PropertyReport::default();
        for request in properties.requests() {
            let result = load_request(loader, &self.defaults, &request);
            let outcome = LoadOutcome { request, result };
            let request = outcome.request.clone();
            match self.apply_outcome(outcome) {
                Ok(()) => report.applied.push(request),
                Err(err) => report.failed.push((request, err)),
            }
        }

        if let Some(sensitivity) = properties.sensitivity {
            if self.set_sensitivity(sensitivity) {
                report.sensitivity = Some(sensitivity);
            }
        }
        report
    }

    /// Installs a finished load. Failures are logged and leave the slot as it
    /// was; the error text is returned for reporting.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome) -> Result<(), String> {
        let LoadOutcome { request, result } = outcome;
        match result {
            Ok(LoadedSource::Color(source)) => {
                debug!(
                    path = %request.path.display(),
                    frames = source.len(),
                    "color source applied"
                );
                self.replace_color(source);
                Ok(())
            }
            Ok(LoadedSource::Depth(source)) => {
                debug!(
                    path = %request.path.display(),
                    frames = source.len(),
                    "depth source applied"
                );
                self.replace_depth(source);
                Ok(())
            }
            Err(err) => {
                error!(
                    slot = request.slot.as_str(),
                    path = %request.path.display(),
                    "failed to load source, keeping previous texture: {err}"
                );
                Err(err.to_string())
            }
        }
    }

    /// Applies every load the worker has finished. Returns the number of
    /// slots that changed.
    pub fn poll_loads(&mut self, loader: &mut AsyncLoader) -> usize {
        loader
            .try_drain()
            .into_iter()
            .map(|outcome| self.apply_outcome(outcome))
            .filter(Result::is_ok)
            .count()
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Returns `false` and keeps the current value when `sensitivity` is not
    /// a finite number.
    pub fn set_sensitivity(&mut self, sensitivity: f32) -> bool {
        if !sensitivity.is_finite() {
            warn!(sensitivity, "ignoring non-finite sensitivity");
            return false;
        }
        self.sensitivity = sensitivity;
        true
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn params(&self) -> &KernelParams {
        &self.params
    }

    pub fn projection(&self) -> &ProjectionSettings {
        &self.projection
    }

    pub fn defaults(&self) -> &DefaultSources {
        &self.defaults
    }
}

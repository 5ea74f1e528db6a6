//! Scripted viewpoint motion for depthwall.
//!
//! Every source is frame-driven: the viewpoint for frame `n` depends only on
//! `n` and the source's settings, so offline renders are reproducible.

mod pointer;

use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec2;
use parallax::Viewpoint;
use rand::prelude::*;
use sceneconfig::{MotionKind, MotionSection};
use tracing::debug;

pub use pointer::PointerSmoother;

/// Vertical viewpoint of the classic horizontal sweep.
pub const DEFAULT_LIFT: f32 = -1.0 / 250.0;
/// Pointer units per viewpoint unit on the sweep's x axis.
const SWEEP_DIVISOR: f32 = 100.0;
const DEFAULT_PERIOD: Duration = Duration::from_secs(6);
/// Frames a wander target is held before a new one is drawn.
const WANDER_HOLD: u64 = 45;

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("sensitivity must be finite and positive, got {0}")]
    Sensitivity(f32),
    #[error("orbit period must be greater than zero")]
    ZeroPeriod,
    #[error("frame interval must be greater than zero")]
    ZeroInterval,
    #[error("{0} must be finite")]
    NonFinite(&'static str),
}

/// Produces one viewpoint per rendered frame.
pub trait ViewpointSource: Send {
    /// Rewinds to the first frame.
    fn reset(&mut self);
    /// Viewpoint for the next frame.
    fn sample(&mut self) -> Viewpoint;
    /// Sources that ignore sensitivity keep the default no-op.
    fn set_sensitivity(&mut self, _sensitivity: f32) {}
    fn kind(&self) -> MotionKind;
}

pub type BoxedViewpointSource = Box<dyn ViewpointSource>;

/// Walks the pointer linearly from `from` to `to` over `frames` frames with a
/// constant vertical component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    from: f32,
    to: f32,
    lift: f32,
    frames: u32,
    frame: u64,
}

impl Sweep {
    pub fn new(from: f32, to: f32, lift: f32, frames: u32) -> Self {
        Self {
            from,
            to,
            lift,
            frames,
            frame: 0,
        }
    }

    /// Pointer position for `frame` before scaling.
    pub fn pointer_at(&self, frame: u64) -> f32 {
        if self.frames <= 1 {
            return self.from;
        }
        let t = (frame.min(self.frames as u64 - 1)) as f32 / (self.frames - 1) as f32;
        self.from + (self.to - self.from) * t
    }
}

impl ViewpointSource for Sweep {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> Viewpoint {
        let x = self.pointer_at(self.frame);
        self.frame = self.frame.saturating_add(1);
        Viewpoint::new(x / SWEEP_DIVISOR, self.lift)
    }

    fn kind(&self) -> MotionKind {
        MotionKind::Sweep
    }
}

/// Circles the pointer target around the window centre and eases the
/// viewpoint after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    period: Duration,
    radius: f32,
    interval: Duration,
    frame: u64,
    smoother: PointerSmoother,
}

impl Orbit {
    pub fn new(
        period: Duration,
        radius: f32,
        interval: Duration,
        sensitivity: f32,
    ) -> Result<Self, MotionError> {
        if period.is_zero() {
            return Err(MotionError::ZeroPeriod);
        }
        if interval.is_zero() {
            return Err(MotionError::ZeroInterval);
        }
        if !radius.is_finite() {
            return Err(MotionError::NonFinite("orbit radius"));
        }
        Ok(Self {
            period,
            radius,
            interval,
            frame: 0,
            smoother: PointerSmoother::new(sensitivity),
        })
    }

    pub fn target_at(&self, frame: u64) -> Vec2 {
        let elapsed = self.interval.as_secs_f64() * frame as f64;
        let phase = (elapsed / self.period.as_secs_f64()).fract() as f32;
        let angle = phase * TAU;
        Vec2::new(angle.cos(), angle.sin()) * self.radius
    }
}

impl ViewpointSource for Orbit {
    fn reset(&mut self) {
        self.frame = 0;
        self.smoother.reset();
    }

    fn sample(&mut self) -> Viewpoint {
        let target = self.target_at(self.frame);
        self.frame = self.frame.saturating_add(1);
        self.smoother.step(target)
    }

    fn set_sensitivity(&mut self, sensitivity: f32) {
        self.smoother.set_sensitivity(sensitivity);
    }

    fn kind(&self) -> MotionKind {
        MotionKind::Orbit
    }
}

/// Always reports the same viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Still {
    viewpoint: Viewpoint,
}

impl Still {
    pub fn new(viewpoint: Viewpoint) -> Self {
        Self { viewpoint }
    }
}

impl ViewpointSource for Still {
    fn reset(&mut self) {}

    fn sample(&mut self) -> Viewpoint {
        self.viewpoint
    }

    fn kind(&self) -> MotionKind {
        MotionKind::Still
    }
}

/// Drifts towards random pointer targets drawn from a seeded generator.
#[derive(Debug, Clone)]
pub struct Wander {
    seed: u64,
    rng: StdRng,
    target: Vec2,
    frame: u64,
    smoother: PointerSmoother,
}

impl Wander {
    pub fn new(seed: u64, sensitivity: f32) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            target: Vec2::ZERO,
            frame: 0,
            smoother: PointerSmoother::new(sensitivity),
        }
    }

    fn retarget(&mut self) {
        self.target = Vec2::new(
            self.rng.gen_range(-0.5..=0.5),
            self.rng.gen_range(-0.5..=0.5),
        );
    }
}

impl ViewpointSource for Wander {
    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.target = Vec2::ZERO;
        self.frame = 0;
        self.smoother.reset();
    }

    fn sample(&mut self) -> Viewpoint {
        if self.frame % WANDER_HOLD == 0 {
            self.retarget();
        }
        self.frame = self.frame.saturating_add(1);
        self.smoother.step(self.target)
    }

    fn set_sensitivity(&mut self, sensitivity: f32) {
        self.smoother.set_sensitivity(sensitivity);
    }

    fn kind(&self) -> MotionKind {
        MotionKind::Wander
    }
}

/// Motion settings with every default filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    pub kind: MotionKind,
    pub sensitivity: f32,
    pub frame_interval: Duration,
    pub from: f32,
    pub to: f32,
    pub lift: f32,
    pub period: Duration,
    pub radius: f32,
    pub seed: u64,
    pub viewpoint: Viewpoint,
}

impl Default for MotionPlan {
    fn default() -> Self {
        Self {
            kind: MotionKind::Sweep,
            sensitivity: 1.0,
            frame_interval: Duration::from_secs_f64(1.0 / 30.0),
            from: -1.0,
            to: 1.0,
            lift: DEFAULT_LIFT,
            period: DEFAULT_PERIOD,
            radius: 1.0,
            seed: 0,
            viewpoint: Viewpoint::ZERO,
        }
    }
}

impl MotionPlan {
    pub fn from_section(section: &MotionSection) -> Self {
        let defaults = Self::default();
        Self {
            kind: section.kind.unwrap_or(defaults.kind),
            sensitivity: section.sensitivity.unwrap_or(defaults.sensitivity),
            frame_interval: section.frame_interval.unwrap_or(defaults.frame_interval),
            from: section.from.unwrap_or(defaults.from),
            to: section.to.unwrap_or(defaults.to),
            lift: section.lift.unwrap_or(defaults.lift),
            period: section.period.unwrap_or(defaults.period),
            radius: section.radius.unwrap_or(defaults.radius),
            seed: section.seed.unwrap_or(defaults.seed),
            viewpoint: section
                .viewpoint
                .map(|[x, y]| Viewpoint::new(x, y))
                .unwrap_or(defaults.viewpoint),
        }
    }

    /// Builds the source for a run of `frames` frames.
    pub fn build(&self, frames: u32) -> Result<BoxedViewpointSource, MotionError> {
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(MotionError::Sensitivity(self.sensitivity));
        }
        debug!(kind = self.kind.as_str(), frames, "building viewpoint source");
        let source: BoxedViewpointSource = match self.kind {
            MotionKind::Sweep => {
                if !(self.from.is_finite() && self.to.is_finite() && self.lift.is_finite()) {
                    return Err(MotionError::NonFinite("sweep range"));
                }
                Box::new(Sweep::new(self.from, self.to, self.lift, frames))
            }
            MotionKind::Orbit => Box::new(Orbit::new(
                self.period,
                self.radius,
                self.frame_interval,
                self.sensitivity,
            )?),
            MotionKind::Still => {
                if !self.viewpoint.vector().is_finite() {
                    return Err(MotionError::NonFinite("viewpoint"));
                }
                Box::new(Still::new(self.viewpoint))
            }
            MotionKind::Wander => Box::new(Wander::new(self.seed, self.sensitivity)),
        };
        Ok(source)
    }
}

/// Shorthand for `MotionPlan::from_section(section).build(frames)`.
pub fn source_from_config(
    section: &MotionSection,
    frames: u32,
) -> Result<BoxedViewpointSource, MotionError> {
    MotionPlan::from_section(section).build(frames)
}

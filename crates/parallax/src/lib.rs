//! Depth-based parallax renderer for depthwall.
//!
//! The crate turns a color image plus a matching depth map into a warped
//! frame that looks as if the viewer moved slightly. The overall flow is:
//!
//! ```text
//!   depthwall / caller
//!          │ Viewpoint
//!          ▼
//!   FrameDriver::update ──▶ ReprojectionVectors (once per frame)
//!          │                              │
//!          └─▶ render_frame() ─▶ rows in parallel ─▶ PixelEvaluator
//!                                                      │
//!                       DepthSampler ◀── reproject() ──┘
//!                                           │
//!                                  ColorResolver ─▶ FrameBuffer ─▶ FrameSink
//! ```
//!
//! `FrameDriver` owns every piece of mutable state (active color/depth pair,
//! sensitivity, frame counter) and only mutates it between frames. The kernel
//! itself is a pure function over borrowed images and an explicit parameter
//! struct, so any number of rows can be evaluated at once.

mod driver;
mod error;
mod frame;
mod kernel;
mod loader;
mod resolver;
mod sampler;
mod sink;
mod source;
mod texture;
mod types;

pub use driver::{DriverConfig, FrameDriver, PropertyReport};
pub use error::{LoadError, ParamsError};
pub use frame::{evaluate_pixel, kernel_position, render_frame, PixelEvaluator, PixelSample};
pub use kernel::{reproject, reproject_with, Reprojection, ReprojectionVectors, SampleStep};
pub use loader::{AsyncLoader, LoadOutcome, LoadedSource};
pub use resolver::ColorResolver;
pub use sampler::{DepthLookup, DepthSampler};
pub use sink::{export_png, FrameSink, MemorySink, PngSequenceSink};
pub use source::{
    load_with_fallback, ColorSource, DefaultSources, DepthSource, FsLoader, SceneProperties,
    Slot, Source, SourceKind, SourceRequest, TextureLoader,
};
pub use texture::{ColorImage, DepthImage, FrameBuffer};
pub use types::{
    DepthBand, KernelParams, ProjectionSettings, Viewpoint, AA_TRIGGER, CONFIDENCE_MAX,
    DEFAULT_COMPRESSION, DEFAULT_UPSCALE, FAR_COEFFICIENT, MAX_STEPS, NEAR_COEFFICIENT,
    VIEWPOINT_SCALE,
};

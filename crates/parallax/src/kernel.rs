//! Depth-image reprojection walk.
//!
//! There is no closed-form inverse from an output pixel to the source pixel
//! it shows, because the answer depends on the unknown depth at that pixel.
//! The kernel therefore walks a bounded number of candidates along the line
//! from the far endpoint to the near endpoint, lowering a depth threshold in
//! lockstep. Every candidate that sits in front of the surface contributes
//! its (intersection-corrected) position to a confidence-weighted average.
//!
//! The first hit on a straight walk triggers a half-step retry, which samples
//! once more just behind the boundary and softens depth discontinuities.

use glam::Vec2;

use crate::sampler::DepthLookup;
use crate::types::{KernelParams, ProjectionSettings, Viewpoint, MAX_STEPS};

/// Slack granted to the surface test so a threshold equal to the depth hits.
const SURFACE_EPSILON: f32 = 0.001;

/// Endpoints of the reprojection line, shared by every pixel of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReprojectionVectors {
    pub near: Vec2,
    pub far: Vec2,
}

impl ReprojectionVectors {
    pub fn from_viewpoint(viewpoint: Viewpoint, projection: &ProjectionSettings) -> Self {
        let mouse = viewpoint.vector();
        let near = ((0.5 - projection.near_coefficient) * mouse - mouse / 2.0) * projection.scale;
        let far = ((0.5 - projection.far_coefficient) * mouse + mouse / 2.0) * projection.scale;
        Self { near, far }
    }

    /// Applies the perspective skew for one pixel; a no-op when disabled.
    pub fn for_position(&self, pos: Vec2, perspective: f32) -> Self {
        if perspective == 0.0 {
            return *self;
        }
        Self {
            near: self.near,
            far: self.far + (2.0 * pos - Vec2::ONE) * perspective,
        }
    }
}

/// One candidate of the walk. Only lives for a single pixel evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStep {
    pub iteration: u32,
    /// Fractional walk cursor `j` at the time of the sample.
    pub cursor: f32,
    pub position: Vec2,
    pub threshold: f32,
    pub depth: f32,
    pub confidence: f32,
}

/// Outcome of one pixel's walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reprojection {
    /// Source coordinate in kernel orientation (y grows downwards).
    pub coord: Vec2,
    pub confidence: f32,
    /// Candidates whose depth was actually sampled.
    pub evaluated: u32,
    /// No candidate reached the surface and `coord` is the first candidate.
    pub fallback: bool,
}

pub fn reproject<D>(
    pos: Vec2,
    vectors: &ReprojectionVectors,
    params: &KernelParams,
    depth: &D,
) -> Reprojection
where
    D: DepthLookup + ?Sized,
{
    reproject_with(pos, vectors, params, depth, |_| {})
}

/// Same as [`reproject`] but reports every evaluated candidate to `observe`.
pub fn reproject_with<D, F>(
    pos: Vec2,
    vectors: &ReprojectionVectors,
    params: &KernelParams,
    depth: &D,
    mut observe: F,
) -> Reprojection
where
    D: DepthLookup + ?Sized,
    F: FnMut(&SampleStep),
{
    let span = params.steps as f32 - 1.0;
    let dstep = params.compression / span;
    let vstep = (vectors.far - vectors.near) / span;
    let top = 0.5 + params.compression / 2.0;
    let cutoff = params.band().cutoff();

    let mut pos_sum = Vec2::ZERO;
    let mut confidence_sum = 0.0f32;
    let mut evaluated = 0u32;
    let mut j = 0.0f32;

    for i in 0..params.max_steps.min(MAX_STEPS) {
        let vpos = pos + vectors.far - j * vstep;
        let dpos = top - j * dstep;
        if dpos < cutoff || confidence_sum >= params.confidence_max {
            continue;
        }

        let surface = depth.depth_at(vpos);
        evaluated += 1;
        let confidence = if dpos <= surface + SURFACE_EPSILON {
            1.0
        } else {
            0.0
        };

        observe(&SampleStep {
            iteration: i,
            cursor: j,
            position: vpos,
            threshold: dpos,
            depth: surface,
            confidence,
        });

        if params.anti_alias && confidence > params.aa_trigger && i as f32 == j {
            j -= 0.5;
        } else {
            j += 1.0;
        }

        if confidence > 0.0 {
            let hit = if params.correct {
                vpos + ((surface - dpos) / (dstep * params.correct_power)) * vstep
            } else {
                vpos
            };
            pos_sum += hit * confidence;
            confidence_sum += confidence;
        }
    }

    if confidence_sum > 0.0 {
        Reprojection {
            coord: pos_sum / confidence_sum,
            confidence: confidence_sum,
            evaluated,
            fallback: false,
        }
    } else {
        Reprojection {
            coord: pos + vectors.far,
            confidence: 0.0,
            evaluated,
            fallback: true,
        }
    }
}

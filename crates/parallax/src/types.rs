use glam::Vec2;

use crate::error::ParamsError;

/// Iteration budget of the reprojection walk.
pub const MAX_STEPS: u32 = 16;
/// Default depth compression; narrows the band to `[0.1, 0.9]`.
pub const DEFAULT_COMPRESSION: f32 = 0.8;
/// Accumulated confidence after which the walk stops contributing.
pub const CONFIDENCE_MAX: f32 = 2.5;
/// Confidence level that arms the half-step anti-alias retry.
pub const AA_TRIGGER: f32 = 0.8;
/// Slight zoom so displaced edges never expose the image border.
pub const DEFAULT_UPSCALE: f32 = 1.06;
/// Weight of the viewpoint on the near endpoint of the reprojection line.
pub const NEAR_COEFFICIENT: f32 = 0.99;
/// Weight of the viewpoint on the far endpoint of the reprojection line.
pub const FAR_COEFFICIENT: f32 = 0.015;
/// Scale applied to both endpoints; the y axis is mirrored.
pub const VIEWPOINT_SCALE: Vec2 = Vec2::new(1.5, -1.5);

const DEPTH_CUTOFF_MARGIN: f32 = 0.0001;

/// Simulated eye displacement for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewpoint(pub Vec2);

impl Viewpoint {
    pub const ZERO: Self = Self(Vec2::ZERO);

    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn vector(self) -> Vec2 {
        self.0
    }
}

impl From<Vec2> for Viewpoint {
    fn from(value: Vec2) -> Self {
        Self(value)
    }
}

/// Usable depth range, symmetric around 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBand {
    pub min: f32,
    pub max: f32,
}

impl DepthBand {
    pub fn from_compression(compression: f32) -> Self {
        Self {
            min: (1.0 - compression) / 2.0,
            max: (1.0 + compression) / 2.0,
        }
    }

    pub fn clamp(&self, depth: f32) -> f32 {
        depth.clamp(self.min, self.max)
    }

    /// Thresholds below this value no longer contribute to the walk.
    pub fn cutoff(&self) -> f32 {
        self.min - DEPTH_CUTOFF_MARGIN
    }
}

/// Tunables of the reprojection kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// Compression constant `C`; the depth band is `[(1-C)/2, (1+C)/2]`.
    pub compression: f32,
    /// Resolution of the sweep; `dstep` and `vstep` divide by `steps - 1`.
    pub steps: u32,
    /// Hard cap on loop iterations.
    pub max_steps: u32,
    /// Confidence total at which the walk stops accumulating.
    pub confidence_max: f32,
    /// Enables the half-step retry at the first surface hit.
    pub anti_alias: bool,
    pub aa_trigger: f32,
    /// Nudges each hit toward the interpolated surface intersection.
    pub correct: bool,
    pub correct_power: f32,
}

impl KernelParams {
    pub fn band(&self) -> DepthBand {
        DepthBand::from_compression(self.compression)
    }

    /// Per-iteration decrement of the depth threshold.
    pub fn depth_step(&self) -> f32 {
        self.compression / (self.steps as f32 - 1.0)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.compression > 0.0 && self.compression <= 1.0) {
            return Err(ParamsError::Compression(self.compression));
        }
        if self.steps < 2 {
            return Err(ParamsError::Steps(self.steps));
        }
        if self.max_steps == 0 || self.max_steps > MAX_STEPS {
            return Err(ParamsError::MaxSteps(self.max_steps));
        }
        if !(self.confidence_max > 0.0) {
            return Err(ParamsError::ConfidenceMax(self.confidence_max));
        }
        if !(self.correct_power > 0.0) {
            return Err(ParamsError::CorrectPower(self.correct_power));
        }
        Ok(())
    }
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            compression: DEFAULT_COMPRESSION,
            steps: MAX_STEPS,
            max_steps: MAX_STEPS,
            confidence_max: CONFIDENCE_MAX,
            anti_alias: true,
            aa_trigger: AA_TRIGGER,
            correct: true,
            correct_power: 1.0,
        }
    }
}

/// How output pixels and viewpoints map into kernel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    /// Zoom factor around the image centre; 1.0 disables it.
    pub upscale: f32,
    /// Per-pixel skew of the far endpoint; 0.0 disables it.
    pub perspective: f32,
    pub near_coefficient: f32,
    pub far_coefficient: f32,
    pub scale: Vec2,
}

impl ProjectionSettings {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.upscale > 0.0) {
            return Err(ParamsError::Upscale(self.upscale));
        }
        if !self.perspective.is_finite() {
            return Err(ParamsError::Perspective(self.perspective));
        }
        Ok(())
    }
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            upscale: DEFAULT_UPSCALE,
            perspective: 0.0,
            near_coefficient: NEAR_COEFFICIENT,
            far_coefficient: FAR_COEFFICIENT,
            scale: VIEWPOINT_SCALE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_band_matches_compression() {
        let band = KernelParams::default().band();
        assert!((band.min - 0.1).abs() < 1e-6);
        assert!((band.max - 0.9).abs() < 1e-6);
    }

    #[test]
    fn band_clamps_extremes() {
        let band = DepthBand::from_compression(0.8);
        assert_eq!(band.clamp(0.0), band.min);
        assert_eq!(band.clamp(1.0), band.max);
        assert_eq!(band.clamp(0.5), 0.5);
    }

    #[test]
    fn rejects_degenerate_params() {
        let mut params = KernelParams::default();
        params.steps = 1;
        assert!(matches!(params.validate(), Err(ParamsError::Steps(1))));

        let mut params = KernelParams::default();
        params.compression = 0.0;
        assert!(matches!(params.validate(), Err(ParamsError::Compression(_))));

        let mut params = KernelParams::default();
        params.max_steps = MAX_STEPS + 1;
        assert!(matches!(params.validate(), Err(ParamsError::MaxSteps(17))));

        let projection = ProjectionSettings {
            upscale: 0.0,
            ..ProjectionSettings::default()
        };
        assert!(projection.validate().is_err());
    }
}

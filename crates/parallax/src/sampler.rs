use glam::Vec2;

use crate::texture::DepthImage;
use crate::types::DepthBand;

/// Source of clamped surface heights for the reprojection walk.
///
/// Implementations return "height toward the camera" already clamped into
/// the kernel's depth band, for a coordinate in kernel orientation.
pub trait DepthLookup: Sync {
    fn depth_at(&self, coord: Vec2) -> f32;
}

/// Reads a depth map authored as "distance from camera" with an inverted
/// vertical axis.
#[derive(Debug, Clone, Copy)]
pub struct DepthSampler<'a> {
    image: &'a DepthImage,
    band: DepthBand,
}

impl<'a> DepthSampler<'a> {
    pub fn new(image: &'a DepthImage, band: DepthBand) -> Self {
        Self { image, band }
    }

    pub fn band(&self) -> DepthBand {
        self.band
    }
}

impl DepthLookup for DepthSampler<'_> {
    fn depth_at(&self, coord: Vec2) -> f32 {
        let raw = self.image.sample(Vec2::new(coord.x, 1.0 - coord.y));
        self.band.clamp(1.0 - raw)
    }
}

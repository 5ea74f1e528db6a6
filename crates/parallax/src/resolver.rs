use glam::Vec2;

use crate::texture::ColorImage;

/// Reads the final color for a reprojected coordinate.
#[derive(Debug, Clone, Copy)]
pub struct ColorResolver<'a> {
    image: &'a ColorImage,
}

impl<'a> ColorResolver<'a> {
    pub fn new(image: &'a ColorImage) -> Self {
        Self { image }
    }

    /// `coord` is in kernel orientation; the color image is authored with
    /// the opposite vertical axis.
    pub fn resolve(&self, coord: Vec2) -> [f32; 4] {
        self.image.sample(Vec2::new(coord.x, 1.0 - coord.y))
    }
}

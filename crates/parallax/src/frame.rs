use glam::Vec2;
use image::RgbaImage;
use rayon::prelude::*;

use crate::kernel::{reproject, Reprojection, ReprojectionVectors};
use crate::resolver::ColorResolver;
use crate::sampler::DepthSampler;
use crate::texture::{quantize, ColorImage, DepthImage, FrameBuffer};
use crate::types::{KernelParams, ProjectionSettings, Viewpoint};

/// Maps a texture-space output coordinate (`v` up) into kernel space
/// (`y` down), zooming around the centre by `upscale`.
pub fn kernel_position(uv: Vec2, upscale: f32) -> Vec2 {
    Vec2::new(uv.x - 0.5, 0.5 - uv.y) / upscale + Vec2::splat(0.5)
}

/// Color plus the walk that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub color: [f32; 4],
    pub reprojection: Reprojection,
}

/// Everything one pixel evaluation reads, borrowed for a whole frame.
#[derive(Debug, Clone, Copy)]
pub struct PixelEvaluator<'a> {
    sampler: DepthSampler<'a>,
    resolver: ColorResolver<'a>,
    vectors: ReprojectionVectors,
    params: &'a KernelParams,
    projection: &'a ProjectionSettings,
}

impl<'a> PixelEvaluator<'a> {
    pub fn new(
        color: &'a ColorImage,
        depth: &'a DepthImage,
        vectors: ReprojectionVectors,
        params: &'a KernelParams,
        projection: &'a ProjectionSettings,
    ) -> Self {
        Self {
            sampler: DepthSampler::new(depth, params.band()),
            resolver: ColorResolver::new(color),
            vectors,
            params,
            projection,
        }
    }

    pub fn evaluate(&self, uv: Vec2) -> PixelSample {
        let pos = kernel_position(uv, self.projection.upscale);
        let vectors = self.vectors.for_position(pos, self.projection.perspective);
        let reprojection = reproject(pos, &vectors, self.params, &self.sampler);
        PixelSample {
            color: self.resolver.resolve(reprojection.coord),
            reprojection,
        }
    }
}

/// Evaluates a single output pixel at texture coordinate `uv`.
pub fn evaluate_pixel(
    uv: Vec2,
    color: &ColorImage,
    depth: &DepthImage,
    vectors: &ReprojectionVectors,
    params: &KernelParams,
    projection: &ProjectionSettings,
) -> [f32; 4] {
    PixelEvaluator::new(color, depth, *vectors, params, projection)
        .evaluate(uv)
        .color
}

/// Renders a full frame. The reprojection endpoints are derived once from
/// `viewpoint`; rows are evaluated in parallel on the current rayon pool.
pub fn render_frame(
    color: &ColorImage,
    depth: &DepthImage,
    viewpoint: Viewpoint,
    size: (u32, u32),
    params: &KernelParams,
    projection: &ProjectionSettings,
    index: u64,
) -> FrameBuffer {
    let (width, height) = size;
    let vectors = ReprojectionVectors::from_viewpoint(viewpoint, projection);
    let evaluator = PixelEvaluator::new(color, depth, vectors, params, projection);

    let mut image = RgbaImage::new(width, height);
    let row_len = width as usize * 4;
    let fallback_pixels = if row_len == 0 {
        0
    } else {
        let buffer: &mut [u8] = &mut image;
        buffer
            .par_chunks_mut(row_len)
            .enumerate()
            .map(|(row, pixels)| {
                let v = 1.0 - (row as f32 + 0.5) / height as f32;
                let mut fallbacks = 0usize;
                for (column, texel) in pixels.chunks_exact_mut(4).enumerate() {
                    let u = (column as f32 + 0.5) / width as f32;
                    let sample = evaluator.evaluate(Vec2::new(u, v));
                    if sample.reprojection.fallback {
                        fallbacks += 1;
                    }
                    texel.copy_from_slice(&quantize(sample.color));
                }
                fallbacks
            })
            .sum()
    };

    FrameBuffer::new(index, image, fallback_pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_projection() -> ProjectionSettings {
        ProjectionSettings {
            upscale: 1.0,
            ..ProjectionSettings::default()
        }
    }

    #[test]
    fn kernel_position_flips_and_zooms() {
        let pos = kernel_position(Vec2::new(0.25, 0.75), 1.0);
        assert!((pos - Vec2::new(0.25, 0.25)).length() < 1e-6);

        let zoomed = kernel_position(Vec2::new(1.0, 0.0), 2.0);
        assert!((zoomed - Vec2::new(0.75, 0.75)).length() < 1e-6);
        assert_eq!(kernel_position(Vec2::splat(0.5), 1.06), Vec2::splat(0.5));
    }

    #[test]
    fn zero_viewpoint_reproduces_source() {
        let color = ColorImage::from_fn(4, 3, |x, y| {
            [x as f32 / 3.0, y as f32 / 2.0, 0.5, 1.0]
        });
        let depth = DepthImage::from_fn(4, 3, |x, y| ((x + y) % 3) as f32 / 2.0);
        let params = KernelParams::default();
        let frame = render_frame(
            &color,
            &depth,
            Viewpoint::ZERO,
            (4, 3),
            &params,
            &flat_projection(),
            0,
        );
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(
                    frame.image().get_pixel(x, y).0,
                    quantize(color.texel(x, y)),
                    "pixel ({x}, {y})"
                );
            }
        }
        assert_eq!(frame.fallback_pixels(), 0);
    }

    #[test]
    fn evaluate_pixel_matches_frame_output() {
        let color = ColorImage::from_fn(8, 8, |x, _| [x as f32 / 7.0, 0.0, 0.0, 1.0]);
        let depth = DepthImage::from_fn(8, 8, |x, _| if x < 4 { 0.1 } else { 0.9 });
        let params = KernelParams::default();
        let projection = ProjectionSettings::default();
        let viewpoint = Viewpoint::new(0.02, -0.004);
        let frame = render_frame(&color, &depth, viewpoint, (8, 8), &params, &projection, 3);

        let vectors = ReprojectionVectors::from_viewpoint(viewpoint, &projection);
        let uv = Vec2::new(3.5 / 8.0, 1.0 - 5.5 / 8.0);
        let single = evaluate_pixel(uv, &color, &depth, &vectors, &params, &projection);
        assert_eq!(frame.image().get_pixel(3, 5).0, quantize(single));
        assert_eq!(frame.index(), 3);
    }

    #[test]
    fn empty_frame_renders_nothing() {
        let color = ColorImage::placeholder();
        let depth = DepthImage::placeholder();
        let frame = render_frame(
            &color,
            &depth,
            Viewpoint::ZERO,
            (0, 0),
            &KernelParams::default(),
            &ProjectionSettings::default(),
            0,
        );
        assert_eq!(frame.dimensions(), (0, 0));
    }
}

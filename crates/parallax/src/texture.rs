//! CPU-side textures sampled by the kernel.
//!
//! Both image types store rows top-down (as decoded) but are addressed in
//! texture space: `u` grows to the right and `v` grows upwards, so `v = 0`
//! reads the bottom row. Sampling is bilinear between texel centres with
//! clamp-to-edge addressing, matching a linear GPU sampler.

use glam::Vec2;
use image::{DynamicImage, RgbaImage};

/// Placeholder depth that sits in the middle of every band.
const PLACEHOLDER_DEPTH: f32 = 0.5;

/// Immutable RGBA texture with channels normalised to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl ColorImage {
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let texels = rgba.pixels().map(|pixel| pixel.0).collect();
        Self {
            width,
            height,
            texels,
        }
    }

    /// Builds an image from a per-texel closure; `(x, y)` has row 0 at the top.
    pub fn from_fn(width: u32, height: u32, mut texel: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(texel(x, y));
            }
        }
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn solid(width: u32, height: u32, rgba: [f32; 4]) -> Self {
        Self::from_fn(width, height, |_, _| rgba)
    }

    /// 1x1 white stand-in used until a real source is loaded.
    pub fn placeholder() -> Self {
        Self::solid(1, 1, [1.0, 1.0, 1.0, 1.0])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear lookup; an empty texture reads as transparent black.
    pub fn sample(&self, uv: Vec2) -> [f32; 4] {
        let Some(taps) = bilinear_taps(self.width, self.height, uv) else {
            return [0.0; 4];
        };
        let mut out = [0.0f32; 4];
        for (index, weight) in taps {
            let texel = self.texels[index];
            for (channel, value) in out.iter_mut().zip(texel) {
                *channel += value * weight;
            }
        }
        out
    }
}

/// Immutable single-channel depth texture with samples in `[0, 1]`.
///
/// Only the red channel of the decoded image is kept, matching how the
/// depth maps are authored (grey or red-encoded distance from camera).
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl DepthImage {
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let samples = rgba.pixels().map(|pixel| pixel.0[0]).collect();
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn from_fn(width: u32, height: u32, mut sample: impl FnMut(u32, u32) -> f32) -> Self {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(sample(x, y));
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn constant(width: u32, height: u32, value: f32) -> Self {
        Self::from_fn(width, height, |_, _| value)
    }

    pub fn placeholder() -> Self {
        Self::constant(1, 1, PLACEHOLDER_DEPTH)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texel(&self, x: u32, y: u32) -> f32 {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    pub fn sample(&self, uv: Vec2) -> f32 {
        bilinear_taps(self.width, self.height, uv)
            .map(|taps| {
                taps.into_iter()
                    .map(|(index, weight)| self.samples[index] * weight)
                    .sum::<f32>()
            })
            .unwrap_or(0.0)
    }
}

/// Texel indices and weights for a bilinear lookup at `uv`, or `None` when
/// the texture has no texels.
fn bilinear_taps(width: u32, height: u32, uv: Vec2) -> Option<[(usize, f32); 4]> {
    if width == 0 || height == 0 {
        return None;
    }
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;

    // Texel centres sit at half-integer positions; rows are stored top-down.
    let x = (uv.x * width as f32 - 0.5).clamp(0.0, max_x);
    let y = ((1.0 - uv.y) * height as f32 - 0.5).clamp(0.0, max_y);
    // NaN coordinates survive `clamp`; pin them to the first texel.
    let x = if x.is_nan() { 0.0 } else { x };
    let y = if y.is_nan() { 0.0 } else { y };

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let x1 = (x0 + 1).min(width as usize - 1);
    let y1 = (y0 + 1).min(height as usize - 1);

    let row = width as usize;
    Some([
        (y0 * row + x0, (1.0 - fx) * (1.0 - fy)),
        (y0 * row + x1, fx * (1.0 - fy)),
        (y1 * row + x0, (1.0 - fx) * fy),
        (y1 * row + x1, fx * fy),
    ])
}

/// A rendered frame, ready for a sink.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    index: u64,
    image: RgbaImage,
    fallback_pixels: usize,
}

impl FrameBuffer {
    pub(crate) fn new(index: u64, image: RgbaImage, fallback_pixels: usize) -> Self {
        Self {
            index,
            image,
            fallback_pixels,
        }
    }

    /// Position of the frame in the driver's sequence, starting at zero.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixels whose walk never reached the depth surface.
    pub fn fallback_pixels(&self) -> usize {
        self.fallback_pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

pub(crate) fn quantize(rgba: [f32; 4]) -> [u8; 4] {
    rgba.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}

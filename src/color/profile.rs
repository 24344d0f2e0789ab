//! Mean-color signatures and color similarity
//!
//! Signatures are sampled rather than computed over every pixel: a region is
//! summarised by every Nth pixel, a reference tile by a regular lattice.

use image::RgbaImage;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::constants::color::{SAMPLE_STRIDE, SIMILARITY_SCALE};

/// Mean RGB of a sampled region, each channel in [0, 255]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSignature {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSignature {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels
    pub fn brightness(&self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }

    fn from_sums(r: u64, g: u64, b: u64, count: u64) -> Self {
        if count == 0 {
            return Self::default();
        }
        let mean = |sum: u64| (sum as f64 / count as f64).round() as u8;
        Self::new(mean(r), mean(g), mean(b))
    }
}

impl From<ColorSignature> for Srgb<u8> {
    fn from(sig: ColorSignature) -> Self {
        Srgb::new(sig.r, sig.g, sig.b)
    }
}

impl From<Srgb<u8>> for ColorSignature {
    fn from(color: Srgb<u8>) -> Self {
        Self::new(color.red, color.green, color.blue)
    }
}

/// Computes region signatures by stride sampling
#[derive(Debug, Clone)]
pub struct ColorProfiler {
    stride: usize,
}

impl Default for ColorProfiler {
    fn default() -> Self {
        Self::new(SAMPLE_STRIDE)
    }
}

impl ColorProfiler {
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
        }
    }

    /// Average every `stride`-th pixel of `pixels`
    ///
    /// An empty buffer yields black.
    pub fn profile(&self, pixels: &RgbaImage) -> ColorSignature {
        let (mut r, mut g, mut b, mut count) = (0u64, 0u64, 0u64, 0u64);
        for px in pixels.as_raw().chunks_exact(4).step_by(self.stride) {
            r += px[0] as u64;
            g += px[1] as u64;
            b += px[2] as u64;
            count += 1;
        }
        ColorSignature::from_sums(r, g, b, count)
    }
}

/// Signature of a `size`x`size` tile sampled on a `step` lattice
///
/// Lattice points outside the image are skipped, so tiles at the border are
/// averaged over the pixels that exist.
pub fn tile_signature(image: &RgbaImage, x: u32, y: u32, size: u32, step: u32) -> ColorSignature {
    let step = step.max(1) as usize;
    let (mut r, mut g, mut b, mut count) = (0u64, 0u64, 0u64, 0u64);
    for dy in (0..size).step_by(step) {
        for dx in (0..size).step_by(step) {
            let (px, py) = (x + dx, y + dy);
            if px >= image.width() || py >= image.height() {
                continue;
            }
            let p = image.get_pixel(px, py);
            r += p[0] as u64;
            g += p[1] as u64;
            b += p[2] as u64;
            count += 1;
        }
    }
    ColorSignature::from_sums(r, g, b, count)
}

/// Mean luminance `(R+G+B)/3` over every pixel; 0 for an empty buffer
pub fn mean_brightness(pixels: &RgbaImage) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for px in pixels.as_raw().chunks_exact(4) {
        total += (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Linear color similarity in [0, 100]
///
/// 100 for identical signatures, 0 when every channel differs by 255.
pub fn color_similarity(a: ColorSignature, b: ColorSignature) -> f32 {
    let diff = (a.r as i32 - b.r as i32).abs()
        + (a.g as i32 - b.g as i32).abs()
        + (a.b as i32 - b.b as i32).abs();
    (100.0 - diff as f32 / SIMILARITY_SCALE).max(0.0)
}

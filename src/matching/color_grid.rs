//! Exhaustive color search over reference tiles
//!
//! The reference is cut into non-overlapping `tile_size` tiles. Each tile is
//! scored by color similarity to the piece signature, and the best tile's
//! origin is the suggested position.

use image::RgbaImage;

use super::{MatchOutcome, MatchPosition, Reference, ReferenceMatcher};
use crate::color::{color_similarity, tile_signature, ColorSignature};
use crate::config::MatchingConfig;

#[derive(Debug, Clone)]
pub struct ColorGridMatcher {
    tile_size: u32,
    sample_step: u32,
}

impl Default for ColorGridMatcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl ColorGridMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            tile_size: config.tile_size.max(1),
            sample_step: config.tile_sample_step.max(1),
        }
    }

    /// Best tile for `signature`; ties keep the first tile in row-major order
    pub fn search(&self, signature: ColorSignature, reference: &RgbaImage) -> MatchOutcome {
        let size = self.tile_size;
        let (w, h) = reference.dimensions();
        let mut best = MatchOutcome::none();
        if w < size || h < size {
            return best;
        }

        for y in (0..=h - size).step_by(size as usize) {
            for x in (0..=w - size).step_by(size as usize) {
                let tile = tile_signature(reference, x, y, size, self.sample_step);
                let similarity = color_similarity(signature, tile);
                if similarity > best.confidence {
                    best = MatchOutcome {
                        position: Some(MatchPosition { x, y }),
                        confidence: similarity,
                    };
                }
            }
        }
        best
    }
}

impl ReferenceMatcher for ColorGridMatcher {
    fn name(&self) -> &'static str {
        "color-grid"
    }

    fn find_match(&self, _piece: &RgbaImage, signature: ColorSignature, reference: &Reference) -> MatchOutcome {
        self.search(signature, reference.image())
    }
}

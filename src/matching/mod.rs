//! Reference matching module
//!
//! Estimates where a piece belongs in the reference image. Two strategies
//! share the [`ReferenceMatcher`] interface:
//! - [`FeatureMatcher`]: keypoint matching against the cached reference features
//! - [`ColorGridMatcher`]: mean-color search over reference tiles, always available

pub mod reference;
pub mod color_grid;
pub mod feature;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use reference::Reference;
pub use color_grid::ColorGridMatcher;
pub use feature::FeatureMatcher;

use crate::color::ColorSignature;
use crate::config::MatchingConfig;
use crate::vision::VisionBackend;

/// Pixel position in reference-image space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPosition {
    pub x: u32,
    pub y: u32,
}

/// Suggested placement and its confidence (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub position: Option<MatchPosition>,
    pub confidence: f32,
}

impl MatchOutcome {
    /// No placement, zero confidence
    pub fn none() -> Self {
        Self {
            position: None,
            confidence: 0.0,
        }
    }
}

pub trait ReferenceMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Never fails; strategies handle their own errors
    fn find_match(&self, piece: &RgbaImage, signature: ColorSignature, reference: &Reference) -> MatchOutcome;
}

/// Feature matching when a backend is available, color matching otherwise
pub fn select_matcher(backend: Option<Arc<dyn VisionBackend>>, config: &MatchingConfig) -> Box<dyn ReferenceMatcher> {
    match backend {
        Some(backend) => Box::new(FeatureMatcher::new(backend, config)),
        None => Box::new(ColorGridMatcher::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::fake::MarkerBackend;

    #[test]
    fn test_select_matcher() {
        let config = MatchingConfig::default();
        assert_eq!(select_matcher(None, &config).name(), "color-grid");
        assert_eq!(select_matcher(Some(Arc::new(MarkerBackend::new())), &config).name(), "feature");
    }
}

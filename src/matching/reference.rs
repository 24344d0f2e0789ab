//! Reference image with its cached feature set
//!
//! Features are extracted once when the reference is built. Loading a new
//! reference means building a new `Reference`; nothing from the previous one
//! is reused, and each build gets a fresh generation number.

use image::RgbaImage;
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::image_loader::to_gray;
use crate::vision::{FeatureSet, VisionBackend};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Completed-puzzle picture used for placement suggestions
#[derive(Debug, Clone)]
pub struct Reference {
    image: RgbaImage,
    features: Option<FeatureSet>,
    generation: u64,
}

impl Reference {
    /// Wrap `image` and extract up to `max_features` keypoints with `backend`
    ///
    /// A missing backend or a failed extraction leaves the reference without
    /// features; feature matching then falls back to color matching.
    pub fn new(image: RgbaImage, backend: Option<&dyn VisionBackend>, max_features: u32) -> Self {
        let features = backend.and_then(|backend| {
            match backend.detect_and_compute(&to_gray(&image), max_features) {
                Ok(features) => {
                    info!("Processed reference image: {} keypoints found", features.len());
                    Some(features)
                }
                Err(e) => {
                    warn!("Reference feature extraction failed: {}", e);
                    None
                }
            }
        });

        Self {
            image,
            features,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Reference for color matching only
    pub fn without_features(image: RgbaImage) -> Self {
        Self::new(image, None, 0)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Cached features; `None` when no capability was available
    pub fn features(&self) -> Option<&FeatureSet> {
        self.features.as_ref().filter(|f| !f.is_empty())
    }

    pub fn keypoint_count(&self) -> usize {
        self.features.as_ref().map_or(0, FeatureSet::len)
    }

    /// Unique per loaded reference
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::fake::MarkerBackend;
    use image::Rgba;

    fn with_markers(markers: &[(u32, u32, u8)]) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        for &(x, y, v) in markers {
            image.put_pixel(x, y, Rgba([v, v, v, 255]));
        }
        image
    }

    #[test]
    fn test_features_extracted_once() {
        let backend = MarkerBackend::new();
        let reference = Reference::new(with_markers(&[(10, 10, 101), (20, 30, 103)]), Some(&backend), 2000);

        assert_eq!(reference.keypoint_count(), 2);
        assert_eq!(backend.detect_calls.load(Ordering::SeqCst), 1);
        let features = reference.features().unwrap();
        assert_eq!(features.keypoints[1].x, 20.0);
        assert_eq!(features.descriptors[1], vec![103]);
    }

    #[test]
    fn test_failed_extraction_leaves_no_features() {
        let backend = MarkerBackend::new().failing_features();
        let reference = Reference::new(with_markers(&[(10, 10, 101)]), Some(&backend), 2000);
        assert!(reference.features().is_none());
        assert_eq!(reference.keypoint_count(), 0);
    }

    #[test]
    fn test_generation_is_unique() {
        let a = Reference::without_features(with_markers(&[]));
        let b = Reference::without_features(with_markers(&[]));
        assert_ne!(a.generation(), b.generation());
        assert!(a.features().is_none());
        assert_eq!((a.width(), a.height()), (100, 100));
    }
}

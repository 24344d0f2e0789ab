//! Keypoint-based placement
//!
//! Piece descriptors are matched against the reference's cached descriptors.
//! The best matches, sorted by distance, are averaged on the reference side
//! to give a position. Confidence blends color similarity around that
//! position with the amount of match evidence.
//!
//! Any failure (missing reference features, backend error) falls back to the
//! color-grid search for that piece only.

use image::RgbaImage;
use log::{debug, warn};
use std::sync::Arc;

use super::{ColorGridMatcher, MatchOutcome, MatchPosition, Reference, ReferenceMatcher};
use crate::color::{color_similarity, tile_signature, ColorSignature};
use crate::config::MatchingConfig;
use crate::image_loader::to_gray;
use crate::vision::{DescriptorMatch, KeyPoint, VisionBackend};
use crate::{Result, ScanError};

/// Matches needed for 50% feature confidence
const MATCHES_PER_HALF_CONFIDENCE: f32 = 10.0;

/// Sort matches by ascending descriptor distance (stable)
pub fn sort_by_distance(matches: &mut [DescriptorMatch]) {
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Mean train-side keypoint location of `matches`
///
/// `None` for an empty slice; an error if a match points past `keypoints`.
pub fn average_train_position(matches: &[DescriptorMatch], keypoints: &[KeyPoint]) -> Result<Option<(f32, f32)>> {
    if matches.is_empty() {
        return Ok(None);
    }
    let (mut sum_x, mut sum_y) = (0.0f32, 0.0f32);
    for m in matches {
        let kp = keypoints.get(m.train_idx).ok_or_else(|| {
            ScanError::ProcessingError(format!(
                "Match references keypoint {} of {}",
                m.train_idx,
                keypoints.len()
            ))
        })?;
        sum_x += kp.x;
        sum_y += kp.y;
    }
    let n = matches.len() as f32;
    Ok(Some((sum_x / n, sum_y / n)))
}

pub struct FeatureMatcher {
    backend: Arc<dyn VisionBackend>,
    fallback: ColorGridMatcher,
    piece_features: u32,
    min_matches: usize,
    max_averaged: usize,
    color_weight: f32,
    feature_weight: f32,
    tile_size: u32,
    sample_step: u32,
}

impl FeatureMatcher {
    pub fn new(backend: Arc<dyn VisionBackend>, config: &MatchingConfig) -> Self {
        Self {
            backend,
            fallback: ColorGridMatcher::new(config),
            piece_features: config.piece_features,
            min_matches: config.min_feature_matches,
            max_averaged: config.max_averaged_matches.max(1),
            color_weight: config.color_weight,
            feature_weight: config.feature_weight,
            tile_size: config.tile_size.max(1),
            sample_step: config.tile_sample_step.max(1),
        }
    }

    fn try_match(&self, piece: &RgbaImage, signature: ColorSignature, reference: &Reference) -> Result<MatchOutcome> {
        let reference_features = reference
            .features()
            .ok_or_else(|| ScanError::capability("reference feature set"))?;

        let piece_features = self.backend.detect_and_compute(&to_gray(piece), self.piece_features)?;
        let mut matches = self
            .backend
            .match_descriptors(&piece_features.descriptors, &reference_features.descriptors)?;

        debug!("{} descriptor matches for piece", matches.len());
        if matches.len() < self.min_matches {
            return Ok(MatchOutcome::none());
        }

        sort_by_distance(&mut matches);
        let used = matches.len().min(self.max_averaged);
        let Some((avg_x, avg_y)) = average_train_position(&matches[..used], &reference_features.keypoints)? else {
            return Ok(MatchOutcome::none());
        };
        let position = MatchPosition {
            x: avg_x.round().max(0.0) as u32,
            y: avg_y.round().max(0.0) as u32,
        };

        let neighbourhood = self.neighbourhood_signature(reference.image(), position);
        let color_conf = color_similarity(signature, neighbourhood);
        let feature_conf = (matches.len() as f32 / MATCHES_PER_HALF_CONFIDENCE * 50.0).min(100.0);

        Ok(MatchOutcome {
            position: Some(position),
            confidence: (color_conf * self.color_weight + feature_conf * self.feature_weight).round(),
        })
    }

    /// Tile centred on `position`, shifted inside the image where possible
    fn neighbourhood_signature(&self, image: &RgbaImage, position: MatchPosition) -> ColorSignature {
        let half = self.tile_size / 2;
        let max_x = image.width().saturating_sub(self.tile_size);
        let max_y = image.height().saturating_sub(self.tile_size);
        let x = position.x.saturating_sub(half).min(max_x);
        let y = position.y.saturating_sub(half).min(max_y);
        tile_signature(image, x, y, self.tile_size, self.sample_step)
    }
}

impl ReferenceMatcher for FeatureMatcher {
    fn name(&self) -> &'static str {
        "feature"
    }

    fn find_match(&self, piece: &RgbaImage, signature: ColorSignature, reference: &Reference) -> MatchOutcome {
        match self.try_match(piece, signature, reference) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Feature matching failed, using color matching: {}", e);
                self.fallback.find_match(piece, signature, reference)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::fake::MarkerBackend;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLOCK: Rgba<u8> = Rgba([40, 40, 40, 255]);

    fn marker(v: u8) -> Rgba<u8> {
        Rgba([v, v, v, 255])
    }

    /// 200x200 reference with `count` markers in a row starting at (100, 100)
    fn reference_image(count: u8) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(200, 200, WHITE);
        for i in 0..count {
            image.put_pixel(100 + i as u32 * 2, 100, marker(101 + i * 2));
        }
        image
    }

    /// 40x40 dark piece carrying `count` of the same markers
    fn piece_image(count: u8) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(40, 40, BLOCK);
        for i in 0..count {
            image.put_pixel(5 + i as u32, 20, marker(101 + i * 2));
        }
        image
    }

    fn matcher(backend: MarkerBackend) -> FeatureMatcher {
        FeatureMatcher::new(Arc::new(backend), &MatchingConfig::default())
    }

    #[test]
    fn test_sort_by_distance() {
        let mut matches = vec![
            DescriptorMatch { query_idx: 0, train_idx: 0, distance: 9.0 },
            DescriptorMatch { query_idx: 1, train_idx: 1, distance: 1.0 },
            DescriptorMatch { query_idx: 2, train_idx: 2, distance: 4.0 },
        ];
        sort_by_distance(&mut matches);
        let order: Vec<_> = matches.iter().map(|m| m.query_idx).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_average_rejects_bad_index() {
        let matches = [DescriptorMatch { query_idx: 0, train_idx: 3, distance: 0.0 }];
        assert!(average_train_position(&matches, &[KeyPoint::new(1.0, 1.0)]).is_err());
        assert_eq!(average_train_position(&[], &[]).unwrap(), None);
    }

    #[test]
    fn test_position_is_mean_of_matched_keypoints() {
        let backend = MarkerBackend::new();
        let reference = Reference::new(reference_image(10), Some(&backend), 2000);
        let outcome = matcher(MarkerBackend::new()).find_match(
            &piece_image(10),
            ColorSignature::new(255, 255, 255),
            &reference,
        );

        // markers at x = 100, 102, ..., 118 → mean 109
        assert_eq!(outcome.position, Some(MatchPosition { x: 109, y: 100 }));
        // white neighbourhood (100%) * 0.4 + 10 matches (50%) * 0.6
        assert_eq!(outcome.confidence, 70.0);
    }

    #[test]
    fn test_too_few_matches_reports_nothing() {
        let backend = MarkerBackend::new();
        let reference = Reference::new(reference_image(10), Some(&backend), 2000);
        let outcome = matcher(MarkerBackend::new()).find_match(
            &piece_image(5),
            ColorSignature::new(40, 40, 40),
            &reference,
        );
        assert_eq!(outcome, MatchOutcome::none());
    }

    #[test]
    fn test_backend_failure_falls_back_to_color() {
        let backend = MarkerBackend::new();
        let mut image = reference_image(10);
        for y in 150..200 {
            for x in 0..50 {
                image.put_pixel(x, y, Rgba([200, 30, 30, 255]));
            }
        }
        let reference = Reference::new(image, Some(&backend), 2000);
        let outcome = matcher(MarkerBackend::new().failing_features()).find_match(
            &piece_image(10),
            ColorSignature::new(200, 30, 30),
            &reference,
        );
        assert_eq!(outcome.position, Some(MatchPosition { x: 0, y: 150 }));
        assert_eq!(outcome.confidence, 100.0);
    }

    #[test]
    fn test_missing_reference_features_fall_back() {
        let reference = Reference::without_features(RgbaImage::from_pixel(100, 100, BLOCK));
        let outcome = matcher(MarkerBackend::new()).find_match(
            &piece_image(10),
            ColorSignature::new(40, 40, 40),
            &reference,
        );
        assert_eq!(outcome.position, Some(MatchPosition { x: 0, y: 0 }));
        assert_eq!(outcome.confidence, 100.0);
    }
}

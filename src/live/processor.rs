//! Per-frame live matching
//!
//! Frames are downscaled to the processing width, segmented through the
//! vision capability and each surviving region is matched against the
//! reference's cached descriptors. There is no grid fallback here: without
//! the capability or reference features the cycle cannot run.

use image::{imageops, GrayImage, RgbaImage};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{LiveConfig, ScanConfig};
use crate::detection::{ContourSegmenter, Region, RegionFilter, SegmentStrategy};
use crate::image_loader::{downscale_to_width, to_gray};
use crate::matching::feature::{average_train_position, sort_by_distance};
use crate::matching::Reference;
use crate::vision::{FeatureSet, VisionBackend};
use crate::{Result, ScanError};

/// Point as fractions of the reference width and height
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

/// Region in processing-frame space and where it belongs in the reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveMatch {
    pub region: Region,
    pub target: NormalizedPoint,
    pub confidence: u32,
}

/// Everything one processing cycle publishes
///
/// Replaced as a whole; readers never see a partially built list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub matches: Vec<LiveMatch>,
    /// Processing-frame size the regions refer to
    pub frame_width: u32,
    pub frame_height: u32,
    /// Generation of the reference the targets refer to
    pub reference_generation: Option<u64>,
}

impl LiveSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

pub struct LiveFrameProcessor {
    backend: Option<Arc<dyn VisionBackend>>,
    filter: RegionFilter,
    config: LiveConfig,
    piece_features: u32,
}

impl LiveFrameProcessor {
    /// `backend` must already be probed
    pub fn new(backend: Option<Arc<dyn VisionBackend>>, config: &ScanConfig) -> Self {
        Self {
            backend,
            filter: RegionFilter::live(&config.live),
            config: config.live.clone(),
            piece_features: config.matching.piece_features,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Run one detection cycle on `frame`
    ///
    /// Fails when the cycle cannot run at all. Failures for a single region
    /// only skip that region.
    pub fn process_frame(&self, frame: &RgbaImage, reference: &Reference) -> Result<LiveSnapshot> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| ScanError::capability("live contour detection"))?;
        let reference_features = reference
            .features()
            .ok_or_else(|| ScanError::capability("reference feature set"))?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(ScanError::ProcessingError("empty video frame".into()));
        }

        let scaled;
        let frame = if frame.width() == self.config.process_width {
            frame
        } else {
            scaled = downscale_to_width(frame, self.config.process_width);
            &scaled
        };
        let (width, height) = frame.dimensions();

        let regions = ContourSegmenter::new(Arc::clone(backend)).segment(frame)?;
        let gray = to_gray(frame);

        let mut matches = Vec::new();
        for region in regions {
            if !self.filter.accept(&region, width, height) {
                continue;
            }
            match self.match_region(backend.as_ref(), &gray, region, reference_features, reference) {
                Ok(Some(m)) => matches.push(m),
                Ok(None) => {}
                Err(e) => debug!("Skipping live region at ({}, {}): {}", region.x, region.y, e),
            }
        }

        debug!("Live cycle: {} matches on {}x{} frame", matches.len(), width, height);
        Ok(LiveSnapshot {
            matches,
            frame_width: width,
            frame_height: height,
            reference_generation: Some(reference.generation()),
        })
    }

    fn match_region(
        &self,
        backend: &dyn VisionBackend,
        gray: &GrayImage,
        region: Region,
        reference_features: &FeatureSet,
        reference: &Reference,
    ) -> Result<Option<LiveMatch>> {
        let roi = imageops::crop_imm(gray, region.x, region.y, region.width, region.height).to_image();
        let features = backend.detect_and_compute(&roi, self.piece_features)?;
        if features.is_empty() {
            return Ok(None);
        }

        let mut matches = backend.match_descriptors(&features.descriptors, &reference_features.descriptors)?;
        sort_by_distance(&mut matches);
        matches.truncate(self.config.top_matches);
        if matches.len() < self.config.min_matches {
            return Ok(None);
        }

        let Some((avg_x, avg_y)) = average_train_position(&matches, &reference_features.keypoints)? else {
            return Ok(None);
        };
        let confidence = (matches.len() as u32 * 10).min(100);
        if confidence < self.config.min_confidence {
            return Ok(None);
        }

        Ok(Some(LiveMatch {
            region,
            target: NormalizedPoint {
                x: avg_x / reference.width() as f32,
                y: avg_y / reference.height() as f32,
            },
            confidence,
        }))
    }
}

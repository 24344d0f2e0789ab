//! Contour and keypoint capability
//!
//! Advanced segmentation and feature matching are provided by a pluggable
//! [`VisionBackend`]. Its absence is a normal condition: callers probe for
//! it once and fall back to grid segmentation and color matching.
//!
//! Enable the `opencv` feature for [`OpenCvBackend`], which uses ORB
//! features and a cross-checked Hamming brute-force matcher.

use image::GrayImage;
use log::info;
use std::sync::Arc;

use crate::detection::Region;
use crate::Result;

#[cfg(feature = "opencv")]
pub mod opencv_backend;
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvBackend;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

/// Closed outline of a foreground blob, in pixel coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    pub fn new(points: Vec<(i32, i32)>) -> Self {
        Self { points }
    }

    /// Inclusive bounding box as `(x, y, width, height)`
    pub fn bounding_rect(&self) -> Option<(i32, i32, i32, i32)> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in &self.points[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Enclosed polygon area (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0i64;
        for i in 0..n {
            let (x0, y0) = self.points[i];
            let (x1, y1) = self.points[(i + 1) % n];
            twice += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
        }
        twice.abs() as f64 / 2.0
    }

    /// Bounding box plus measured area; `None` for empty or off-image contours
    pub fn to_region(&self) -> Option<Region> {
        let (x, y, width, height) = self.bounding_rect()?;
        if x < 0 || y < 0 || width <= 0 || height <= 0 {
            return None;
        }
        Some(Region::new(
            x as u32,
            y as u32,
            width as u32,
            height as u32,
            self.area(),
        ))
    }
}

/// Keypoint location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoint {
    pub x: f32,
    pub y: f32,
}

impl KeyPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Binary descriptor (32 bytes for ORB)
pub type Descriptor = Vec<u8>;

/// Keypoints with one descriptor per keypoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }
}

/// Correspondence between a query and a train descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Contour extraction and keypoint matching capability
pub trait VisionBackend: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// False while the backend is still initialising
    fn is_ready(&self) -> bool {
        true
    }

    /// Blur and adaptively threshold so that pieces become foreground (255)
    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage>;

    /// Outer contours of the foreground blobs in `binary`
    fn extract_contours(&self, binary: &GrayImage) -> Result<Vec<Contour>>;

    /// Detect up to `max_features` keypoints and compute their descriptors
    fn detect_and_compute(&self, gray: &GrayImage, max_features: u32) -> Result<FeatureSet>;

    /// Match `query` against `train`, at most one match per query descriptor
    fn match_descriptors(
        &self,
        query: &[Descriptor],
        train: &[Descriptor],
    ) -> Result<Vec<DescriptorMatch>> {
        Ok(cross_check_match(query, train))
    }
}

/// Number of differing bits
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Brute-force Hamming matching with cross-check
///
/// A pair is kept only when each descriptor is the other's nearest neighbour.
/// Results are ordered by query index.
pub fn cross_check_match(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let nearest = |needle: &Descriptor, haystack: &[Descriptor]| -> (usize, u32) {
        let mut best = (0, u32::MAX);
        for (idx, candidate) in haystack.iter().enumerate() {
            let d = hamming_distance(needle, candidate);
            if d < best.1 {
                best = (idx, d);
            }
        }
        best
    };

    let reverse: Vec<usize> = train.iter().map(|t| nearest(t, query).0).collect();

    query
        .iter()
        .enumerate()
        .filter_map(|(query_idx, q)| {
            let (train_idx, distance) = nearest(q, train);
            (reverse[train_idx] == query_idx).then_some(DescriptorMatch {
                query_idx,
                train_idx,
                distance: distance as f32,
            })
        })
        .collect()
}

/// Keep `backend` only if it reports ready
pub fn probe(backend: Option<Arc<dyn VisionBackend>>) -> Option<Arc<dyn VisionBackend>> {
    match backend {
        Some(backend) if backend.is_ready() => {
            info!("Vision backend '{}' available: contour and feature matching enabled", backend.name());
            Some(backend)
        }
        Some(backend) => {
            info!("Vision backend '{}' not ready: using grid and color fallbacks", backend.name());
            None
        }
        None => {
            info!("No vision backend: using grid and color fallbacks");
            None
        }
    }
}

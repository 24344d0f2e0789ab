//! Deterministic backend for tests
//!
//! * foreground: gray < 250
//! * contours: bounding-box outline of each 4-connected foreground blob
//! * keypoints: pixels with an odd gray value below 255, descriptor `[gray]`
//!
//! Drawing blocks with even grays and sprinkling unique odd "marker" values
//! gives exact, unambiguous descriptor matches.
//!
//! Compiled for unit tests and, through the `test-support` feature, for
//! integration tests and downstream crates.

use image::{GrayImage, Luma};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Contour, FeatureSet, KeyPoint, VisionBackend};
use crate::{Result, ScanError};

pub struct MarkerBackend {
    ready: bool,
    fail_features: bool,
    fail_contours: bool,
    pub detect_calls: AtomicUsize,
}

impl MarkerBackend {
    pub fn new() -> Self {
        Self {
            ready: true,
            fail_features: false,
            fail_contours: false,
            detect_calls: AtomicUsize::new(0),
        }
    }

    /// Reports the capability as unavailable
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn failing_features(mut self) -> Self {
        self.fail_features = true;
        self
    }

    pub fn failing_contours(mut self) -> Self {
        self.fail_contours = true;
        self
    }
}

impl Default for MarkerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VisionBackend for MarkerBackend {
    fn name(&self) -> &str {
        "marker"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage> {
        Ok(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] < 250 {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    fn extract_contours(&self, binary: &GrayImage) -> Result<Vec<Contour>> {
        if self.fail_contours {
            return Err(ScanError::ProcessingError("contour extraction failed".into()));
        }

        let (w, h) = binary.dimensions();
        let mut seen = vec![false; (w * h) as usize];
        let mut contours = Vec::new();

        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) as usize;
                if seen[idx] || binary.get_pixel(x, y)[0] == 0 {
                    continue;
                }
                seen[idx] = true;
                let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);
                let mut stack = vec![(x, y)];
                while let Some((cx, cy)) = stack.pop() {
                    x0 = x0.min(cx);
                    y0 = y0.min(cy);
                    x1 = x1.max(cx);
                    y1 = y1.max(cy);
                    let mut visit = |nx: u32, ny: u32| {
                        let n = (ny * w + nx) as usize;
                        if !seen[n] && binary.get_pixel(nx, ny)[0] != 0 {
                            seen[n] = true;
                            stack.push((nx, ny));
                        }
                    };
                    if cx > 0 {
                        visit(cx - 1, cy);
                    }
                    if cx + 1 < w {
                        visit(cx + 1, cy);
                    }
                    if cy > 0 {
                        visit(cx, cy - 1);
                    }
                    if cy + 1 < h {
                        visit(cx, cy + 1);
                    }
                }
                let (x0, y0, x1, y1) = (x0 as i32, y0 as i32, x1 as i32, y1 as i32);
                contours.push(Contour::new(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]));
            }
        }

        Ok(contours)
    }

    fn detect_and_compute(&self, gray: &GrayImage, max_features: u32) -> Result<FeatureSet> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_features {
            return Err(ScanError::ProcessingError("feature detection failed".into()));
        }

        let mut features = FeatureSet::default();
        for (x, y, px) in gray.enumerate_pixels() {
            let v = px[0];
            if v % 2 == 1 && v != 255 {
                features.keypoints.push(KeyPoint::new(x as f32, y as f32));
                features.descriptors.push(vec![v]);
                if features.len() >= max_features as usize {
                    break;
                }
            }
        }
        Ok(features)
    }
}

//! Piece segmentation
//!
//! Two strategies produce candidate regions:
//! - [`ContourSegmenter`]: grayscale → blur + adaptive threshold → external
//!   contours, through the vision capability
//! - [`GridSegmenter`]: fixed non-overlapping cells, always available
//!
//! [`Segmenter`] runs the contour strategy when a backend was probed and
//! degrades to the grid for that call if it fails.

use image::RgbaImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Region;
use crate::image_loader::to_gray;
use crate::vision::VisionBackend;
use crate::Result;

/// Which strategy produced a set of regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentMode {
    Contour,
    Grid,
}

/// A way of splitting an image into candidate piece regions
pub trait SegmentStrategy: Send + Sync {
    fn mode(&self) -> SegmentMode;

    fn segment(&self, image: &RgbaImage) -> Result<Vec<Region>>;
}

/// Fixed-size grid cells
#[derive(Debug, Clone)]
pub struct GridSegmenter {
    cell_size: u32,
}

impl GridSegmenter {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size: cell_size.max(1),
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }
}

impl SegmentStrategy for GridSegmenter {
    fn mode(&self) -> SegmentMode {
        SegmentMode::Grid
    }

    /// Every full `cell_size` cell, row by row; partial cells at the right
    /// and bottom borders are dropped
    fn segment(&self, image: &RgbaImage) -> Result<Vec<Region>> {
        let g = self.cell_size;
        let (w, h) = image.dimensions();
        if w < g || h < g {
            return Ok(Vec::new());
        }

        let mut regions = Vec::with_capacity(((w / g) * (h / g)) as usize);
        for y in (0..=h - g).step_by(g as usize) {
            for x in (0..=w - g).step_by(g as usize) {
                regions.push(Region::cell(x, y, g));
            }
        }
        Ok(regions)
    }
}

/// Contour extraction through the vision capability
pub struct ContourSegmenter {
    backend: Arc<dyn VisionBackend>,
}

impl ContourSegmenter {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self { backend }
    }
}

impl SegmentStrategy for ContourSegmenter {
    fn mode(&self) -> SegmentMode {
        SegmentMode::Contour
    }

    fn segment(&self, image: &RgbaImage) -> Result<Vec<Region>> {
        let gray = to_gray(image);
        let binary = self.backend.binarize(&gray)?;
        let contours = self.backend.extract_contours(&binary)?;
        debug!("{} detected {} contours", self.backend.name(), contours.len());

        Ok(contours.iter().filter_map(|c| c.to_region()).collect())
    }
}

/// Regions plus the strategy that actually produced them
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub mode: SegmentMode,
    pub regions: Vec<Region>,
}

/// Contour segmentation with grid fallback
pub struct Segmenter {
    primary: Option<Box<dyn SegmentStrategy>>,
    fallback: GridSegmenter,
}

impl Segmenter {
    /// `backend` should already be probed; `None` means grid only
    pub fn new(backend: Option<Arc<dyn VisionBackend>>, grid_size: u32) -> Self {
        Self {
            primary: backend.map(|b| Box::new(ContourSegmenter::new(b)) as Box<dyn SegmentStrategy>),
            fallback: GridSegmenter::new(grid_size),
        }
    }

    pub fn grid_size(&self) -> u32 {
        self.fallback.cell_size()
    }

    pub fn segment(&self, image: &RgbaImage) -> Segmentation {
        if let Some(primary) = &self.primary {
            match primary.segment(image) {
                Ok(regions) => {
                    return Segmentation {
                        mode: primary.mode(),
                        regions,
                    }
                }
                Err(e) => warn!("Contour segmentation failed, falling back to grid: {}", e),
            }
        }

        Segmentation {
            mode: SegmentMode::Grid,
            // grid segmentation cannot fail
            regions: self.fallback.segment(image).unwrap_or_default(),
        }
    }
}

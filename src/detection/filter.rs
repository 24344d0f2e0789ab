//! Region acceptance rules
//!
//! A region is rejected when it is:
//! - narrower or shorter than the minimum dimension
//! - below the minimum measured area (contour noise)
//! - above the maximum area ratio of the image (background blob)
//! - empty background, judged by mean brightness (grid mode only)

use image::RgbaImage;

use super::{Region, SegmentMode};
use crate::color::mean_brightness;
use crate::config::{FilterConfig, LiveConfig, SegmentationConfig};

#[derive(Debug, Clone)]
pub struct RegionFilter {
    min_dimension: u32,
    min_area: f64,
    max_area_ratio: f64,
    /// `None` disables the background check
    background_brightness: Option<f64>,
}

impl RegionFilter {
    /// Filter for still-image analysis, tuned to the segmentation mode
    pub fn for_mode(mode: SegmentMode, filter: &FilterConfig, segmentation: &SegmentationConfig) -> Self {
        match mode {
            SegmentMode::Contour => Self {
                min_dimension: filter.min_dimension,
                min_area: segmentation.min_contour_area,
                max_area_ratio: filter.max_area_ratio,
                background_brightness: None,
            },
            SegmentMode::Grid => Self {
                min_dimension: filter.min_dimension,
                min_area: 0.0,
                max_area_ratio: filter.max_area_ratio,
                background_brightness: Some(filter.background_brightness),
            },
        }
    }

    /// Lighter area-only filter for downscaled live frames
    pub fn live(config: &LiveConfig) -> Self {
        Self {
            min_dimension: 0,
            min_area: config.min_area,
            max_area_ratio: config.max_area_ratio,
            background_brightness: None,
        }
    }

    /// Geometric checks against an `image_width`x`image_height` image
    pub fn accept(&self, region: &Region, image_width: u32, image_height: u32) -> bool {
        if region.width == 0 || region.height == 0 {
            return false;
        }
        if region.width < self.min_dimension || region.height < self.min_dimension {
            return false;
        }
        if region.area < self.min_area {
            return false;
        }
        let image_area = image_width as f64 * image_height as f64;
        region.area <= image_area * self.max_area_ratio
    }

    /// True when `pixels` look like empty background
    pub fn is_background(&self, pixels: &RgbaImage) -> bool {
        match self.background_brightness {
            Some(limit) => mean_brightness(pixels) > limit,
            None => false,
        }
    }

    /// Geometry and, where enabled, background check
    pub fn admit(&self, region: &Region, pixels: &RgbaImage, image_width: u32, image_height: u32) -> bool {
        self.accept(region, image_width, image_height) && !self.is_background(pixels)
    }
}

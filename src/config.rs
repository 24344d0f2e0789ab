//! Configuration structures for the jigsaw_scan pipeline.
//!
//! Every tunable of segmentation, filtering, matching, live processing and
//! overlay rendering, grouped by stage.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use jigsaw_scan::ScanConfig;
//! use std::path::Path;
//!
//! // Load from file; missing fields keep their defaults
//! let config = ScanConfig::from_json_file(Path::new("scan.json"))?;
//!
//! // Or use defaults
//! let config = ScanConfig::default();
//! # Ok::<(), jigsaw_scan::ScanError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;
use crate::{Result, ScanError};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Region segmentation
    pub segmentation: SegmentationConfig,

    /// Region acceptance
    pub filter: FilterConfig,

    /// Color profiling
    pub color: ColorConfig,

    /// Edge classification
    pub edge: EdgeConfig,

    /// Reference matching
    pub matching: MatchingConfig,

    /// Live frame processing
    pub live: LiveConfig,

    /// Overlay rendering
    pub overlay: OverlayConfig,
}

/// Segmentation parameters.
///
/// `grid_size` drives the fallback segmenter; the remaining fields are handed
/// to the contour capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Fallback grid cell size in pixels
    pub grid_size: u32,

    /// Minimum contour area in contour mode
    pub min_contour_area: f64,

    /// Gaussian blur kernel size (must be odd)
    pub blur_kernel_size: i32,

    /// Adaptive threshold block size (must be odd)
    pub adaptive_block_size: i32,

    /// Adaptive threshold constant
    pub adaptive_c: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            grid_size: constants::segmentation::GRID_SIZE,
            min_contour_area: constants::segmentation::MIN_CONTOUR_AREA,
            blur_kernel_size: constants::segmentation::BLUR_KERNEL_SIZE,
            adaptive_block_size: constants::segmentation::ADAPTIVE_BLOCK_SIZE,
            adaptive_c: constants::segmentation::ADAPTIVE_C,
        }
    }
}

/// Region filter thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum width and height in pixels
    pub min_dimension: u32,

    /// Maximum region area as fraction of image (0.0-1.0)
    pub max_area_ratio: f64,

    /// Mean luminance above which a grid cell is empty
    pub background_brightness: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_dimension: constants::filter::MIN_DIMENSION,
            max_area_ratio: constants::filter::MAX_AREA_RATIO,
            background_brightness: constants::filter::BACKGROUND_BRIGHTNESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Sample every Nth pixel
    pub sample_stride: usize,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            sample_stride: constants::color::SAMPLE_STRIDE,
        }
    }
}

/// Border proximity policy for edge classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMargin {
    /// One span from left/top, two spans from right/bottom
    #[default]
    Asymmetric,
    /// One span from every border
    Symmetric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub margin: EdgeMargin,
}

/// Reference matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Reference tile size for the color-grid search
    pub tile_size: u32,

    /// Sampling step inside a tile
    pub tile_sample_step: u32,

    /// Minimum descriptor matches for a feature position
    pub min_feature_matches: usize,

    /// Maximum matches averaged into a position
    pub max_averaged_matches: usize,

    /// Features extracted per piece
    pub piece_features: u32,

    /// Features extracted from the reference
    pub reference_features: u32,

    /// Color similarity weight in feature confidence
    pub color_weight: f32,

    /// Match evidence weight in feature confidence
    pub feature_weight: f32,

    /// Confidence above which a piece is reported as a high-confidence match
    pub high_confidence: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tile_size: constants::matching::TILE_SIZE,
            tile_sample_step: constants::matching::TILE_SAMPLE_STEP,
            min_feature_matches: constants::matching::MIN_FEATURE_MATCHES,
            max_averaged_matches: constants::matching::MAX_AVERAGED_MATCHES,
            piece_features: constants::matching::PIECE_FEATURES,
            reference_features: constants::matching::REFERENCE_FEATURES,
            color_weight: constants::matching::COLOR_WEIGHT,
            feature_weight: constants::matching::FEATURE_WEIGHT,
            high_confidence: constants::matching::HIGH_CONFIDENCE,
        }
    }
}

/// Live processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Minimum interval between processed frames (milliseconds)
    pub process_interval_ms: u64,

    /// Processing frame width
    pub process_width: u32,

    /// Minimum contour area in the processing frame
    pub min_area: f64,

    /// Maximum contour area as fraction of the processing frame
    pub max_area_ratio: f64,

    /// Best matches averaged per region
    pub top_matches: usize,

    /// Minimum matches per region
    pub min_matches: usize,

    /// Minimum confidence kept in the match list
    pub min_confidence: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            process_interval_ms: constants::live::PROCESS_INTERVAL_MS,
            process_width: constants::live::PROCESS_WIDTH,
            min_area: constants::live::MIN_AREA,
            max_area_ratio: constants::live::MAX_AREA_RATIO,
            top_matches: constants::live::TOP_MATCHES,
            min_matches: constants::live::MIN_MATCHES,
            min_confidence: constants::live::MIN_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub grid_spacing: u32,
    pub crosshair_half_length: f32,
    pub target_radius: f32,
    pub label_offset: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            grid_spacing: constants::overlay::GRID_SPACING,
            crosshair_half_length: constants::overlay::CROSSHAIR_HALF_LENGTH,
            target_radius: constants::overlay::TARGET_RADIUS,
            label_offset: constants::overlay::LABEL_OFFSET,
        }
    }
}

impl ScanConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::config(format!("Failed to read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ScanError::config(format!("Failed to parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| ScanError::config(format!("Failed to write {}", path.display()), e))?;
        Ok(())
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("segmentation.grid_size", self.segmentation.grid_size),
            ("matching.tile_size", self.matching.tile_size),
            ("matching.tile_sample_step", self.matching.tile_sample_step),
            ("live.process_width", self.live.process_width),
            ("overlay.grid_spacing", self.overlay.grid_spacing),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ScanError::invalid_parameter(name, value));
            }
        }

        if self.color.sample_stride == 0 {
            return Err(ScanError::invalid_parameter("color.sample_stride", 0));
        }

        let ratios = [
            ("filter.max_area_ratio", self.filter.max_area_ratio),
            ("live.max_area_ratio", self.live.max_area_ratio),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ScanError::invalid_parameter(name, value));
            }
        }

        for (name, value) in [
            ("segmentation.blur_kernel_size", self.segmentation.blur_kernel_size),
            ("segmentation.adaptive_block_size", self.segmentation.adaptive_block_size),
        ] {
            if value < 1 || value % 2 == 0 {
                return Err(ScanError::invalid_parameter(name, value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = ScanConfig::default();
        assert_eq!(config.segmentation.grid_size, 60);
        assert_eq!(config.filter.min_dimension, 30);
        assert_eq!(config.matching.tile_size, 50);
        assert_eq!(config.live.process_interval_ms, 500);
        assert_eq!(config.edge.margin, EdgeMargin::Asymmetric);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "segmentation": { "grid_size": 40 }, "edge": { "margin": "Symmetric" } }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.segmentation.grid_size, 40);
        assert_eq!(config.segmentation.min_contour_area, 1000.0);
        assert_eq!(config.edge.margin, EdgeMargin::Symmetric);
        assert_eq!(config.live, LiveConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ScanConfig::default();
        config.segmentation.grid_size = 0;
        assert!(matches!(config.validate(), Err(ScanError::InvalidParameter { .. })));

        let mut config = ScanConfig::default();
        config.filter.max_area_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = ScanConfig::default();
        config.segmentation.adaptive_block_size = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("jigsaw_scan_config_{}.json", std::process::id()));
        let mut config = ScanConfig::default();
        config.live.min_confidence = 50;
        config.to_json_file(&path).unwrap();

        let loaded = ScanConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ScanConfig::from_json_file(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(ScanError::ConfigError { .. })));
    }
}

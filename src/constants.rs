//! Detection and matching constants
//!
//! Default values for every tunable in [`crate::config::ScanConfig`]. The
//! configuration defaults are built from these, so changing a value here
//! changes the default pipeline behaviour.

/// Region segmentation parameters
pub mod segmentation {
    /// Fallback grid cell size in pixels
    pub const GRID_SIZE: u32 = 60;

    /// Minimum contour area (pixels) in contour mode
    pub const MIN_CONTOUR_AREA: f64 = 1000.0;

    /// Gaussian blur kernel size (must be odd)
    pub const BLUR_KERNEL_SIZE: i32 = 5;

    /// Adaptive threshold neighbourhood size (must be odd)
    pub const ADAPTIVE_BLOCK_SIZE: i32 = 11;

    /// Constant subtracted from the weighted neighbourhood mean
    pub const ADAPTIVE_C: f64 = 2.0;
}

/// Region filter thresholds
pub mod filter {
    /// Minimum region width and height in pixels
    pub const MIN_DIMENSION: u32 = 30;

    /// Regions larger than this fraction of the image are background blobs
    pub const MAX_AREA_RATIO: f64 = 0.3;

    /// Mean luminance above which a grid cell is empty background
    pub const BACKGROUND_BRIGHTNESS: f64 = 240.0;
}

/// Color profiling
pub mod color {
    /// Sample every Nth pixel when averaging a region
    pub const SAMPLE_STRIDE: usize = 10;

    /// Brightness above which a signature is `Light`
    pub const LIGHT_BRIGHTNESS: f32 = 200.0;

    /// Brightness below which a signature is `Dark`
    pub const DARK_BRIGHTNESS: f32 = 60.0;

    /// Green level separating yellow/orange from red
    pub const YELLOW_GREEN_LEVEL: u8 = 100;

    /// Sum of maximal channel differences (3 * 255) mapped onto 100%
    pub const SIMILARITY_SCALE: f32 = 7.65;
}

/// Reference matching
pub mod matching {
    /// Reference tile size for the color-grid search
    pub const TILE_SIZE: u32 = 50;

    /// Pixel step inside a tile when sampling its mean color
    pub const TILE_SAMPLE_STEP: u32 = 5;

    /// Minimum descriptor matches before a feature position is trusted
    pub const MIN_FEATURE_MATCHES: usize = 6;

    /// Maximum matches averaged into a position
    pub const MAX_AVERAGED_MATCHES: usize = 20;

    /// ORB features extracted per piece
    pub const PIECE_FEATURES: u32 = 500;

    /// ORB features extracted from the reference image
    pub const REFERENCE_FEATURES: u32 = 2000;

    /// Weight of color similarity in the blended feature confidence
    pub const COLOR_WEIGHT: f32 = 0.4;

    /// Weight of match evidence in the blended feature confidence
    pub const FEATURE_WEIGHT: f32 = 0.6;

    /// Confidence above which a match counts as high-confidence
    pub const HIGH_CONFIDENCE: f32 = 70.0;
}

/// Live (augmented reality) processing
pub mod live {
    /// Minimum time between two processed frames in milliseconds
    pub const PROCESS_INTERVAL_MS: u64 = 500;

    /// Width frames are downscaled to before processing
    pub const PROCESS_WIDTH: u32 = 640;

    /// Minimum contour area in the processing frame
    pub const MIN_AREA: f64 = 500.0;

    /// Maximum contour area as a fraction of the processing frame
    pub const MAX_AREA_RATIO: f64 = 0.5;

    /// Best matches averaged per region
    pub const TOP_MATCHES: usize = 10;

    /// Minimum matches for a region to produce a target
    pub const MIN_MATCHES: usize = 4;

    /// Confidence below which a live match is discarded
    pub const MIN_CONFIDENCE: u32 = 40;
}

/// Overlay rendering
pub mod overlay {
    /// Guide grid spacing in display pixels
    pub const GRID_SPACING: u32 = 50;

    /// Half length of the centre crosshair arms
    pub const CROSSHAIR_HALF_LENGTH: f32 = 20.0;

    /// Radius of the target dot
    pub const TARGET_RADIUS: f32 = 5.0;

    /// Vertical offset of the confidence label above the box
    pub const LABEL_OFFSET: f32 = 5.0;
}

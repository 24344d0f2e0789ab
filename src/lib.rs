//! # Jigsaw Scan
//!
//! A Rust crate for detecting jigsaw puzzle pieces in photographs and
//! suggesting where they belong in a picture of the finished puzzle.
//!
//! This library provides:
//! - Piece segmentation (contour-based, with a fixed-grid fallback)
//! - Color profiling and grouping of detected pieces
//! - Edge-piece classification
//! - Placement suggestions against a reference image (keypoint matching,
//!   with a color-tile fallback)
//! - A throttled live mode that maps matches onto a display overlay
//!
//! Contour and keypoint work goes through a [`VisionBackend`]. Enable the
//! `opencv` feature for the OpenCV implementation; without a backend every
//! operation degrades to its fallback.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jigsaw_scan::analyze_puzzle;
//! use std::path::Path;
//!
//! let result = analyze_puzzle(Path::new("pieces.jpg"), Some(Path::new("box.jpg")))?;
//! println!("{}", result.summary());
//! for suggestion in &result.suggestions {
//!     println!("- {}", suggestion);
//! }
//! # Ok::<(), jigsaw_scan::ScanError>(())
//! ```

use std::path::Path;

pub mod error;
pub mod constants;
pub mod config;
pub mod image_loader;
pub mod thumbnail;
pub mod color;
pub mod detection;
pub mod vision;
pub mod matching;
pub mod analyzer;
pub mod live;
pub mod session;

pub use error::{Result, ScanError};
pub use config::ScanConfig;
pub use analyzer::{AnalysisResult, PieceRecord, PuzzleAnalyzer};
pub use color::{ColorGroup, ColorSignature};
pub use detection::Region;
pub use matching::{MatchPosition, Reference};
pub use live::{DisplaySize, DrawCommand, LiveMatch, LiveSnapshot};
pub use session::PuzzleSession;
pub use vision::VisionBackend;

/// Analyze a photo of puzzle pieces, optionally against a reference image
///
/// Uses the default configuration and the default backend for this build
/// (OpenCV with the `opencv` feature, fallbacks otherwise).
///
/// # Errors
///
/// Returns `ScanError` if either image cannot be loaded. Detection and
/// matching problems never fail the call; they degrade to fallbacks.
pub fn analyze_puzzle(image_path: &Path, reference_path: Option<&Path>) -> Result<AnalysisResult> {
    let image = image_loader::load_image(image_path)?;
    let mut session = PuzzleSession::with_default_backend(ScanConfig::default());
    if let Some(path) = reference_path {
        session.load_reference(image_loader::load_image(path)?);
    }
    Ok(session.analyze(&image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_puzzle_missing_file() {
        let err = analyze_puzzle(Path::new("/nonexistent/pieces.png"), None).unwrap_err();
        assert!(matches!(err, ScanError::ImageLoadError { .. }));
    }

    #[test]
    fn test_analyze_puzzle_from_file() {
        let dir = std::env::temp_dir().join(format!("jigsaw_scan_lib_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pieces.png");

        let mut image = image::RgbaImage::from_pixel(120, 120, image::Rgba([255, 255, 255, 255]));
        for y in 60..120 {
            for x in 60..120 {
                image.put_pixel(x, y, image::Rgba([30, 30, 200, 255]));
            }
        }
        image.save(&path).unwrap();

        let result = analyze_puzzle(&path, None).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        #[cfg(not(feature = "opencv"))]
        {
            assert_eq!(result.pieces.len(), 1);
            assert_eq!(result.pieces[0].color_group, ColorGroup::Blue);
            assert_eq!(result.suggestions.len(), 4);
        }
        assert!(result.suggestions[0].starts_with("Start with edge"));
    }
}

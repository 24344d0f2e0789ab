//! Piece detection module
//!
//! This module splits an image into candidate piece regions, filters out
//! noise and background, and classifies regions as edge or interior.

pub mod region;
pub mod segmenter;
pub mod filter;
pub mod edge;

pub use region::Region;
pub use segmenter::{ContourSegmenter, GridSegmenter, SegmentMode, SegmentStrategy, Segmentation, Segmenter};
pub use filter::RegionFilter;
pub use edge::EdgeClassifier;

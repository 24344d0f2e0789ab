//! Color profiling and grouping module
//!
//! This module summarises piece pixels into mean-color signatures,
//! buckets them into display groups, and scores color similarity.

pub mod profile;
pub mod group;

pub use profile::{color_similarity, mean_brightness, tile_signature, ColorProfiler, ColorSignature};
pub use group::ColorGroup;

//! Piece thumbnail encoding
//!
//! Thumbnails are display-only: the analysis never reads them back.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

use crate::{Result, ScanError};

/// JPEG quality for piece thumbnails
pub const THUMBNAIL_QUALITY: u8 = 70;

/// Encoded thumbnail handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// MIME type of `bytes`
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Encodes a piece's pixels into a displayable thumbnail
pub trait ThumbnailEncoder: Send + Sync {
    fn encode(&self, pixels: &RgbaImage) -> Result<Thumbnail>;
}

/// JPEG thumbnails via the `image` crate
#[derive(Debug, Clone)]
pub struct JpegThumbnailEncoder {
    quality: u8,
}

impl Default for JpegThumbnailEncoder {
    fn default() -> Self {
        Self::new(THUMBNAIL_QUALITY)
    }
}

impl JpegThumbnailEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl ThumbnailEncoder for JpegThumbnailEncoder {
    fn encode(&self, pixels: &RgbaImage) -> Result<Thumbnail> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode_image(&rgb)
            .map_err(|e| ScanError::ProcessingError(format!("Thumbnail encoding failed: {}", e)))?;

        Ok(Thumbnail {
            mime: "image/jpeg",
            bytes,
        })
    }
}

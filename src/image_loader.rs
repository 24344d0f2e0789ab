//! Image loading and pixel-buffer helpers
//!
//! All analysis runs on `image::RgbaImage` (4 channels, row-major). Decoding
//! from disk is provided for the demos and tests; callers that already hold
//! decoded frames use the buffer helpers directly.
//!
//! ## Supported Formats
//!
//! Whatever the `image` crate can decode in this build, chosen by file
//! extension: JPEG, PNG, GIF (first frame), WebP, TIFF, BMP, ICO, TGA, PNM
//! and QOI with its default features. Extensions the crate recognizes but
//! cannot read (AVIF without a native decoder) are rejected up front.

use crate::error::{Result, ScanError};
use image::{imageops, GrayImage, RgbaImage};
use std::path::Path;

/// Load an image from disk as an RGBA buffer
///
/// # Errors
///
/// Returns `ScanError::ImageLoadError` if:
/// - The extension is unknown, or names a format this build cannot decode
/// - File cannot be opened
/// - Decoding fails
///
/// # Example
///
/// ```rust,no_run
/// use jigsaw_scan::image_loader::load_image;
/// use std::path::Path;
///
/// let image = load_image(Path::new("pieces.jpg"))?;
/// println!("Loaded image: {}x{}", image.width(), image.height());
/// # Ok::<(), jigsaw_scan::ScanError>(())
/// ```
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let format = image::ImageFormat::from_path(path).map_err(|e| {
        ScanError::image_load(format!("Unknown image format for file: {}", path.display()), e)
    })?;
    if !format.reading_enabled() {
        return Err(ScanError::ImageLoadError {
            message: format!("No decoder for {:?} file: {}", format, path.display()),
            source: None,
        });
    }

    let mut reader = image::ImageReader::open(path).map_err(|e| {
        ScanError::image_load(format!("Failed to open image file: {}", path.display()), e)
    })?;
    reader.set_format(format);

    let decoded = reader.decode().map_err(|e| {
        ScanError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    Ok(decoded.to_rgba8())
}

/// Copy a rectangular block of pixels, clamped to the image bounds
///
/// Returns an empty (0x0) buffer when the rectangle lies fully outside.
pub fn get_pixels(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    let x = x.min(image.width());
    let y = y.min(image.height());
    let width = width.min(image.width() - x);
    let height = height.min(image.height() - y);
    imageops::crop_imm(image, x, y, width, height).to_image()
}

/// Convert to single-channel luminance
pub fn to_gray(image: &RgbaImage) -> GrayImage {
    imageops::grayscale(image)
}

/// Resize to a fixed width, keeping the aspect ratio
pub fn downscale_to_width(image: &RgbaImage, width: u32) -> RgbaImage {
    let height = scaled_height(image.width(), image.height(), width);
    imageops::resize(image, width, height, imageops::FilterType::Triangle)
}

/// Height matching `target_width` for a `width`x`height` source
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    scaled.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_format_detection() {
        let dir = std::env::temp_dir().join(format!("jigsaw_scan_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("photo.PNG");
        RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255])).save_with_format(&path, image::ImageFormat::Png).unwrap();

        let loaded = load_image(&path);
        std::fs::remove_dir_all(&dir).ok();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.dimensions(), (4, 3));
        assert_eq!(loaded.get_pixel(3, 2), &Rgba([10, 20, 30, 255]));

        for name in ["photo.xyz", "noextension"] {
            let err = load_image(Path::new(name)).unwrap_err();
            assert!(err.to_string().contains("Unknown image format"), "{}", name);
        }
    }

    #[test]
    fn test_load_format_without_decoder() {
        // avif is recognized by extension but not decodable with default features
        assert!(!image::ImageFormat::Avif.reading_enabled());
        let err = load_image(Path::new("nonexistent_photo.avif")).unwrap_err();
        assert!(matches!(err, ScanError::ImageLoadError { source: None, .. }));
        assert!(err.to_string().contains("No decoder"));
    }

    #[test]
    fn test_load_unknown_format() {
        let result = load_image(Path::new("pieces.doc"));
        assert!(matches!(result, Err(ScanError::ImageLoadError { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_image(Path::new("nonexistent_file.png"));
        assert!(matches!(result, Err(ScanError::ImageLoadError { .. })));
    }

    #[test]
    fn test_get_pixels_clamps_to_bounds() {
        let mut image = RgbaImage::from_pixel(100, 80, Rgba([255, 255, 255, 255]));
        image.put_pixel(90, 70, Rgba([1, 2, 3, 255]));

        let block = get_pixels(&image, 90, 70, 50, 50);
        assert_eq!(block.dimensions(), (10, 10));
        assert_eq!(block.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));

        let outside = get_pixels(&image, 200, 200, 10, 10);
        assert_eq!(outside.dimensions(), (0, 0));
    }

    #[test]
    fn test_downscale_keeps_aspect_ratio() {
        let frame = RgbaImage::new(1920, 1080);
        let small = downscale_to_width(&frame, 640);
        assert_eq!(small.dimensions(), (640, 360));

        assert_eq!(scaled_height(1280, 721, 640), 361);
        assert_eq!(scaled_height(4000, 1, 640), 1);
    }
}

//! OpenCV implementation of the vision capability
//!
//! Segmentation: Gaussian blur → adaptive Gaussian threshold (inverted) →
//! external contours. Features: ORB keypoints with binary descriptors,
//! matched by a cross-checked Hamming brute-force matcher.

use image::GrayImage;
use opencv::{
    core::{self, AlgorithmHint, DMatch, KeyPoint as CvKeyPoint, Mat, Point, Size, Vector, BORDER_DEFAULT, NORM_HAMMING},
    features2d::{BFMatcher, ORB_ScoreType, ORB},
    imgproc::{
        adaptive_threshold, find_contours, gaussian_blur, ADAPTIVE_THRESH_GAUSSIAN_C, CHAIN_APPROX_SIMPLE,
        RETR_EXTERNAL, THRESH_BINARY_INV,
    },
    prelude::*,
};

use super::{Contour, Descriptor, DescriptorMatch, FeatureSet, KeyPoint, VisionBackend};
use crate::config::SegmentationConfig;
use crate::{Result, ScanError};

type VectorOfPoint = Vector<Point>;

/// ORB pyramid scale factor
const ORB_SCALE_FACTOR: f32 = 1.2;
/// ORB pyramid levels
const ORB_LEVELS: i32 = 8;
/// ORB border / patch size
const ORB_PATCH_SIZE: i32 = 31;
/// FAST threshold used by ORB
const ORB_FAST_THRESHOLD: i32 = 20;

pub struct OpenCvBackend {
    blur_kernel_size: i32,
    adaptive_block_size: i32,
    adaptive_c: f64,
}

impl Default for OpenCvBackend {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}

impl OpenCvBackend {
    pub fn new(config: &SegmentationConfig) -> Self {
        Self {
            blur_kernel_size: config.blur_kernel_size,
            adaptive_block_size: config.adaptive_block_size,
            adaptive_c: config.adaptive_c,
        }
    }

    fn gray_to_mat(gray: &GrayImage) -> Result<Mat> {
        let flat = Mat::from_slice(gray.as_raw()).map_err(|e| ScanError::opencv("Mat creation", e))?;
        flat.reshape(1, gray.height() as i32)
            .map_err(|e| ScanError::opencv("Mat reshape", e))?
            .try_clone()
            .map_err(|e| ScanError::opencv("Mat clone", e))
    }

    fn mat_to_gray(mat: &Mat) -> Result<GrayImage> {
        let bytes = mat.data_bytes().map_err(|e| ScanError::opencv("Mat data access", e))?;
        GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, bytes.to_vec())
            .ok_or_else(|| ScanError::ProcessingError("Binary image has unexpected size".into()))
    }

    fn descriptors_to_mat(descriptors: &[Descriptor]) -> Result<Mat> {
        Mat::from_slice_2d(descriptors).map_err(|e| ScanError::opencv("Descriptor Mat creation", e))
    }
}

impl VisionBackend for OpenCvBackend {
    fn name(&self) -> &str {
        "opencv"
    }

    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage> {
        let src = Self::gray_to_mat(gray)?;

        let mut blurred = Mat::default();
        gaussian_blur(
            &src,
            &mut blurred,
            Size::new(self.blur_kernel_size, self.blur_kernel_size),
            0.0,
            0.0,
            BORDER_DEFAULT,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| ScanError::opencv("Gaussian blur", e))?;

        let mut binary = Mat::default();
        adaptive_threshold(
            &blurred,
            &mut binary,
            255.0,
            ADAPTIVE_THRESH_GAUSSIAN_C,
            THRESH_BINARY_INV,
            self.adaptive_block_size,
            self.adaptive_c,
        )
        .map_err(|e| ScanError::opencv("Adaptive threshold", e))?;

        Self::mat_to_gray(&binary)
    }

    fn extract_contours(&self, binary: &GrayImage) -> Result<Vec<Contour>> {
        let src = Self::gray_to_mat(binary)?;
        let mut contours = Vector::<VectorOfPoint>::new();
        find_contours(&src, &mut contours, RETR_EXTERNAL, CHAIN_APPROX_SIMPLE, Point::new(0, 0))
            .map_err(|e| ScanError::opencv("Contour detection", e))?;

        Ok(contours
            .iter()
            .map(|contour| Contour::new(contour.iter().map(|p| (p.x, p.y)).collect()))
            .collect())
    }

    fn detect_and_compute(&self, gray: &GrayImage, max_features: u32) -> Result<FeatureSet> {
        let src = Self::gray_to_mat(gray)?;
        let mut orb = ORB::create(
            max_features as i32,
            ORB_SCALE_FACTOR,
            ORB_LEVELS,
            ORB_PATCH_SIZE,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            ORB_PATCH_SIZE,
            ORB_FAST_THRESHOLD,
        )
        .map_err(|e| ScanError::opencv("ORB creation", e))?;

        let mut keypoints = Vector::<CvKeyPoint>::new();
        let mut descriptors = Mat::default();
        orb.detect_and_compute(&src, &core::no_array(), &mut keypoints, &mut descriptors, false)
            .map_err(|e| ScanError::opencv("ORB detect and compute", e))?;

        let mut features = FeatureSet::default();
        for (row, kp) in keypoints.iter().enumerate() {
            let pt = kp.pt();
            let bytes = descriptors
                .at_row::<u8>(row as i32)
                .map_err(|e| ScanError::opencv("Descriptor row access", e))?;
            features.keypoints.push(KeyPoint::new(pt.x, pt.y));
            features.descriptors.push(bytes.to_vec());
        }
        Ok(features)
    }

    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Result<Vec<DescriptorMatch>> {
        if query.is_empty() || train.is_empty() {
            return Ok(Vec::new());
        }
        let query_mat = Self::descriptors_to_mat(query)?;
        let train_mat = Self::descriptors_to_mat(train)?;

        let matcher = BFMatcher::create(NORM_HAMMING, true).map_err(|e| ScanError::opencv("BFMatcher creation", e))?;
        let mut matches = Vector::<DMatch>::new();
        matcher
            .train_match(&query_mat, &train_mat, &mut matches, &core::no_array())
            .map_err(|e| ScanError::opencv("Descriptor matching", e))?;

        Ok(matches
            .iter()
            .map(|m| DescriptorMatch {
                query_idx: m.query_idx as usize,
                train_idx: m.train_idx as usize,
                distance: m.distance,
            })
            .collect())
    }
}

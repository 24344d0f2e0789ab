//! Still-image puzzle analysis
//!
//! Runs segmentation → filtering → per-region profiling, edge classification
//! and reference matching, numbering pieces in discovery order, then derives
//! advisory suggestions from the piece list.

use image::RgbaImage;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::color::{ColorGroup, ColorProfiler, ColorSignature};
use crate::config::ScanConfig;
use crate::detection::{EdgeClassifier, Region, RegionFilter, SegmentMode, Segmenter};
use crate::image_loader::get_pixels;
use crate::matching::{select_matcher, MatchOutcome, MatchPosition, Reference, ReferenceMatcher};
use crate::thumbnail::{JpegThumbnailEncoder, Thumbnail, ThumbnailEncoder};
use crate::vision::VisionBackend;

/// One detected piece
#[derive(Debug, Clone, Serialize)]
pub struct PieceRecord {
    /// Discovery index within one analysis pass
    pub id: usize,
    pub region: Region,
    #[serde(skip)]
    pub thumbnail: Option<Thumbnail>,
    pub is_edge: bool,
    pub color_signature: ColorSignature,
    pub color_group: ColorGroup,
    /// Reference-space position; `None` without reference or evidence
    pub match_position: Option<MatchPosition>,
    pub match_confidence: f32,
}

/// Pieces and suggestions from one analysis pass
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub pieces: Vec<PieceRecord>,
    pub suggestions: Vec<String>,
    pub segment_mode: SegmentMode,
}

impl AnalysisResult {
    /// Group sizes, in order of each group's first piece
    pub fn color_group_counts(&self) -> Vec<(ColorGroup, usize)> {
        count_groups(&self.pieces)
    }

    pub fn pieces_in_group(&self, group: ColorGroup) -> Vec<&PieceRecord> {
        self.pieces.iter().filter(|p| p.color_group == group).collect()
    }

    pub fn edge_pieces(&self) -> Vec<&PieceRecord> {
        self.pieces.iter().filter(|p| p.is_edge).collect()
    }

    /// Pieces strictly above `threshold` confidence
    pub fn high_confidence_count(&self, threshold: f32) -> usize {
        count_confident(&self.pieces, threshold)
    }

    pub fn summary(&self) -> String {
        format!("Detected {} pieces", self.pieces.len())
    }
}

fn count_groups(pieces: &[PieceRecord]) -> Vec<(ColorGroup, usize)> {
    let mut counts: Vec<(ColorGroup, usize)> = Vec::new();
    for piece in pieces {
        match counts.iter_mut().find(|(g, _)| *g == piece.color_group) {
            Some((_, n)) => *n += 1,
            None => counts.push((piece.color_group, 1)),
        }
    }
    counts
}

fn count_confident(pieces: &[PieceRecord], threshold: f32) -> usize {
    pieces.iter().filter(|p| p.match_confidence > threshold).count()
}

/// Advisory strings, always in the same order
pub fn generate_suggestions(pieces: &[PieceRecord], has_reference: bool, high_confidence: f32) -> Vec<String> {
    let mut suggestions = vec!["Start with edge and corner pieces to build the frame".to_string()];

    let mut dominant: Option<(ColorGroup, usize)> = None;
    for (group, count) in count_groups(pieces) {
        if dominant.map_or(true, |(_, best)| count > best) {
            dominant = Some((group, count));
        }
    }
    if let Some((group, count)) = dominant {
        suggestions.push(format!(
            "Group pieces by color: {} has the most pieces ({})",
            group, count
        ));
    }

    if has_reference {
        suggestions.push("Using reference image for AI-powered piece matching".to_string());
        let confident = count_confident(pieces, high_confidence);
        if confident > 0 {
            suggestions.push(format!(
                "Found {} high-confidence matches with reference",
                confident
            ));
        }
    } else {
        suggestions.push("Tip: Upload a reference image for AI matching suggestions".to_string());
    }

    suggestions.push("Look for unique patterns and distinctive colors to guide assembly".to_string());
    suggestions
}

/// Still-image orchestrator
pub struct PuzzleAnalyzer {
    config: ScanConfig,
    segmenter: Segmenter,
    matcher: Box<dyn ReferenceMatcher>,
    profiler: ColorProfiler,
    edges: EdgeClassifier,
    encoder: Box<dyn ThumbnailEncoder>,
}

impl PuzzleAnalyzer {
    /// `backend` must already be probed; `None` selects the fallbacks
    pub fn new(config: ScanConfig, backend: Option<Arc<dyn VisionBackend>>) -> Self {
        Self {
            segmenter: Segmenter::new(backend.clone(), config.segmentation.grid_size),
            matcher: select_matcher(backend, &config.matching),
            profiler: ColorProfiler::new(config.color.sample_stride),
            edges: EdgeClassifier::new(config.edge.margin),
            encoder: Box::new(JpegThumbnailEncoder::default()),
            config,
        }
    }

    pub fn with_thumbnail_encoder(mut self, encoder: Box<dyn ThumbnailEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Detect, classify and (with a reference) place every piece in `image`
    pub fn analyze(&self, image: &RgbaImage, reference: Option<&Reference>) -> AnalysisResult {
        let started = Instant::now();
        let (width, height) = image.dimensions();

        let segmentation = self.segmenter.segment(image);
        let filter = RegionFilter::for_mode(segmentation.mode, &self.config.filter, &self.config.segmentation);
        let candidates = segmentation.regions.len();

        let mut pieces = Vec::new();
        for region in segmentation.regions {
            if !filter.accept(&region, width, height) {
                continue;
            }
            let pixels = get_pixels(image, region.x, region.y, region.width, region.height);
            if filter.is_background(&pixels) {
                continue;
            }

            let signature = self.profiler.profile(&pixels);
            let span = EdgeClassifier::reference_span(segmentation.mode, &region, self.segmenter.grid_size());
            let outcome = reference
                .map(|r| self.matcher.find_match(&pixels, signature, r))
                .unwrap_or_else(MatchOutcome::none);

            let thumbnail = match self.encoder.encode(&pixels) {
                Ok(thumb) => Some(thumb),
                Err(e) => {
                    warn!("Thumbnail for piece {} unavailable: {}", pieces.len(), e);
                    None
                }
            };

            pieces.push(PieceRecord {
                id: pieces.len(),
                region,
                thumbnail,
                is_edge: self.edges.is_edge(&region, width, height, span),
                color_signature: signature,
                color_group: ColorGroup::classify(signature),
                match_position: outcome.position,
                match_confidence: outcome.confidence,
            });
        }

        debug!(
            "{:?} segmentation: {} candidates, {} pieces",
            segmentation.mode,
            candidates,
            pieces.len()
        );

        let suggestions = generate_suggestions(&pieces, reference.is_some(), self.config.matching.high_confidence);
        info!(
            "Detected {} pieces in {}ms (matcher: {})",
            pieces.len(),
            started.elapsed().as_millis(),
            if reference.is_some() { self.matcher.name() } else { "none" }
        );

        AnalysisResult {
            pieces,
            suggestions,
            segment_mode: segmentation.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::fake::MarkerBackend;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn fill(image: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgba<u8>) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, color);
            }
        }
    }

    fn piece(id: usize, group: ColorGroup, confidence: f32) -> PieceRecord {
        PieceRecord {
            id,
            region: Region::cell(0, 0, 60),
            thumbnail: None,
            is_edge: false,
            color_signature: ColorSignature::default(),
            color_group: group,
            match_position: None,
            match_confidence: confidence,
        }
    }

    #[test]
    fn test_suggestions_without_reference() {
        let pieces = vec![piece(0, ColorGroup::Red, 0.0), piece(1, ColorGroup::Blue, 0.0), piece(2, ColorGroup::Blue, 0.0)];
        let suggestions = generate_suggestions(&pieces, false, 70.0);
        assert_eq!(
            suggestions,
            vec![
                "Start with edge and corner pieces to build the frame",
                "Group pieces by color: Blue has the most pieces (2)",
                "Tip: Upload a reference image for AI matching suggestions",
                "Look for unique patterns and distinctive colors to guide assembly",
            ]
        );
    }

    #[test]
    fn test_suggestions_with_reference() {
        let pieces = vec![piece(0, ColorGroup::Green, 71.0), piece(1, ColorGroup::Green, 70.0)];
        let suggestions = generate_suggestions(&pieces, true, 70.0);
        assert_eq!(suggestions.len(), 5);
        assert_eq!(suggestions[2], "Using reference image for AI-powered piece matching");
        assert_eq!(suggestions[3], "Found 1 high-confidence matches with reference");
    }

    #[test]
    fn test_high_confidence_count_agrees_with_suggestion() {
        let result = AnalysisResult {
            pieces: vec![
                piece(0, ColorGroup::Green, 95.0),
                piece(1, ColorGroup::Green, 70.0),
                piece(2, ColorGroup::Red, 70.5),
                piece(3, ColorGroup::Red, 0.0),
            ],
            suggestions: Vec::new(),
            segment_mode: SegmentMode::Grid,
        };

        assert_eq!(result.high_confidence_count(70.0), 2);
        assert_eq!(result.high_confidence_count(95.0), 0);
        let suggestions = generate_suggestions(&result.pieces, true, 70.0);
        assert_eq!(suggestions[3], "Found 2 high-confidence matches with reference");
    }

    #[test]
    fn test_suggestions_for_empty_result() {
        let suggestions = generate_suggestions(&[], true, 70.0);
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions[1].starts_with("Using reference image"));
    }

    #[test]
    fn test_dominant_group_tie_keeps_first_seen() {
        let pieces = vec![piece(0, ColorGroup::Dark, 0.0), piece(1, ColorGroup::Light, 0.0)];
        let suggestions = generate_suggestions(&pieces, false, 70.0);
        assert_eq!(suggestions[1], "Group pieces by color: Dark has the most pieces (1)");
    }

    #[test]
    fn test_grid_analysis_skips_background() {
        let mut image = RgbaImage::from_pixel(180, 120, WHITE);
        fill(&mut image, 60, 0, 60, 60, Rgba([30, 30, 200, 255]));
        fill(&mut image, 0, 60, 60, 60, Rgba([30, 200, 30, 255]));

        let result = PuzzleAnalyzer::new(ScanConfig::default(), None).analyze(&image, None);
        assert_eq!(result.segment_mode, SegmentMode::Grid);
        assert_eq!(result.pieces.len(), 2);
        assert_eq!(result.pieces[0].color_group, ColorGroup::Blue);
        assert_eq!((result.pieces[0].region.x, result.pieces[0].region.y), (60, 0));
        assert_eq!(result.pieces[1].color_group, ColorGroup::Green);
        assert_eq!(result.pieces[1].id, 1);
        assert!(result.pieces.iter().all(|p| p.thumbnail.is_some()));
        assert!(result.pieces.iter().all(|p| p.match_position.is_none() && p.match_confidence == 0.0));
        assert_eq!(
            result.color_group_counts(),
            vec![(ColorGroup::Blue, 1), (ColorGroup::Green, 1)]
        );
        assert_eq!(result.pieces_in_group(ColorGroup::Green).len(), 1);
        assert_eq!(result.summary(), "Detected 2 pieces");
    }

    #[test]
    fn test_contour_analysis_with_feature_matching() {
        // scattered pieces: one dark block carrying ten markers
        let mut image = RgbaImage::from_pixel(300, 300, WHITE);
        fill(&mut image, 100, 120, 50, 40, Rgba([40, 40, 40, 255]));
        for i in 0..10u32 {
            let v = 101 + i as u8 * 2;
            image.put_pixel(105 + i * 3, 140, Rgba([v, v, v, 255]));
        }

        // reference: same markers around (60, 40)
        let mut reference_image = RgbaImage::from_pixel(200, 100, WHITE);
        for i in 0..10u32 {
            let v = 101 + i as u8 * 2;
            reference_image.put_pixel(51 + i * 2, 40, Rgba([v, v, v, 255]));
        }

        let backend: Arc<dyn VisionBackend> = Arc::new(MarkerBackend::new());
        let reference = Reference::new(reference_image, Some(backend.as_ref()), 2000);
        let analyzer = PuzzleAnalyzer::new(ScanConfig::default(), Some(backend));
        let result = analyzer.analyze(&image, Some(&reference));

        assert_eq!(result.segment_mode, SegmentMode::Contour);
        assert_eq!(result.pieces.len(), 1);
        let piece = &result.pieces[0];
        assert_eq!((piece.region.x, piece.region.y, piece.region.width, piece.region.height), (100, 120, 50, 40));
        assert_eq!(piece.match_position, Some(MatchPosition { x: 60, y: 40 }));
        assert!(piece.match_confidence > 0.0);
        assert!(!piece.is_edge);
    }

    struct BrokenEncoder;

    impl ThumbnailEncoder for BrokenEncoder {
        fn encode(&self, _pixels: &RgbaImage) -> crate::Result<Thumbnail> {
            Err(crate::ScanError::ProcessingError("encoder offline".into()))
        }
    }

    #[test]
    fn test_thumbnail_failure_keeps_piece() {
        let mut image = RgbaImage::from_pixel(120, 120, WHITE);
        fill(&mut image, 0, 0, 60, 60, Rgba([200, 30, 30, 255]));
        let analyzer = PuzzleAnalyzer::new(ScanConfig::default(), None).with_thumbnail_encoder(Box::new(BrokenEncoder));

        let result = analyzer.analyze(&image, None);
        assert_eq!(result.pieces.len(), 1);
        assert!(result.pieces[0].thumbnail.is_none());
    }

    #[test]
    fn test_results_serialize_without_thumbnails() {
        let mut image = RgbaImage::from_pixel(120, 120, WHITE);
        fill(&mut image, 0, 0, 60, 60, Rgba([200, 30, 30, 255]));
        let result = PuzzleAnalyzer::new(ScanConfig::default(), None).analyze(&image, None);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pieces"][0]["color_group"], "Red");
        assert!(json["pieces"][0].get("thumbnail").is_none());
        assert_eq!(json["segment_mode"], "Grid");
    }
}

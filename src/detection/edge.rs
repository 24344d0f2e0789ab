//! Border/interior classification
//!
//! A heuristic on the region origin, not a geometric border test. With the
//! asymmetric margin a region counts as an edge piece when its origin is
//! within one span of the left or top border, or within two spans of the
//! right or bottom border.

use super::{Region, SegmentMode};
use crate::config::EdgeMargin;

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeClassifier {
    margin: EdgeMargin,
}

impl EdgeClassifier {
    pub fn new(margin: EdgeMargin) -> Self {
        Self { margin }
    }

    /// Span used for a region: its own largest dimension for contours, the
    /// cell size for grid cells
    pub fn reference_span(mode: SegmentMode, region: &Region, grid_size: u32) -> u32 {
        match mode {
            SegmentMode::Contour => region.span(),
            SegmentMode::Grid => grid_size,
        }
    }

    pub fn is_edge(&self, region: &Region, image_width: u32, image_height: u32, span: u32) -> bool {
        let (x, y, span) = (region.x as i64, region.y as i64, span as i64);
        let (w, h) = (image_width as i64, image_height as i64);

        if x < span || y < span {
            return true;
        }
        match self.margin {
            EdgeMargin::Asymmetric => x > w - span * 2 || y > h - span * 2,
            EdgeMargin::Symmetric => {
                x + region.width as i64 > w - span || y + region.height as i64 > h - span
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asymmetric_margins() {
        let classifier = EdgeClassifier::default();
        let at = |x, y| Region::cell(x, y, 60);

        // left/top: within one span
        assert!(classifier.is_edge(&at(59, 300), 600, 600, 60));
        assert!(!classifier.is_edge(&at(60, 300), 600, 600, 60));
        assert!(classifier.is_edge(&at(300, 0), 600, 600, 60));

        // right/bottom: within two spans (600 - 120 = 480)
        assert!(!classifier.is_edge(&at(480, 300), 600, 600, 60));
        assert!(classifier.is_edge(&at(481, 300), 600, 600, 60));
        assert!(classifier.is_edge(&at(300, 481), 600, 600, 60));
    }

    #[test]
    fn test_symmetric_margins() {
        let classifier = EdgeClassifier::new(EdgeMargin::Symmetric);
        let at = |x, y| Region::cell(x, y, 60);

        // far edge at 540 is exactly one span from the border
        assert!(!classifier.is_edge(&at(480, 300), 600, 600, 60));
        assert!(classifier.is_edge(&at(481, 300), 600, 600, 60));
        assert!(!classifier.is_edge(&at(420, 420), 600, 600, 60));
    }

    #[test]
    fn test_small_image_is_all_edge() {
        let classifier = EdgeClassifier::default();
        assert!(classifier.is_edge(&Region::cell(60, 60, 60), 120, 120, 60));
    }

    #[test]
    fn test_reference_span_by_mode() {
        let region = Region::new(0, 0, 45, 80, 2000.0);
        assert_eq!(EdgeClassifier::reference_span(SegmentMode::Contour, &region, 60), 80);
        assert_eq!(EdgeClassifier::reference_span(SegmentMode::Grid, &region, 60), 60);
    }
}

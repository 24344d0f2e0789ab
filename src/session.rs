//! Puzzle session: owned state shared by still and live modes
//!
//! The session holds the probed capability, the current reference and the
//! latest live snapshot. The reference and the snapshot are immutable
//! `Arc` values replaced as a whole, so a reader holding an old one keeps a
//! consistent view while the session moves on.

use image::RgbaImage;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::{AnalysisResult, PuzzleAnalyzer};
use crate::config::ScanConfig;
use crate::live::{
    render_overlay, CaptureDevice, DisplaySize, DrawCommand, FrameThrottle, LiveFrameProcessor, LiveSnapshot,
};
use crate::matching::Reference;
use crate::vision::{self, VisionBackend};
use crate::{Result, ScanError};

pub struct PuzzleSession {
    config: ScanConfig,
    backend: Option<Arc<dyn VisionBackend>>,
    analyzer: PuzzleAnalyzer,
    processor: LiveFrameProcessor,
    reference: Option<Arc<Reference>>,
    snapshot: Arc<LiveSnapshot>,
    throttle: FrameThrottle,
    device: Option<Box<dyn CaptureDevice>>,
}

impl PuzzleSession {
    /// Probe `backend` once and build the matching strategies
    pub fn new(config: ScanConfig, backend: Option<Arc<dyn VisionBackend>>) -> Self {
        let backend = vision::probe(backend);
        Self {
            analyzer: PuzzleAnalyzer::new(config.clone(), backend.clone()),
            processor: LiveFrameProcessor::new(backend.clone(), &config),
            throttle: FrameThrottle::new(Duration::from_millis(config.live.process_interval_ms)),
            backend,
            reference: None,
            snapshot: Arc::new(LiveSnapshot::empty()),
            device: None,
            config,
        }
    }

    /// Session using the OpenCV backend when built with the `opencv` feature
    pub fn with_default_backend(config: ScanConfig) -> Self {
        #[cfg(feature = "opencv")]
        let backend: Option<Arc<dyn VisionBackend>> =
            Some(Arc::new(vision::OpenCvBackend::new(&config.segmentation)));
        #[cfg(not(feature = "opencv"))]
        let backend: Option<Arc<dyn VisionBackend>> = None;

        Self::new(config, backend)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// True when contour segmentation and feature matching are available
    pub fn has_capability(&self) -> bool {
        self.backend.is_some()
    }

    /// Still-image analysis against the current reference, if any
    pub fn analyze(&self, image: &RgbaImage) -> AnalysisResult {
        self.analyzer.analyze(image, self.reference.as_deref())
    }

    /// Replace the reference and recompute its features
    ///
    /// Live matches computed against the previous reference are dropped.
    pub fn load_reference(&mut self, image: RgbaImage) -> Arc<Reference> {
        let reference = Arc::new(Reference::new(
            image,
            self.backend.as_deref(),
            self.config.matching.reference_features,
        ));
        info!(
            "Loaded reference {}x{} ({} keypoints)",
            reference.width(),
            reference.height(),
            reference.keypoint_count()
        );
        self.reference = Some(Arc::clone(&reference));
        self.snapshot = Arc::new(LiveSnapshot::empty());
        reference
    }

    pub fn clear_reference(&mut self) {
        self.reference = None;
        self.snapshot = Arc::new(LiveSnapshot::empty());
    }

    pub fn reference(&self) -> Option<Arc<Reference>> {
        self.reference.clone()
    }

    /// Enter live mode with `device`
    ///
    /// Requires a loaded reference; the device is not touched otherwise.
    /// Acquisition failures are returned as is, with no retry.
    pub fn start_live(&mut self, mut device: Box<dyn CaptureDevice>) -> Result<()> {
        if self.reference.is_none() {
            return Err(ScanError::input_unavailable("reference image"));
        }
        self.stop_live();

        if let Err(e) = device.acquire() {
            device.release();
            return Err(e);
        }
        if !self.has_capability() {
            warn!("Live mode started without a vision backend: no matches will be produced");
        }

        self.throttle.reset();
        self.snapshot = Arc::new(LiveSnapshot::empty());
        self.device = Some(device);
        info!("Live mode started");
        Ok(())
    }

    /// Leave live mode and release the device; no-op when not live
    pub fn stop_live(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            info!("Live mode stopped");
        }
    }

    pub fn is_live(&self) -> bool {
        self.device.is_some()
    }

    /// Next frame from the live device
    pub fn capture_frame(&mut self) -> Result<Option<RgbaImage>> {
        match self.device.as_mut() {
            Some(device) => device.next_frame(),
            None => Err(ScanError::input_unavailable("camera")),
        }
    }

    /// Offer a frame at monotonic time `now`; returns whether it was processed
    ///
    /// A processed frame always replaces the live snapshot, with an empty
    /// one when the cycle could not run.
    pub fn on_frame(&mut self, frame: &RgbaImage, now: Duration) -> bool {
        if !self.throttle.should_process(now) {
            return false;
        }

        let snapshot = match &self.reference {
            Some(reference) => match self.processor.process_frame(frame, reference) {
                Ok(snapshot) => snapshot,
                Err(e @ ScanError::CapabilityUnavailable { .. }) => {
                    debug!("Live cycle skipped: {}", e);
                    LiveSnapshot::empty()
                }
                Err(e) => {
                    warn!("Live cycle failed: {}", e);
                    LiveSnapshot::empty()
                }
            },
            None => LiveSnapshot::empty(),
        };
        self.snapshot = Arc::new(snapshot);
        true
    }

    /// Latest published live results
    pub fn live_snapshot(&self) -> Arc<LiveSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Overlay draw list for the current display state
    pub fn render(&self, display: DisplaySize, opacity: f32, show_grid: bool) -> Vec<DrawCommand> {
        render_overlay(
            &self.config.overlay,
            display,
            self.reference.as_deref(),
            &self.snapshot,
            opacity,
            show_grid,
        )
    }
}

impl Drop for PuzzleSession {
    fn drop(&mut self) {
        self.stop_live();
    }
}

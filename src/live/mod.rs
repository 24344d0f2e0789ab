//! Live (AR) mode
//!
//! - [`processor`]: throttled per-frame detection and matching
//! - [`scheduler`]: clock, frame throttle, capture device and tick driver
//! - [`overlay`]: display-space mapping and the per-tick draw list

pub mod processor;
pub mod scheduler;
pub mod overlay;

pub use processor::{LiveFrameProcessor, LiveMatch, LiveSnapshot, NormalizedPoint};
pub use scheduler::{CaptureDevice, Clock, FrameThrottle, LiveLoop, ManualClock, MonotonicClock};
pub use overlay::{letterbox, render_overlay, DisplaySize, DrawCommand, OverlayMapper, Point, Rect};

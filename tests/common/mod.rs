//! Shared fixtures for integration tests
//!
//! Vision work goes through the crate's own `MarkerBackend` (feature
//! `test-support`): pixels darker than 250 are foreground and every odd gray
//! value below 255 is a keypoint, so `markers` below gives exact matches.

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use jigsaw_scan::live::CaptureDevice;
use jigsaw_scan::vision::fake::MarkerBackend;
use jigsaw_scan::vision::VisionBackend;
use jigsaw_scan::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const RED: Rgba<u8> = Rgba([200, 30, 30, 255]);

pub fn grey(v: u8) -> Rgba<u8> {
    Rgba([v, v, v, 255])
}

pub fn white(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}

pub fn fill(image: &mut RgbaImage, x0: u32, y0: u32, width: u32, height: u32, color: Rgba<u8>) {
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            image.put_pixel(x, y, color);
        }
    }
}

/// Put `count` distinct markers in a row, `spacing` apart
pub fn markers(image: &mut RgbaImage, x0: u32, y: u32, spacing: u32, count: u8) {
    for i in 0..count {
        image.put_pixel(x0 + i as u32 * spacing, y, grey(101 + i * 2));
    }
}

pub fn marker_backend() -> Option<Arc<dyn VisionBackend>> {
    Some(Arc::new(MarkerBackend::new()))
}

#[derive(Default)]
pub struct DeviceLog {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
}

impl DeviceLog {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Capture device replaying a fixed list of frames
pub struct ReplayDevice {
    frames: VecDeque<RgbaImage>,
    log: Arc<DeviceLog>,
}

impl ReplayDevice {
    pub fn boxed(frames: Vec<RgbaImage>, log: &Arc<DeviceLog>) -> Box<Self> {
        Box::new(Self {
            frames: frames.into(),
            log: Arc::clone(log),
        })
    }
}

impl CaptureDevice for ReplayDevice {
    fn acquire(&mut self) -> Result<()> {
        self.log.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        self.log.released.fetch_add(1, Ordering::SeqCst);
    }

    fn next_frame(&mut self) -> Result<Option<RgbaImage>> {
        Ok(self.frames.pop_front())
    }
}

//! Live-mode scheduling
//!
//! Rendering happens every tick; detection is throttled to one cycle per
//! interval of an injected monotonic clock. Stopping the loop only means no
//! further ticks are scheduled.

use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::overlay::{DisplaySize, DrawCommand};
use crate::session::PuzzleSession;
use crate::Result;

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time from [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand, for replays and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// At most one processing cycle per interval
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_processed: Option<Duration>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_processed: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True (and records `now`) when more than the interval has passed since
    /// the last processed frame. The first frame always processes.
    pub fn should_process(&mut self, now: Duration) -> bool {
        let due = match self.last_processed {
            None => true,
            Some(last) => now.saturating_sub(last) > self.interval,
        };
        if due {
            self.last_processed = Some(now);
        }
        due
    }

    pub fn reset(&mut self) {
        self.last_processed = None;
    }
}

/// Source of live video frames
pub trait CaptureDevice: Send {
    /// Open the device; called once on live-mode entry
    fn acquire(&mut self) -> Result<()>;

    /// Close the device; must be safe to call when not acquired
    fn release(&mut self);

    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<RgbaImage>>;
}

/// Drives a live session one display tick at a time
pub struct LiveLoop<C: Clock> {
    clock: C,
    display: DisplaySize,
    opacity: f32,
    show_grid: bool,
}

impl<C: Clock> LiveLoop<C> {
    pub fn new(clock: C, display: DisplaySize) -> Self {
        Self {
            clock,
            display,
            opacity: 0.5,
            show_grid: false,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn set_display(&mut self, display: DisplaySize) {
        self.display = display;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        self.show_grid = show_grid;
    }

    /// Fetch a frame, offer it for processing, and render
    ///
    /// `Ok(None)` when the session is not live or the stream ended; the
    /// caller should then stop scheduling ticks. A capture error stops
    /// live mode and is returned.
    pub fn tick(&self, session: &mut PuzzleSession) -> Result<Option<Vec<DrawCommand>>> {
        if !session.is_live() {
            return Ok(None);
        }

        let frame = match session.capture_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                session.stop_live();
                return Ok(None);
            }
            Err(e) => {
                session.stop_live();
                return Err(e);
            }
        };

        session.on_frame(&frame, self.clock.now());
        Ok(Some(session.render(self.display, self.opacity, self.show_grid)))
    }

    /// Tick until the session stops or `max_ticks` have run; returns the
    /// number of rendered ticks
    pub fn run(&self, session: &mut PuzzleSession, max_ticks: usize) -> Result<usize> {
        let mut rendered = 0;
        while rendered < max_ticks {
            match self.tick(session)? {
                Some(_) => rendered += 1,
                None => break,
            }
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_throttle_interval_is_strict() {
        let mut throttle = FrameThrottle::new(ms(500));
        assert!(throttle.should_process(ms(0)));
        assert!(!throttle.should_process(ms(16)));
        assert!(!throttle.should_process(ms(500)));
        assert!(throttle.should_process(ms(501)));
        assert!(!throttle.should_process(ms(1000)));
        assert!(throttle.should_process(ms(1002)));
    }

    #[test]
    fn test_throttle_ignores_clock_going_backwards() {
        let mut throttle = FrameThrottle::new(ms(500));
        assert!(throttle.should_process(ms(2000)));
        assert!(!throttle.should_process(ms(100)));
        assert!(throttle.should_process(ms(2501)));
    }

    #[test]
    fn test_throttle_reset() {
        let mut throttle = FrameThrottle::new(ms(500));
        assert!(throttle.should_process(ms(10)));
        throttle.reset();
        assert!(throttle.should_process(ms(20)));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        clock.advance(ms(250));
        clock.advance(ms(250));
        assert_eq!(clock.now(), ms(500));
        clock.set(ms(42));
        assert_eq!(clock.now(), ms(42));
    }

    #[test]
    fn test_monotonic_clock_does_not_go_back() {
        let clock = MonotonicClock::default();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}

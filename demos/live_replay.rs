//! Replay a sequence of still frames through live mode
//!
//! Each file stands in for one camera frame, spaced `--frame-ms` apart on a
//! manual clock. Prints the match list after every render tick.

use flexi_logger::Logger;
use jigsaw_scan::image_loader::load_image;
use jigsaw_scan::live::{CaptureDevice, Clock, LiveLoop, ManualClock};
use jigsaw_scan::{DisplaySize, PuzzleSession, Result, ScanConfig, ScanError};
use image::RgbaImage;
use std::collections::VecDeque;
use std::time::Duration;
use std::{env, path::PathBuf, process};

struct FileSequence {
    pending: VecDeque<PathBuf>,
}

impl CaptureDevice for FileSequence {
    fn acquire(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Err(ScanError::acquisition(
                "frame sequence",
                std::io::Error::new(std::io::ErrorKind::NotFound, "no frames given"),
            ));
        }
        Ok(())
    }

    fn release(&mut self) {
        self.pending.clear();
    }

    fn next_frame(&mut self) -> Result<Option<RgbaImage>> {
        match self.pending.pop_front() {
            Some(path) => load_image(&path).map(Some),
            None => Ok(None),
        }
    }
}

fn main() {
    let _logger = Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.log_to_stderr().start())
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));

    let mut args: VecDeque<String> = env::args().skip(1).collect();
    let mut frame_ms = 100u64;
    if args.front().map(String::as_str) == Some("--frame-ms") {
        args.pop_front();
        frame_ms = args
            .pop_front()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| usage());
    }
    let Some(reference_path) = args.pop_front() else { usage() };
    if args.is_empty() {
        usage();
    }

    let mut session = PuzzleSession::with_default_backend(ScanConfig::default());
    if !session.has_capability() {
        eprintln!("Note: built without a vision backend, live mode will report no matches");
    }
    match load_image(PathBuf::from(&reference_path).as_path()) {
        Ok(reference) => {
            session.load_reference(reference);
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            process::exit(1);
        }
    }

    let device = FileSequence {
        pending: args.into_iter().map(PathBuf::from).collect(),
    };
    if let Err(e) = session.start_live(Box::new(device)) {
        eprintln!("{}", e.user_message());
        process::exit(1);
    }

    let live = LiveLoop::new(ManualClock::new(), DisplaySize::new(1280.0, 720.0));
    let mut tick = 0;
    loop {
        match live.tick(&mut session) {
            Ok(Some(commands)) => {
                let snapshot = session.live_snapshot();
                println!(
                    "t={:>6}ms  {} matches, {} draw commands",
                    live.clock().now().as_millis(),
                    snapshot.matches.len(),
                    commands.len()
                );
                for m in &snapshot.matches {
                    println!(
                        "    piece at ({}, {}) -> ({:.2}, {:.2}) {}%",
                        m.region.x, m.region.y, m.target.x, m.target.y, m.confidence
                    );
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("Live replay stopped: {}", e);
                process::exit(1);
            }
        }
        tick += 1;
        live.clock().advance(Duration::from_millis(frame_ms));
    }
    eprintln!("Replayed {} frames", tick);
}

fn usage() -> ! {
    eprintln!("Usage: live_replay [--frame-ms N] <reference_image> <frame>...");
    process::exit(1);
}

//! Overlay coordinate mapping and draw list
//!
//! Everything is recomputed on each render call from the current display
//! size, so resizing or changing the opacity takes effect on the next tick.
//!
//! Spaces involved:
//! - processing frame: the downscaled frame live regions were found in
//! - reference: matches carry targets as fractions of the reference size
//! - display: the canvas the overlay is drawn on

use palette::Srgba;
use serde::Serialize;

use super::processor::{LiveMatch, LiveSnapshot, NormalizedPoint};
use crate::config::OverlayConfig;
use crate::detection::Region;
use crate::matching::Reference;

pub const BOX_COLOR: Srgba<u8> = Srgba::new(0, 255, 0, 255);
pub const TARGET_COLOR: Srgba<u8> = Srgba::new(255, 255, 0, 255);
pub const GRID_COLOR: Srgba<u8> = Srgba::new(255, 255, 255, 77);
pub const CROSSHAIR_COLOR: Srgba<u8> = Srgba::new(255, 0, 0, 128);

const MATCH_LINE_WIDTH: f32 = 3.0;
const GRID_LINE_WIDTH: f32 = 1.0;
const CROSSHAIR_LINE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Fit an `image_width`x`image_height` image inside `display`, keeping its
/// aspect ratio and centring it along the axis with spare room
pub fn letterbox(display: DisplaySize, image_width: u32, image_height: u32) -> Rect {
    if image_width == 0 || image_height == 0 || display.height <= 0.0 {
        return Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let display_aspect = display.width / display.height;
    let image_aspect = image_width as f32 / image_height as f32;
    if image_aspect > display_aspect {
        let height = display.width / image_aspect;
        Rect {
            x: 0.0,
            y: (display.height - height) / 2.0,
            width: display.width,
            height,
        }
    } else {
        let width = display.height * image_aspect;
        Rect {
            x: (display.width - width) / 2.0,
            y: 0.0,
            width,
            height: display.height,
        }
    }
}

/// Maps live results into display space
#[derive(Debug, Clone, Copy)]
pub struct OverlayMapper {
    scale_x: f32,
    scale_y: f32,
    placement: Rect,
}

impl OverlayMapper {
    /// `placement` is where the reference is drawn on the display
    pub fn new(display: DisplaySize, frame_width: u32, frame_height: u32, placement: Rect) -> Self {
        let scale = |display: f32, frame: u32| if frame == 0 { 0.0 } else { display / frame as f32 };
        Self {
            scale_x: scale(display.width, frame_width),
            scale_y: scale(display.height, frame_height),
            placement,
        }
    }

    /// Processing-frame region to display rectangle, axes scaled independently
    pub fn map_region(&self, region: &Region) -> Rect {
        Rect {
            x: region.x as f32 * self.scale_x,
            y: region.y as f32 * self.scale_y,
            width: region.width as f32 * self.scale_x,
            height: region.height as f32 * self.scale_y,
        }
    }

    /// Normalised reference point to display point
    pub fn map_target(&self, target: NormalizedPoint) -> Point {
        Point::new(
            self.placement.x + target.x * self.placement.width,
            self.placement.y + target.y * self.placement.height,
        )
    }
}

/// One drawing instruction, in display coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    /// The reference image, stretched into `rect`
    Reference { rect: Rect, opacity: f32 },
    StrokeRect { rect: Rect, color: Srgba<u8>, width: f32 },
    Line { from: Point, to: Point, color: Srgba<u8>, width: f32 },
    FillCircle { center: Point, radius: f32, color: Srgba<u8> },
    Label { text: String, position: Point, color: Srgba<u8> },
}

/// Draw list for one render tick
///
/// Order: reference image (opacity above zero), then per match its box,
/// target line, target dot and confidence label, then the guide grid and
/// centre crosshair when `show_grid` is set. Matches are drawn only while
/// they refer to the current reference.
pub fn render_overlay(
    config: &OverlayConfig,
    display: DisplaySize,
    reference: Option<&Reference>,
    snapshot: &LiveSnapshot,
    opacity: f32,
    show_grid: bool,
) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    let opacity = opacity.clamp(0.0, 1.0);

    if let Some(reference) = reference {
        let placement = letterbox(display, reference.width(), reference.height());
        if opacity > 0.0 {
            commands.push(DrawCommand::Reference {
                rect: placement,
                opacity,
            });
        }

        if snapshot.reference_generation == Some(reference.generation()) {
            let mapper = OverlayMapper::new(display, snapshot.frame_width, snapshot.frame_height, placement);
            for live_match in &snapshot.matches {
                push_match(&mut commands, config, &mapper, live_match);
            }
        }
    }

    if show_grid {
        push_grid(&mut commands, config, display);
    }
    commands
}

fn push_match(commands: &mut Vec<DrawCommand>, config: &OverlayConfig, mapper: &OverlayMapper, live_match: &LiveMatch) {
    let rect = mapper.map_region(&live_match.region);
    let target = mapper.map_target(live_match.target);

    commands.push(DrawCommand::StrokeRect {
        rect,
        color: BOX_COLOR,
        width: MATCH_LINE_WIDTH,
    });
    commands.push(DrawCommand::Line {
        from: rect.center(),
        to: target,
        color: TARGET_COLOR,
        width: MATCH_LINE_WIDTH,
    });
    commands.push(DrawCommand::FillCircle {
        center: target,
        radius: config.target_radius,
        color: TARGET_COLOR,
    });
    commands.push(DrawCommand::Label {
        text: format!("{}%", live_match.confidence),
        position: Point::new(rect.x, rect.y - config.label_offset),
        color: BOX_COLOR,
    });
}

fn push_grid(commands: &mut Vec<DrawCommand>, config: &OverlayConfig, display: DisplaySize) {
    let spacing = config.grid_spacing.max(1) as f32;
    let line = |from: Point, to: Point| DrawCommand::Line {
        from,
        to,
        color: GRID_COLOR,
        width: GRID_LINE_WIDTH,
    };

    let mut x = 0.0;
    while x < display.width {
        commands.push(line(Point::new(x, 0.0), Point::new(x, display.height)));
        x += spacing;
    }
    let mut y = 0.0;
    while y < display.height {
        commands.push(line(Point::new(0.0, y), Point::new(display.width, y)));
        y += spacing;
    }

    let (cx, cy) = (display.width / 2.0, display.height / 2.0);
    let half = config.crosshair_half_length;
    for (from, to) in [
        (Point::new(cx - half, cy), Point::new(cx + half, cy)),
        (Point::new(cx, cy - half), Point::new(cx, cy + half)),
    ] {
        commands.push(DrawCommand::Line {
            from,
            to,
            color: CROSSHAIR_COLOR,
            width: CROSSHAIR_LINE_WIDTH,
        });
    }
}

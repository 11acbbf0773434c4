//! Repainting the board onto a canvas-like raster surface.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use kurbo::{BezPath, Point};
use log::debug;
use meetboard_core::board::Board;
use meetboard_core::presence::CursorTracker;
use meetboard_core::stroke::{Stroke, StrokeMode};
use meetboard_core::view::ViewTransform;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("png encode failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("surface error: {0}")]
    Surface(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Highlighter strokes paint at this opacity over normal compositing.
pub const HIGHLIGHTER_OPACITY: f64 = 0.35;

/// Screen-space radius of a remote cursor dot.
const CURSOR_DOT_WIDTH: f64 = 8.0;

/// Palette for remote cursor dots, picked by author hash.
const CURSOR_COLORS: [Rgba; 5] = [
    Rgba::rgb(0x3b, 0x82, 0xf6),
    Rgba::rgb(0xef, 0x44, 0x44),
    Rgba::rgb(0xf5, 0x9e, 0x0b),
    Rgba::rgb(0x8b, 0x5c, 0xf6),
    Rgba::rgb(0x10, 0xb9, 0x81),
];

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa`; malformed input falls back
    /// to opaque black rather than failing the paint.
    pub fn parse(color: &str) -> Self {
        let Some(hex) = color.trim().strip_prefix('#') else {
            return Self::black();
        };
        // Byte-indexed slicing below; non-ASCII input is malformed anyway.
        if !hex.is_ascii() {
            return Self::black();
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).unwrap_or(0) * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).unwrap_or(0) * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).unwrap_or(0) * 17;
                Self { r, g, b, a: 255 }
            }
            6 | 8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                let a = if hex.len() == 8 {
                    u8::from_str_radix(&hex[6..8], 16).unwrap_or(255)
                } else {
                    255
                };
                Self { r, g, b, a }
            }
            _ => Self::black(),
        }
    }
}

/// How a painted path combines with existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Removes coverage instead of adding paint (eraser).
    DestinationOut,
}

/// Paint parameters for one stroked path.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePaint {
    pub color: Rgba,
    /// Screen-space line width; caps and joins are round.
    pub width: f64,
    /// Uniform opacity applied over the whole path (not per segment).
    pub opacity: f64,
    pub composite: Composite,
}

/// The canvas-like raster surface the overlay paints on.
///
/// Zero-length subpaths render as a round dot of the paint width, so a
/// one-point stroke is visible.
pub trait RasterSurface {
    /// Surface dimensions in pixels. Either dimension may be zero while
    /// the surface is unmounted; painting then no-ops.
    fn size(&self) -> (u32, u32);

    /// Reset every pixel to fully transparent.
    fn clear(&mut self);

    /// Stroke a path with round caps and joins.
    fn stroke_path(&mut self, path: &BezPath, paint: &StrokePaint);

    /// Encode the current pixels as a PNG.
    fn encode_png(&self) -> RenderResult<Vec<u8>>;
}

/// Build the screen-space path for a stroke's points: quadratic smoothing
/// through consecutive midpoints for a smooth freehand look.
pub fn stroke_path(points: &[Point], view: &ViewTransform) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };

    let start = view.to_screen(*first);
    path.move_to(start);
    if points.len() == 1 {
        path.line_to(start);
        return path;
    }

    for window in points.windows(2) {
        let prev = view.to_screen(window[0]);
        let next = view.to_screen(window[1]);
        let mid = Point::new((prev.x + next.x) / 2.0, (prev.y + next.y) / 2.0);
        path.quad_to(prev, mid);
    }
    path
}

fn paint_for(stroke: &Stroke, scale: f64) -> StrokePaint {
    let (opacity, composite) = match stroke.meta.mode {
        StrokeMode::Pen => (1.0, Composite::SourceOver),
        StrokeMode::Highlighter => (HIGHLIGHTER_OPACITY, Composite::SourceOver),
        StrokeMode::Eraser => (1.0, Composite::DestinationOut),
    };
    StrokePaint {
        color: Rgba::parse(&stroke.meta.color),
        // Width scales with zoom so strokes keep their world thickness.
        width: stroke.meta.width * scale,
        opacity,
        composite,
    }
}

fn cursor_color(author: &str) -> Rgba {
    let hash: usize = author.bytes().map(usize::from).sum();
    CURSOR_COLORS[hash % CURSOR_COLORS.len()]
}

/// Clear the surface and paint every stroke in draw order, then any fresh
/// remote cursors on top.
///
/// Stateless given its inputs; must only run after board/view mutations
/// have completed.
pub fn repaint<S: RasterSurface + ?Sized>(
    surface: &mut S,
    board: &Board,
    view: &ViewTransform,
    cursors: &CursorTracker,
) {
    let (w, h) = surface.size();
    if w == 0 || h == 0 {
        debug!("skipping repaint on unmounted surface");
        return;
    }

    surface.clear();
    for stroke in board.strokes_ordered() {
        if stroke.is_empty() {
            continue;
        }
        let path = stroke_path(&stroke.points, view);
        surface.stroke_path(&path, &paint_for(stroke, view.scale()));
    }

    for (author, world) in cursors.fresh() {
        let screen = view.to_screen(world);
        let mut dot = BezPath::new();
        dot.move_to(screen);
        dot.line_to(screen);
        surface.stroke_path(
            &dot,
            &StrokePaint {
                color: cursor_color(author),
                width: CURSOR_DOT_WIDTH,
                opacity: 1.0,
                composite: Composite::SourceOver,
            },
        );
    }
}

/// Encode the surface as a `data:image/png;base64,…` URL for snapshot
/// responses and exports.
pub fn snapshot_data_url<S: RasterSurface + ?Sized>(surface: &S) -> RenderResult<String> {
    let bytes = surface.encode_png()?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(bytes)))
}

//! MeetBoard Render Library
//!
//! The `RasterSurface` seam the overlay paints through, the board repaint
//! routine, and a software `Pixmap` surface used for snapshots, PNG export,
//! and tests. A host embedding the overlay can supply its own surface
//! backed by a native canvas instead.

pub mod pixmap;
pub mod renderer;

pub use pixmap::Pixmap;
pub use renderer::{
    repaint, snapshot_data_url, stroke_path, Composite, RasterSurface, RenderError,
    RenderResult, Rgba, StrokePaint, HIGHLIGHTER_OPACITY,
};

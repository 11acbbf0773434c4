//! MeetBoard Overlay Library
//!
//! The embeddable whiteboard overlay for a meeting client: toolbar state
//! and the session shell that ties the core board to a raster surface and
//! the meeting's shared event channel.

pub mod overlay;
pub mod toolbar;

pub use overlay::{OverlayConfig, OverlayEvent, WhiteboardOverlay};
pub use toolbar::{ToolKind, ToolSettings, MAX_WIDTH, MIN_WIDTH};

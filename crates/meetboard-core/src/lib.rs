//! MeetBoard Core Library
//!
//! State and replication logic for the collaborative whiteboard overlay:
//! view transform, stroke store, pointer input state machine, remote-cursor
//! presence, the wire protocol, and the network replicator. No rendering
//! and no transport live here; those arrive through the `RasterSurface`
//! and `EventChannel` seams.

pub mod board;
pub mod channel;
pub mod input;
pub mod presence;
pub mod protocol;
pub mod replicate;
pub mod stroke;
pub mod view;

pub use board::Board;
pub use channel::{BusEndpoint, ChannelError, ChannelResult, EventChannel, MeetingBus};
pub use input::{Brush, InputController, Modifiers, MouseButton, PointerEvent};
pub use presence::{CursorTracker, CURSOR_TTL};
pub use protocol::BoardEvent;
pub use replicate::{InboundEffect, Replicator};
pub use stroke::{Stroke, StrokeId, StrokeMeta, StrokeMode};
pub use view::{ViewTransform, MAX_SCALE, MIN_SCALE};

//! Network replication of board state over the shared event channel.
//!
//! Bridges local stroke mutations to outbound `wb_*` events and applies
//! inbound events from peers. Replication is best-effort: the local board
//! is authoritative, publish failures are logged and swallowed, and peers
//! may drift (the board is a visual aid, not a system of record).

use crate::board::Board;
use crate::channel::EventChannel;
use crate::presence::CursorTracker;
use crate::protocol::BoardEvent;
use crate::stroke::{Stroke, StrokeId, StrokeMeta};
use kurbo::Point;
use log::{debug, warn};
use serde_json::Value;

/// What an inbound event asks the overlay to do.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEffect {
    /// Board or cursor state changed; repaint.
    Repaint,
    /// A peer asked for a rendered snapshot of the board.
    SnapshotRequested,
    /// A peer delivered a rendered snapshot; for external listeners.
    Snapshot {
        from: Option<String>,
        data_url: String,
    },
    /// Presentation opened or closed elsewhere in the meeting.
    Presentation {
        active: bool,
        video_user_id: Option<String>,
    },
}

/// Outbound points accumulated for the active stroke within one frame.
#[derive(Debug, Clone)]
struct PendingDelta {
    stroke_id: StrokeId,
    meta: StrokeMeta,
    points: Vec<Point>,
}

/// Serializes local deltas onto the channel and applies peer events.
///
/// Outbound draw points are coalesced per rendering frame: the opening
/// point of a stroke is published immediately, later points buffer until
/// [`flush`](Self::flush) (called at most once per frame by the overlay) or
/// the mandatory synchronous flush in [`finish_stroke`](Self::finish_stroke).
#[derive(Debug, Default)]
pub struct Replicator {
    user_id: Option<String>,
    pending: Option<PendingDelta>,
    pending_cursor: Option<Point>,
}

impl Replicator {
    /// Create a replicator publishing under the given local user id.
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id,
            pending: None,
            pending_cursor: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    // --- Outbound ---

    /// Announce a freshly begun stroke, publishing its opening point
    /// immediately so peers see the stroke appear without frame latency.
    pub fn stroke_started<C: EventChannel>(&mut self, channel: &mut C, stroke: &Stroke) {
        self.send(
            channel,
            &BoardEvent::draw(stroke.id.clone(), &stroke.meta, stroke.points.clone()),
        );
        self.pending = Some(PendingDelta {
            stroke_id: stroke.id.clone(),
            meta: stroke.meta.clone(),
            points: Vec::new(),
        });
    }

    /// Buffer a point appended to the active stroke.
    pub fn queue_point(&mut self, point: Point) {
        match self.pending.as_mut() {
            Some(delta) => delta.points.push(point),
            None => debug!("dropping queued point with no active stroke"),
        }
    }

    /// Buffer the local cursor position for the next frame flush.
    pub fn queue_cursor(&mut self, world: Point) {
        self.pending_cursor = Some(world);
    }

    /// Frame-boundary flush: publish the buffered draw delta and cursor
    /// position, each at most once. The stroke stays active.
    pub fn flush<C: EventChannel>(&mut self, channel: &mut C) {
        if let Some(delta) = self.pending.as_mut() {
            if !delta.points.is_empty() {
                let points = std::mem::take(&mut delta.points);
                let event = BoardEvent::draw(delta.stroke_id.clone(), &delta.meta, points);
                self.send(channel, &event);
            }
        }
        if let Some(world) = self.pending_cursor.take() {
            let event = BoardEvent::Cursor {
                user_id: self.user_id.clone(),
                x: world.x,
                y: world.y,
            };
            self.send(channel, &event);
        }
    }

    /// End the active stroke, synchronously flushing any buffered points.
    /// No point is ever dropped between stroke end and network flush.
    pub fn finish_stroke<C: EventChannel>(&mut self, channel: &mut C) {
        self.flush(channel);
        self.pending = None;
    }

    /// Drop buffered state without publishing (overlay close).
    pub fn cancel_pending(&mut self) {
        self.pending = None;
        self.pending_cursor = None;
    }

    /// Publish a board-wide clear.
    pub fn publish_clear<C: EventChannel>(&mut self, channel: &mut C) {
        let event = BoardEvent::Clear {
            user_id: self.user_id.clone(),
        };
        self.send(channel, &event);
    }

    /// Ask peers for a rendered snapshot.
    pub fn request_snapshot<C: EventChannel>(&mut self, channel: &mut C) {
        let event = BoardEvent::SnapshotRequest {
            user_id: self.user_id.clone(),
        };
        self.send(channel, &event);
    }

    /// Answer a snapshot request with a rendered image.
    pub fn publish_snapshot<C: EventChannel>(&mut self, channel: &mut C, data_url: String) {
        let event = BoardEvent::SnapshotResponse {
            data_url,
            user_id: self.user_id.clone(),
        };
        self.send(channel, &event);
    }

    fn send<C: EventChannel>(&self, channel: &mut C, event: &BoardEvent) {
        // Best-effort: local state is authoritative and never rolled back.
        if let Err(err) = channel.publish(event.to_value()) {
            warn!("board publish failed: {err}");
        }
    }

    // --- Inbound ---

    /// Apply one raw channel payload.
    ///
    /// Non-whiteboard and malformed payloads return `None` and are ignored.
    pub fn apply(
        &mut self,
        board: &mut Board,
        cursors: &mut CursorTracker,
        payload: &Value,
    ) -> Option<InboundEffect> {
        let event = match BoardEvent::from_value(payload) {
            Some(event) => event,
            None => {
                debug!("ignoring non-board payload on shared channel");
                return None;
            }
        };

        match event {
            BoardEvent::Draw {
                stroke_id,
                user_id,
                mode,
                color,
                width,
                points,
            } => {
                let meta = StrokeMeta {
                    author: user_id,
                    mode,
                    color,
                    width,
                };
                board.ingest_remote(stroke_id, &meta, &points);
                Some(InboundEffect::Repaint)
            }
            BoardEvent::Clear { .. } => {
                board.clear_all();
                Some(InboundEffect::Repaint)
            }
            BoardEvent::Cursor { user_id, x, y } => {
                let author = user_id?;
                cursors.update(&author, Point::new(x, y));
                Some(InboundEffect::Repaint)
            }
            BoardEvent::SnapshotRequest { .. } => Some(InboundEffect::SnapshotRequested),
            BoardEvent::SnapshotResponse { data_url, user_id } => Some(InboundEffect::Snapshot {
                from: user_id,
                data_url,
            }),
            BoardEvent::PresentStart { video_user_id } => Some(InboundEffect::Presentation {
                active: true,
                video_user_id,
            }),
            BoardEvent::PresentStop { video_user_id } => Some(InboundEffect::Presentation {
                active: false,
                video_user_id,
            }),
        }
    }
}

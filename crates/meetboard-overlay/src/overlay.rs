//! The whiteboard overlay shell: wires board state, input, replication,
//! and rendering into one per-meeting session object.

use log::{debug, info, warn};
use meetboard_core::board::Board;
use meetboard_core::channel::EventChannel;
use meetboard_core::input::{InputController, PointerEvent};
use meetboard_core::presence::CursorTracker;
use meetboard_core::replicate::{InboundEffect, Replicator};
use meetboard_core::view::ViewTransform;
use meetboard_render::renderer::{repaint, snapshot_data_url, RasterSurface, RenderResult};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::toolbar::ToolSettings;

/// Per-meeting identity and permission flags for the local participant.
#[derive(Debug, Clone, Default)]
pub struct OverlayConfig {
    pub user_id: Option<String>,
    pub is_presenter: bool,
    pub allow_collaboration: bool,
}

impl OverlayConfig {
    /// Drawing is allowed for the presenter or when the host opened the
    /// board for everyone. Panning and zooming are always allowed.
    pub fn can_draw(&self) -> bool {
        self.allow_collaboration || self.is_presenter
    }
}

/// Non-repaint outcomes of a frame, surfaced to the hosting UI.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// A peer answered a snapshot request with a rendered board image.
    Snapshot {
        from: Option<String>,
        data_url: String,
    },
    /// A presentation opened or closed elsewhere in the meeting.
    Presentation {
        active: bool,
        video_user_id: Option<String>,
    },
}

/// One whiteboard session over a shared meeting event channel.
///
/// The host drives it with pointer events and one `end_frame` call per
/// rendering frame; everything else (batching, inbound application,
/// snapshot answering) happens inside.
#[derive(Debug)]
pub struct WhiteboardOverlay<C: EventChannel> {
    config: OverlayConfig,
    channel: C,
    board: Board,
    view: ViewTransform,
    cursors: CursorTracker,
    controller: InputController,
    replicator: Replicator,
    pub settings: ToolSettings,
    open: bool,
    needs_repaint: bool,
}

impl<C: EventChannel> WhiteboardOverlay<C> {
    pub fn new(config: OverlayConfig, channel: C) -> Self {
        let replicator = Replicator::new(config.user_id.clone());
        Self {
            config,
            channel,
            board: Board::new(),
            view: ViewTransform::new(),
            cursors: CursorTracker::new(),
            controller: InputController::new(),
            replicator,
            settings: ToolSettings::default(),
            open: false,
            needs_repaint: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Show the overlay. The board starts empty; peers backfill it with
    /// their own strokes as they draw.
    pub fn open(&mut self) {
        info!("whiteboard overlay opened");
        self.open = true;
        self.needs_repaint = true;
    }

    /// Hide the overlay and discard local state. Nothing is published:
    /// closing my view never clears anyone else's board.
    pub fn close(&mut self) {
        info!("whiteboard overlay closed");
        self.controller.reset(&mut self.replicator);
        self.board.clear_all();
        self.cursors.clear();
        self.view = ViewTransform::new();
        self.open = false;
    }

    /// Feed one pointer or wheel event. Returns true when the event made
    /// the board or view dirty.
    pub fn pointer_event(&mut self, event: PointerEvent) -> bool {
        if !self.open {
            return false;
        }
        let brush = self.settings.brush();
        let dirty = self.controller.handle_event(
            event,
            &brush,
            self.config.can_draw(),
            &mut self.board,
            &mut self.view,
            &mut self.replicator,
            &mut self.channel,
        );
        self.needs_repaint |= dirty;
        dirty
    }

    /// Remove the most recent local stroke from view. Local-only: peers
    /// keep rendering the stroke.
    pub fn undo(&mut self) -> bool {
        let undone = self.board.undo();
        self.needs_repaint |= undone;
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.board.redo();
        self.needs_repaint |= redone;
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.board.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.board.can_redo()
    }

    /// Clear the board for everyone in the meeting.
    pub fn clear(&mut self) {
        self.board.clear_all();
        self.replicator.publish_clear(&mut self.channel);
        self.needs_repaint = true;
    }

    /// Ask peers for a rendered board image; answers arrive later as
    /// [`OverlayEvent::Snapshot`].
    pub fn request_snapshot(&mut self) {
        self.replicator.request_snapshot(&mut self.channel);
    }

    /// Frame boundary: flush the outgoing batch, apply everything peers
    /// published since the last frame, then repaint if anything changed.
    ///
    /// Snapshot requests are answered here, after the repaint, so the
    /// published image reflects this frame's board.
    pub fn end_frame<S: RasterSurface + ?Sized>(&mut self, surface: &mut S) -> Vec<OverlayEvent> {
        let mut events = Vec::new();
        if !self.open {
            return events;
        }

        self.replicator.flush(&mut self.channel);

        let mut answer_snapshot = false;
        for payload in self.channel.poll() {
            match self.replicator.apply(&mut self.board, &mut self.cursors, &payload) {
                Some(InboundEffect::Repaint) => self.needs_repaint = true,
                Some(InboundEffect::SnapshotRequested) => answer_snapshot = true,
                Some(InboundEffect::Snapshot { from, data_url }) => {
                    events.push(OverlayEvent::Snapshot { from, data_url });
                }
                Some(InboundEffect::Presentation {
                    active,
                    video_user_id,
                }) => {
                    events.push(OverlayEvent::Presentation {
                        active,
                        video_user_id,
                    });
                }
                None => {}
            }
        }

        if self.needs_repaint || answer_snapshot {
            repaint(surface, &self.board, &self.view, &self.cursors);
            self.needs_repaint = false;
        }

        if answer_snapshot {
            debug!("answering snapshot request");
            match snapshot_data_url(surface) {
                Ok(url) => self.replicator.publish_snapshot(&mut self.channel, url),
                Err(err) => warn!("snapshot encode failed: {err}"),
            }
        }

        events
    }

    /// Render the current board to the surface and encode it as a PNG
    /// download with a timestamped filename.
    pub fn export_png<S: RasterSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> RenderResult<(String, Vec<u8>)> {
        repaint(surface, &self.board, &self.view, &self.cursors);
        self.needs_repaint = false;
        let bytes = surface.encode_png()?;
        Ok((format!("whiteboard-{}.png", now_millis()), bytes))
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use meetboard_core::channel::{BusEndpoint, MeetingBus};
    use meetboard_core::input::{Modifiers, MouseButton};
    use meetboard_render::pixmap::Pixmap;

    fn overlay(bus: &MeetingBus, user: &str, presenter: bool) -> WhiteboardOverlay<BusEndpoint> {
        let config = OverlayConfig {
            user_id: Some(user.to_string()),
            is_presenter: presenter,
            allow_collaboration: true,
        };
        let mut overlay = WhiteboardOverlay::new(config, bus.endpoint());
        overlay.open();
        overlay
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    fn up() -> PointerEvent {
        PointerEvent::Up {
            button: MouseButton::Left,
        }
    }

    fn draw_stroke(overlay: &mut WhiteboardOverlay<BusEndpoint>, points: &[(f64, f64)]) {
        overlay.pointer_event(down(points[0].0, points[0].1));
        for &(x, y) in &points[1..] {
            overlay.pointer_event(moved(x, y));
        }
        overlay.pointer_event(up());
    }

    #[test]
    fn test_scenario_draw_replicates_to_peer() {
        let bus = MeetingBus::new();
        let mut alice = overlay(&bus, "alice", false);
        let mut bob = overlay(&bus, "bob", false);
        let mut surface = Pixmap::new(64, 64);

        draw_stroke(&mut alice, &[(10.0, 10.0), (12.0, 12.0), (14.0, 14.0)]);
        alice.end_frame(&mut surface);

        assert_eq!(alice.board().len(), 1);
        let local = alice.board().strokes_ordered().next().unwrap();
        assert_eq!(local.len(), 3);
        assert_eq!(local.meta.color, "#22c55e");

        bob.end_frame(&mut surface);
        assert_eq!(bob.board().len(), 1);
        let remote = bob.board().strokes_ordered().next().unwrap();
        assert_eq!(remote.id, local.id);
        assert_eq!(remote.len(), 3);
        assert_eq!(remote.meta.author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_scenario_remote_deltas_merge() {
        let bus = MeetingBus::new();
        let mut local = overlay(&bus, "me", false);
        let mut peer = bus.endpoint();
        let mut surface = Pixmap::new(64, 64);

        let first = serde_json::json!({
            "type": "wb_draw", "strokeId": "peer1:100:ab", "userId": "peer1",
            "mode": "pen", "color": "#000000", "width": 2.0,
            "points": [{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 1.0}]
        });
        let second = serde_json::json!({
            "type": "wb_draw", "strokeId": "peer1:100:ab", "userId": "peer1",
            "mode": "pen", "color": "#000000", "width": 2.0,
            "points": [{"x": 2.0, "y": 2.0}]
        });
        peer.publish(first).unwrap();
        peer.publish(second).unwrap();

        local.end_frame(&mut surface);
        assert_eq!(local.board().len(), 1);
        assert_eq!(local.board().strokes_ordered().next().unwrap().len(), 3);
    }

    #[test]
    fn test_scenario_undo_redo_keeps_order() {
        let bus = MeetingBus::new();
        let mut local = overlay(&bus, "me", false);

        draw_stroke(&mut local, &[(0.0, 0.0), (1.0, 1.0)]);
        draw_stroke(&mut local, &[(10.0, 10.0), (11.0, 11.0)]);
        let ids: Vec<_> = local
            .board()
            .strokes_ordered()
            .map(|s| s.id.clone())
            .collect();

        assert!(local.undo());
        let visible: Vec<_> = local
            .board()
            .strokes_ordered()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(visible, ids[..1]);

        assert!(local.redo());
        let restored: Vec<_> = local
            .board()
            .strokes_ordered()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(restored, ids);
    }

    #[test]
    fn test_scenario_zoom_roundtrip() {
        let bus = MeetingBus::new();
        let mut local = overlay(&bus, "me", false);

        let world = Point::new(37.0, 91.0);
        let before = local.view().to_screen(world);

        // Wheel deltas chosen so the factors are exactly x2 then x0.5.
        let delta = 2.0f64.ln() / 0.0015;
        let anchor = Point::new(50.0, 60.0);
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        local.pointer_event(PointerEvent::Wheel {
            position: anchor,
            delta,
            modifiers: ctrl,
        });
        assert!((local.view().scale() - 2.0).abs() < 1e-9);
        local.pointer_event(PointerEvent::Wheel {
            position: anchor,
            delta: -delta,
            modifiers: ctrl,
        });

        assert!((local.view().scale() - 1.0).abs() < 1e-9);
        let after = local.view().to_screen(world);
        assert!((after.x - before.x).abs() < 1e-6);
        assert!((after.y - before.y).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_clear_propagates_and_kills_history() {
        let bus = MeetingBus::new();
        let mut alice = overlay(&bus, "alice", false);
        let mut bob = overlay(&bus, "bob", false);
        let mut surface = Pixmap::new(64, 64);

        for i in 0..5 {
            draw_stroke(&mut alice, &[(i as f64, 0.0), (i as f64, 1.0)]);
            draw_stroke(&mut bob, &[(i as f64, 10.0), (i as f64, 11.0)]);
        }
        alice.end_frame(&mut surface);
        bob.end_frame(&mut surface);
        alice.end_frame(&mut surface);
        assert_eq!(alice.board().len(), 10);
        assert_eq!(bob.board().len(), 10);

        bob.clear();
        assert!(bob.board().is_empty());
        alice.end_frame(&mut surface);
        assert!(alice.board().is_empty());

        // History went with the strokes.
        assert!(!alice.undo());
        assert!(!bob.undo());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let bus = MeetingBus::new();
        let mut alice = overlay(&bus, "alice", false);
        let mut bob = overlay(&bus, "bob", false);
        let mut alice_surface = Pixmap::new(32, 32);
        let mut bob_surface = Pixmap::new(32, 32);

        draw_stroke(&mut alice, &[(5.0, 5.0), (20.0, 20.0)]);
        alice.end_frame(&mut alice_surface);

        bob.request_snapshot();
        bob.end_frame(&mut bob_surface);

        // Alice sees the request and answers with her rendered board.
        assert!(alice.end_frame(&mut alice_surface).is_empty());

        let events = bob.end_frame(&mut bob_surface);
        match events.as_slice() {
            [OverlayEvent::Snapshot { from, data_url }] => {
                assert_eq!(from.as_deref(), Some("alice"));
                assert!(data_url.starts_with("data:image/png;base64,"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_presentation_events_surface() {
        let bus = MeetingBus::new();
        let mut local = overlay(&bus, "me", false);
        let mut peer = bus.endpoint();
        let mut surface = Pixmap::new(8, 8);

        peer.publish(serde_json::json!({ "type": "wb_present_start", "video_user_id": "host" }))
            .unwrap();
        let events = local.end_frame(&mut surface);
        assert_eq!(
            events,
            vec![OverlayEvent::Presentation {
                active: true,
                video_user_id: Some("host".to_string())
            }]
        );
    }

    #[test]
    fn test_close_is_local_only() {
        let bus = MeetingBus::new();
        let mut alice = overlay(&bus, "alice", false);
        let mut bob = overlay(&bus, "bob", false);
        let mut surface = Pixmap::new(16, 16);

        draw_stroke(&mut alice, &[(1.0, 1.0), (2.0, 2.0)]);
        alice.end_frame(&mut surface);
        bob.end_frame(&mut surface);
        assert_eq!(bob.board().len(), 1);

        bob.close();
        assert!(bob.board().is_empty());
        assert!(!bob.is_open());

        // No clear reached alice.
        alice.end_frame(&mut surface);
        assert_eq!(alice.board().len(), 1);
    }

    #[test]
    fn test_viewer_cannot_draw() {
        let bus = MeetingBus::new();
        let config = OverlayConfig {
            user_id: Some("viewer".to_string()),
            is_presenter: false,
            allow_collaboration: false,
        };
        let mut viewer = WhiteboardOverlay::new(config, bus.endpoint());
        viewer.open();

        viewer.pointer_event(down(5.0, 5.0));
        assert!(viewer.board().is_empty());
    }

    #[test]
    fn test_export_filename_and_bytes() {
        let bus = MeetingBus::new();
        let mut local = overlay(&bus, "me", false);
        let mut surface = Pixmap::new(16, 16);

        draw_stroke(&mut local, &[(4.0, 4.0), (10.0, 10.0)]);
        let (name, bytes) = local.export_png(&mut surface).unwrap();
        assert!(name.starts_with("whiteboard-"));
        assert!(name.ends_with(".png"));
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }
}

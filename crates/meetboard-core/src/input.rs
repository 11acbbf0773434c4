//! Pointer input handling: pan gestures and stroke capture.

use crate::board::Board;
use crate::channel::EventChannel;
use crate::replicate::Replicator;
use crate::stroke::{StrokeId, StrokeMode};
use crate::view::ViewTransform;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event in screen coordinates, unified over mouse/touch/pen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
    },
    Up {
        button: MouseButton,
    },
    /// Wheel motion; positive `delta` zooms in (callers negate a raw
    /// `deltaY` before passing it here).
    Wheel {
        position: Point,
        delta: f64,
        modifiers: Modifiers,
    },
}

/// Style applied to newly begun strokes.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub mode: StrokeMode,
    pub color: String,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            mode: StrokeMode::Pen,
            color: "#22c55e".to_string(),
            width: 3.0,
        }
    }
}

/// A pointer session is in exactly one of these states; transitions are
/// edge-triggered by button state and never re-entrant.
#[derive(Debug, Clone, PartialEq)]
enum PointerState {
    Idle,
    Panning { last: Point },
    Drawing { stroke: StrokeId },
}

/// Turns pointer events into pan gestures or stroke-point sequences.
///
/// Drawing requires the draw permission (collaboration allowed OR local
/// user is the presenter); without it a primary-button press is simply a
/// no-op, not an error. The controller drives the board and replicator
/// directly and reports whether a repaint is needed.
#[derive(Debug, Default)]
pub struct InputController {
    state: PointerState,
}

impl Default for PointerState {
    fn default() -> Self {
        Self::Idle
    }
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, PointerState::Drawing { .. })
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, PointerState::Panning { .. })
    }

    /// Process one pointer event. Returns true when the caller should
    /// repaint.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_event<C: EventChannel>(
        &mut self,
        event: PointerEvent,
        brush: &Brush,
        can_draw: bool,
        board: &mut Board,
        view: &mut ViewTransform,
        replicator: &mut Replicator,
        channel: &mut C,
    ) -> bool {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers, brush, can_draw, board, view, replicator, channel),
            PointerEvent::Move { position } => {
                self.pointer_move(position, board, view, replicator)
            }
            PointerEvent::Up { .. } => {
                self.pointer_up(replicator, channel);
                false
            }
            PointerEvent::Wheel {
                position,
                delta,
                modifiers,
            } => {
                if modifiers.ctrl {
                    view.zoom_at(position, delta);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Abort the session without publishing (overlay close).
    pub fn reset(&mut self, replicator: &mut Replicator) {
        self.state = PointerState::Idle;
        replicator.cancel_pending();
    }

    #[allow(clippy::too_many_arguments)]
    fn pointer_down<C: EventChannel>(
        &mut self,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        brush: &Brush,
        can_draw: bool,
        board: &mut Board,
        view: &ViewTransform,
        replicator: &mut Replicator,
        channel: &mut C,
    ) -> bool {
        if self.state != PointerState::Idle {
            return false;
        }

        // Middle-click or Shift+drag pans.
        let pans = button == MouseButton::Middle
            || (button == MouseButton::Left && modifiers.shift);
        if pans {
            self.state = PointerState::Panning { last: position };
            return false;
        }

        if button != MouseButton::Left || !can_draw {
            return false;
        }

        let world = view.to_world(position);
        let author = replicator.user_id().map(str::to_string);
        let id = board.begin_stroke(
            author.as_deref(),
            brush.mode,
            &brush.color,
            brush.width,
            world,
        );
        if let Some(stroke) = board.get(&id) {
            replicator.stroke_started(channel, stroke);
        }
        self.state = PointerState::Drawing { stroke: id };
        true
    }

    fn pointer_move(
        &mut self,
        position: Point,
        board: &mut Board,
        view: &mut ViewTransform,
        replicator: &mut Replicator,
    ) -> bool {
        match &mut self.state {
            PointerState::Panning { last } => {
                let delta = Vec2::new(position.x - last.x, position.y - last.y);
                *last = position;
                view.pan(delta);
                true
            }
            PointerState::Drawing { stroke } => {
                let world = view.to_world(position);
                let appended = board.append_point(stroke, world);
                if appended {
                    replicator.queue_point(world);
                }
                replicator.queue_cursor(world);
                appended
            }
            PointerState::Idle => {
                replicator.queue_cursor(view.to_world(position));
                false
            }
        }
    }

    fn pointer_up<C: EventChannel>(&mut self, replicator: &mut Replicator, channel: &mut C) {
        match std::mem::take(&mut self.state) {
            // Finalizing a stroke flushes buffered points before the
            // session returns to Idle.
            PointerState::Drawing { .. } => replicator.finish_stroke(channel),
            PointerState::Panning { .. } | PointerState::Idle => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MeetingBus;

    struct Rig {
        board: Board,
        view: ViewTransform,
        replicator: Replicator,
        controller: InputController,
        brush: Brush,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                board: Board::new(),
                view: ViewTransform::new(),
                replicator: Replicator::new(Some("me".to_string())),
                controller: InputController::new(),
                brush: Brush::default(),
            }
        }

        fn feed<C: EventChannel>(&mut self, channel: &mut C, event: PointerEvent, can_draw: bool) -> bool {
            self.controller.handle_event(
                event,
                &self.brush,
                can_draw,
                &mut self.board,
                &mut self.view,
                &mut self.replicator,
                channel,
            )
        }
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn test_draw_session() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut peer = bus.endpoint();
        let mut rig = Rig::new();

        assert!(rig.feed(&mut local, down(10.0, 10.0), true));
        assert!(rig.controller.is_drawing());
        // Opening point replicated immediately.
        assert_eq!(peer.poll().len(), 1);

        assert!(rig.feed(&mut local, PointerEvent::Move { position: Point::new(12.0, 12.0) }, true));
        assert!(rig.feed(&mut local, PointerEvent::Move { position: Point::new(14.0, 14.0) }, true));

        rig.feed(&mut local, PointerEvent::Up { button: MouseButton::Left }, true);
        assert!(!rig.controller.is_drawing());

        // Up flushed the two buffered points in a single draw batch; the
        // cursor position tracked during the stroke flushes alongside it
        // as its own event.
        let delivered = peer.poll();
        let draws: Vec<_> = delivered.iter().filter(|v| v["type"] == "wb_draw").collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0]["points"].as_array().unwrap().len(), 2);
        let cursors = delivered.iter().filter(|v| v["type"] == "wb_cursor").count();
        assert_eq!(cursors, 1);

        assert_eq!(rig.board.len(), 1);
        assert_eq!(rig.board.strokes_ordered().next().unwrap().len(), 3);
    }

    #[test]
    fn test_permission_denied_is_noop() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut peer = bus.endpoint();
        let mut rig = Rig::new();

        assert!(!rig.feed(&mut local, down(10.0, 10.0), false));
        assert!(!rig.controller.is_drawing());
        assert!(rig.board.is_empty());
        assert!(peer.poll().is_empty());
    }

    #[test]
    fn test_shift_drag_pans() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut rig = Rig::new();

        let event = PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
            modifiers: Modifiers { shift: true, ..Default::default() },
        };
        rig.feed(&mut local, event, true);
        assert!(rig.controller.is_panning());

        assert!(rig.feed(&mut local, PointerEvent::Move { position: Point::new(110.0, 95.0) }, true));
        assert!((rig.view.offset().x - 10.0).abs() < f64::EPSILON);
        assert!((rig.view.offset().y + 5.0).abs() < f64::EPSILON);

        // Panning never touches strokes.
        assert!(rig.board.is_empty());

        rig.feed(&mut local, PointerEvent::Up { button: MouseButton::Left }, true);
        assert!(!rig.controller.is_panning());
    }

    #[test]
    fn test_middle_button_pans() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut rig = Rig::new();

        let event = PointerEvent::Down {
            position: Point::new(0.0, 0.0),
            button: MouseButton::Middle,
            modifiers: Modifiers::default(),
        };
        rig.feed(&mut local, event, false);
        assert!(rig.controller.is_panning());
    }

    #[test]
    fn test_down_not_reentrant() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut rig = Rig::new();

        rig.feed(&mut local, down(0.0, 0.0), true);
        rig.feed(&mut local, down(50.0, 50.0), true);

        // Second press during an active session starts nothing new.
        assert_eq!(rig.board.len(), 1);
    }

    #[test]
    fn test_wheel_zoom_needs_ctrl() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut rig = Rig::new();

        let plain = PointerEvent::Wheel {
            position: Point::new(50.0, 50.0),
            delta: 300.0,
            modifiers: Modifiers::default(),
        };
        assert!(!rig.feed(&mut local, plain, true));
        assert!((rig.view.scale() - 1.0).abs() < f64::EPSILON);

        let ctrl = PointerEvent::Wheel {
            position: Point::new(50.0, 50.0),
            delta: 300.0,
            modifiers: Modifiers { ctrl: true, ..Default::default() },
        };
        assert!(rig.feed(&mut local, ctrl, true));
        assert!(rig.view.scale() > 1.0);
    }

    #[test]
    fn test_draw_uses_world_coordinates() {
        let bus = MeetingBus::new();
        let mut local = bus.endpoint();
        let mut rig = Rig::new();
        rig.view.pan(Vec2::new(100.0, 0.0));

        rig.feed(&mut local, down(150.0, 40.0), true);
        let stroke = rig.board.strokes_ordered().next().unwrap();
        assert!((stroke.points[0].x - 50.0).abs() < 1e-9);
        assert!((stroke.points[0].y - 40.0).abs() < 1e-9);
    }
}

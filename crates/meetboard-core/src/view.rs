//! View transform for pan/zoom between world and screen space.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom scale.
pub const MIN_SCALE: f64 = 0.25;
/// Maximum allowed zoom scale.
pub const MAX_SCALE: f64 = 4.0;

/// Tuning constant mapping wheel delta to a zoom factor exponent.
const WHEEL_ZOOM_RATE: f64 = 0.0015;

/// Maps between world-space drawing coordinates and screen-space pixels.
///
/// `screen = world * scale + offset`. The offset is in screen units, so
/// panning adds drag deltas to it directly without touching the scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Current zoom scale, clamped to [`MIN_SCALE`, `MAX_SCALE`].
    scale: f64,
    /// Screen-space translation.
    offset: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// Create an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current zoom scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current screen-space offset.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Convert a world point to screen coordinates.
    pub fn to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    /// Convert a screen point to world coordinates.
    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    /// Pan by a drag delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom from a wheel delta, keeping the world point under `anchor` fixed
    /// on screen.
    pub fn zoom_at(&mut self, anchor: Point, wheel_delta: f64) {
        let factor = (wheel_delta * WHEEL_ZOOM_RATE).exp();
        self.zoom_by(anchor, factor);
    }

    /// Zoom by an explicit factor anchored at a screen point.
    pub fn zoom_by(&mut self, anchor: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let world_anchor = self.to_world(anchor);
        self.scale = new_scale;

        // Re-derive the offset so world_anchor still lands on anchor.
        let moved = self.to_screen(world_anchor);
        self.offset += Vec2::new(anchor.x - moved.x, anchor.y - moved.y);
    }
}

//! Remote cursor presence tracking.

use kurbo::Point;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cursors not refreshed within this window are treated as gone.
pub const CURSOR_TTL: Duration = Duration::from_millis(750);

#[derive(Debug, Clone, Copy)]
struct RemoteCursor {
    position: Point,
    last_seen: Instant,
}

/// Last known world-space cursor position per remote author.
///
/// Entries are created or refreshed on inbound cursor events and never
/// explicitly deleted; staleness is filtered at read time.
#[derive(Debug, Clone, Default)]
pub struct CursorTracker {
    cursors: HashMap<String, RemoteCursor>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cursor position for an author, refreshing its timestamp.
    pub fn update(&mut self, author: &str, position: Point) {
        self.update_at(author, position, Instant::now());
    }

    /// [`update`](Self::update) with an injected clock, for tests.
    pub fn update_at(&mut self, author: &str, position: Point, now: Instant) {
        self.cursors
            .insert(author.to_string(), RemoteCursor { position, last_seen: now });
    }

    /// Cursors fresh enough to render.
    pub fn fresh(&self) -> Vec<(&str, Point)> {
        self.fresh_at(Instant::now())
    }

    /// [`fresh`](Self::fresh) with an injected clock, for tests.
    pub fn fresh_at(&self, now: Instant) -> Vec<(&str, Point)> {
        self.cursors
            .iter()
            .filter(|(_, c)| now.duration_since(c.last_seen) <= CURSOR_TTL)
            .map(|(author, c)| (author.as_str(), c.position))
            .collect()
    }

    /// Forget everything (overlay close).
    pub fn clear(&mut self) {
        self.cursors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_cursor_visible() {
        let mut tracker = CursorTracker::new();
        let now = Instant::now();
        tracker.update_at("peer1", Point::new(10.0, 20.0), now);

        let fresh = tracker.fresh_at(now + Duration::from_millis(100));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].0, "peer1");
    }

    #[test]
    fn test_stale_cursor_hidden_not_deleted() {
        let mut tracker = CursorTracker::new();
        let now = Instant::now();
        tracker.update_at("peer1", Point::new(10.0, 20.0), now);

        assert!(tracker.fresh_at(now + Duration::from_millis(800)).is_empty());

        // A later update revives the same entry.
        tracker.update_at("peer1", Point::new(11.0, 21.0), now + Duration::from_secs(2));
        let fresh = tracker.fresh_at(now + Duration::from_secs(2));
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_update_overwrites_position() {
        let mut tracker = CursorTracker::new();
        let now = Instant::now();
        tracker.update_at("peer1", Point::new(1.0, 1.0), now);
        tracker.update_at("peer1", Point::new(2.0, 2.0), now);

        let fresh = tracker.fresh_at(now);
        assert_eq!(fresh.len(), 1);
        assert!((fresh[0].1.x - 2.0).abs() < f64::EPSILON);
    }
}

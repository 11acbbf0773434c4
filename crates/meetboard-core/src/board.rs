//! In-memory stroke store with draw order and undo/redo history.

use crate::stroke::{Stroke, StrokeId, StrokeMeta, StrokeMode};
use kurbo::Point;
use std::collections::HashMap;

/// The authoritative local drawing state for one overlay session.
///
/// Owns the stroke map, the draw order (paint z-order, append-only on
/// creation), and the undo/redo stacks. Raw containers are never exposed;
/// the operations here keep the invariants: every id in draw order has a
/// map entry, and no id sits in both the draw order and the undone stack.
#[derive(Debug, Clone, Default)]
pub struct Board {
    strokes: HashMap<StrokeId, Stroke>,
    draw_order: Vec<StrokeId>,
    undone: Vec<StrokeId>,
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new locally authored stroke with its first point.
    ///
    /// Appends the id to the draw order and clears the redo stack: a new
    /// action invalidates redo history. Serializing concurrent begin calls
    /// is the input controller's responsibility.
    pub fn begin_stroke(
        &mut self,
        author: Option<&str>,
        mode: StrokeMode,
        color: &str,
        width: f64,
        first_point: Point,
    ) -> StrokeId {
        let id = StrokeId::generate(author);
        let meta = StrokeMeta {
            author: author.map(str::to_string),
            mode,
            color: color.to_string(),
            width,
        };
        self.strokes
            .insert(id.clone(), Stroke::new(id.clone(), meta, first_point));
        self.draw_order.push(id.clone());
        self.undone.clear();
        id
    }

    /// Append a point to an active stroke. Returns false for an unknown id.
    pub fn append_point(&mut self, id: &StrokeId, point: Point) -> bool {
        match self.strokes.get_mut(id) {
            Some(stroke) => {
                stroke.points.push(point);
                true
            }
            None => false,
        }
    }

    /// Apply a remote delta: create the stroke from `meta` if the id is
    /// unknown, then append the delivered points.
    ///
    /// Repeated creation attempts with the same id never duplicate the
    /// draw-order entry. Re-delivered point ranges do append duplicate
    /// points; that drift is accepted rather than deduplicated.
    pub fn ingest_remote(&mut self, id: StrokeId, meta: &StrokeMeta, points: &[Point]) {
        if !self.strokes.contains_key(&id) {
            self.draw_order.push(id.clone());
            self.strokes
                .insert(id.clone(), Stroke::from_meta(id.clone(), meta.clone()));
        }
        if let Some(stroke) = self.strokes.get_mut(&id) {
            stroke.points.extend_from_slice(points);
        }
    }

    /// Empty the map, draw order, and both history stacks. Irreversible
    /// locally.
    pub fn clear_all(&mut self) {
        self.strokes.clear();
        self.draw_order.clear();
        self.undone.clear();
    }

    /// Remove the most recently drawn stroke from the draw order.
    ///
    /// The stroke stays in the map with its points so `redo` restores exact
    /// content. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.draw_order.pop() {
            Some(id) => {
                self.undone.push(id);
                true
            }
            None => false,
        }
    }

    /// Restore the most recently undone stroke to the end of the draw order.
    pub fn redo(&mut self) -> bool {
        match self.undone.pop() {
            Some(id) => {
                self.draw_order.push(id);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.draw_order.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Look up a stroke by id.
    pub fn get(&self, id: &StrokeId) -> Option<&Stroke> {
        self.strokes.get(id)
    }

    /// Strokes in paint order, back to front.
    pub fn strokes_ordered(&self) -> impl Iterator<Item = &Stroke> {
        self.draw_order.iter().filter_map(|id| self.strokes.get(id))
    }

    /// Number of strokes currently in the draw order.
    pub fn len(&self) -> usize {
        self.draw_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draw_order.is_empty()
    }
}

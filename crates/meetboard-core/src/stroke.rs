//! Stroke model: one continuous drawing gesture.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Drawing mode for a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrokeMode {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

/// Stroke identifier, unique per board per author.
///
/// Format `<author>:<millis>:<random>`, with `anon` standing in for an
/// unknown author. Remote ids are taken verbatim off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeId(String);

impl StrokeId {
    /// Generate a fresh id for a locally authored stroke.
    pub fn generate(author: Option<&str>) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}:{}:{}",
            author.unwrap_or("anon"),
            millis,
            &suffix[..5]
        ))
    }

    /// Wrap an id received from a peer.
    pub fn from_wire(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Style and authorship of a stroke, separate from its points so remote
/// deltas can create unknown strokes before any points arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeMeta {
    /// Author user id, if known.
    pub author: Option<String>,
    pub mode: StrokeMode,
    /// Hex color string, e.g. `#22c55e`.
    pub color: String,
    /// Stroke width in world units, pre-zoom.
    pub width: f64,
}

/// A stroke: identity, style, and an ordered run of world-space points.
///
/// Points are append-only while the stroke is active and immutable once it
/// is finalized. A stroke with zero points is never rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    #[serde(flatten)]
    pub meta: StrokeMeta,
    pub points: Vec<Point>,
}

impl Stroke {
    /// Create a stroke with a single initial point.
    pub fn new(id: StrokeId, meta: StrokeMeta, first_point: Point) -> Self {
        Self {
            id,
            meta,
            points: vec![first_point],
        }
    }

    /// Create an empty stroke from remote metadata.
    pub fn from_meta(id: StrokeId, meta: StrokeMeta) -> Self {
        Self {
            id,
            meta,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

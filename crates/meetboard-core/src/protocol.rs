//! Wire protocol for whiteboard events on the shared meeting channel.
//!
//! The channel is multiplexed with unrelated meeting traffic (chat,
//! reactions, hand-raise), so every whiteboard message carries a `wb_`
//! namespaced `type` discriminator and field names match the meeting
//! clients' wire format exactly (`strokeId`, `userId`, `dataUrl`,
//! `video_user_id`).

use crate::stroke::{StrokeId, StrokeMeta, StrokeMode};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A whiteboard event as it travels on the event channel.
///
/// All coordinates are world-space, so pan/zoom stays purely client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoardEvent {
    /// Incremental points for a new or existing stroke.
    #[serde(rename = "wb_draw")]
    Draw {
        #[serde(rename = "strokeId")]
        stroke_id: StrokeId,
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
        mode: StrokeMode,
        color: String,
        width: f64,
        points: Vec<Point>,
    },
    /// Board-wide clear.
    #[serde(rename = "wb_clear")]
    Clear {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    /// Live cursor position of a participant.
    #[serde(rename = "wb_cursor")]
    Cursor {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
        x: f64,
        y: f64,
    },
    /// Ask every participant for a rendered snapshot.
    #[serde(rename = "wb_snapshot_request")]
    SnapshotRequest {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    /// Rendered board image as a data URL.
    #[serde(rename = "wb_snapshot_response")]
    SnapshotResponse {
        #[serde(rename = "dataUrl")]
        data_url: String,
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    /// Presentation opened elsewhere in the meeting.
    #[serde(rename = "wb_present_start")]
    PresentStart {
        #[serde(default)]
        video_user_id: Option<String>,
    },
    /// Presentation closed.
    #[serde(rename = "wb_present_stop")]
    PresentStop {
        #[serde(default)]
        video_user_id: Option<String>,
    },
}

impl BoardEvent {
    /// Build a draw delta from a stroke's identity, style, and new points.
    pub fn draw(stroke_id: StrokeId, meta: &StrokeMeta, points: Vec<Point>) -> Self {
        Self::Draw {
            stroke_id,
            user_id: meta.author.clone(),
            mode: meta.mode,
            color: meta.color.clone(),
            width: meta.width,
            points,
        }
    }

    /// Decode a raw channel payload.
    ///
    /// Returns `None` for non-whiteboard traffic, unrecognized types, and
    /// payloads missing required fields; the caller ignores those silently.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Encode for publication. Serialization of these variants cannot fail;
    /// `Null` (ignored by every receiver) covers the impossible arm.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

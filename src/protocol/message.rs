//! Wire message shapes exchanged with the relay.

use serde::{Deserialize, Serialize};

use crate::types::ParticipantId;

/// A cursor position update, both on the wire and in the presence store.
///
/// `x` and `y` are fractions of the full document size, so the same update
/// lands on the same spot for clients with different viewports. `visible ==
/// false` asks peers to stop drawing the cursor; the coordinates are then
/// meaningless and usually absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorUpdate {
    pub id: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CursorUpdate {
    /// Creates a visible update at the given document fractions
    pub fn shown(id: ParticipantId, x: f64, y: f64, name: impl Into<String>) -> Self {
        CursorUpdate {
            id,
            x: Some(x),
            y: Some(y),
            visible: true,
            name: Some(name.into()),
        }
    }

    /// Creates the minimal "stop drawing me" update
    pub fn hidden(id: ParticipantId) -> Self {
        CursorUpdate {
            id,
            x: None,
            y: None,
            visible: false,
            name: None,
        }
    }

    /// Gets the position to draw at, if this cursor should be drawn at all
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.visible, self.x, self.y) {
            (true, Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    /// Whether the render layer should draw this cursor
    pub fn is_renderable(&self) -> bool {
        self.position().is_some()
    }
}

/// An informational error reported by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// Every frame the relay protocol knows about, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    Cursor(CursorUpdate),
    Error(ErrorMessage),
}

impl From<CursorUpdate> for WireMessage {
    fn from(update: CursorUpdate) -> Self {
        WireMessage::Cursor(update)
    }
}

impl From<ErrorMessage> for WireMessage {
    fn from(error: ErrorMessage) -> Self {
        WireMessage::Error(error)
    }
}

//! JSON encoding and decoding of relay frames.
//!
//! Decoding is permissive about extra fields and strict about the fields a
//! message cannot be interpreted without. A frame that cannot be decoded is an
//! error value, never a panic: the receiver drops it and keeps going.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::message::{CursorUpdate, ErrorMessage, WireMessage};

/// Encodes any wire message into its JSON text frame.
pub fn encode(message: &WireMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Encodes a cursor update as a `"type":"cursor"` frame.
pub fn encode_cursor(update: &CursorUpdate) -> Result<String, ProtocolError> {
    encode(&WireMessage::Cursor(update.clone()))
}

/// Decodes one inbound frame.
///
/// # Errors
///
/// * `Malformed` - not JSON, or a known message with missing/mistyped fields
/// * `MissingType` - no string `type` tag
/// * `UnknownType` - a `type` other than `cursor` or `error`
/// * `MissingPosition` - a visible cursor without both `x` and `y`
pub fn decode(frame: impl AsRef<[u8]>) -> Result<WireMessage, ProtocolError> {
    let value: Value = serde_json::from_slice(frame.as_ref()).map_err(ProtocolError::Malformed)?;
    let tag = value.get("type").and_then(Value::as_str).map(str::to_owned);

    match tag.as_deref() {
        Some("cursor") => {
            let update: CursorUpdate =
                serde_json::from_value(value).map_err(ProtocolError::Malformed)?;
            if update.visible && (update.x.is_none() || update.y.is_none()) {
                return Err(ProtocolError::MissingPosition(update.id.to_string()));
            }
            Ok(WireMessage::Cursor(update))
        }
        Some("error") => {
            let error: ErrorMessage =
                serde_json::from_value(value).map_err(ProtocolError::Malformed)?;
            Ok(WireMessage::Error(error))
        }
        Some(other) => Err(ProtocolError::UnknownType(other.to_string())),
        None => Err(ProtocolError::MissingType),
    }
}

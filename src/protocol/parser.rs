//! Frame parsing
//!
//! Every parse failure is a protocol violation: the caller discards the frame
//! and keeps the connection.

use crate::error::{ChatError, Result};
use crate::types::chat::User;

use super::frames::{InboundFrame, OutboundFrame};

/// Parse a text frame from the chat or notification stream
///
/// # Errors
/// Returns `ChatError::Protocol` if the text is not a JSON object with a
/// recognised shape
pub fn parse_frame(text: &str) -> Result<InboundFrame> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ChatError::protocol(format!("frame is not JSON: {e}"), None))?;

    if value.get("type").and_then(serde_json::Value::as_str).is_none() {
        return Err(ChatError::protocol("frame has no type field", Some(value)));
    }

    serde_json::from_value(value.clone())
        .map_err(|e| ChatError::protocol(format!("malformed frame: {e}"), Some(value)))
}

/// Parse a result-set frame from the search stream
///
/// # Errors
/// Returns `ChatError::Protocol` if the text is not a JSON array of users
pub fn parse_search_results(text: &str) -> Result<Vec<User>> {
    serde_json::from_str(text)
        .map_err(|e| ChatError::protocol(format!("malformed search results: {e}"), None))
}

/// Timestamp of a ping frame, or `None` if `text` is anything else.
///
/// Used by the receive loop before a frame reaches any consumer, so it only
/// looks at the `type` and `ts` fields.
#[must_use]
pub fn ping_timestamp(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    if value.get("type")?.as_str()? != "ping" {
        return None;
    }
    Some(
        value
            .get("ts")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or_default(),
    )
}

/// Serialize an outbound frame to its wire text
///
/// # Errors
/// Returns error if serialization fails
pub fn encode_frame(frame: &OutboundFrame) -> Result<String> {
    Ok(serde_json::to_string(frame)?)
}

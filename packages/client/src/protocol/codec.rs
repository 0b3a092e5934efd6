//! Frame codec.
//!
//! A physical delivery may batch several frames separated by `\n`. Each frame
//! is decoded on its own, so one corrupt frame never hides the others.

use serde_json::Value;

use crate::{
    dto::websocket::{ClientFrame, Command, MessageDto, NotificationBody, ResponseBody, ServerFrame},
    error::{CommandError, DecodeError},
};

const TOP_LEVEL_FIELDS: [&str; 3] = ["response", "notification", "message"];

/// A decoded server frame, classified by its top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Outcome of a correlated command. `id` is `None` if the server omitted it.
    Response {
        id: Option<u64>,
        response: ResponseBody,
    },
    Notification(NotificationBody),
    /// Chat message broadcast to the room's subscribers
    Push(MessageDto),
}

/// Serialize a command frame. `id` is `None` for one-way commands.
pub fn encode_command(id: Option<u64>, command: &Command) -> Result<String, CommandError> {
    serde_json::to_string(&ClientFrame { id, command })
        .map_err(|e| CommandError::Encode(e.to_string()))
}

/// Split a delivery into its logical frames.
///
/// Blank lines (including a trailing delimiter) carry no frame and are
/// skipped. A `\r` before the delimiter is dropped.
pub fn split_delivery(delivery: &str) -> impl Iterator<Item = &str> {
    delivery
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
}

/// Decode one logical frame.
///
/// Exactly one of `response`, `notification` and `message` must be present;
/// anything else is a [`DecodeError`].
pub fn decode_frame(text: &str) -> Result<InboundFrame, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::Json("frame is not a JSON object".to_string()))?;

    let present = TOP_LEVEL_FIELDS
        .iter()
        .filter(|field| object.get(**field).is_some_and(|v| !v.is_null()))
        .count();
    match present {
        0 => return Err(DecodeError::Unclassified),
        1 => {}
        _ => return Err(DecodeError::Ambiguous),
    }

    let frame: ServerFrame =
        serde_json::from_value(value).map_err(|e| DecodeError::Json(e.to_string()))?;

    match frame {
        ServerFrame {
            id,
            response: Some(response),
            ..
        } => Ok(InboundFrame::Response { id, response }),
        ServerFrame {
            notification: Some(notification),
            ..
        } => Ok(InboundFrame::Notification(notification)),
        ServerFrame {
            message: Some(message),
            ..
        } => Ok(InboundFrame::Push(message)),
        _ => Err(DecodeError::Unclassified),
    }
}

/// Split and decode a delivery, one result per frame in original order.
pub fn decode_delivery(delivery: &str) -> Vec<Result<InboundFrame, DecodeError>> {
    split_delivery(delivery).map(decode_frame).collect()
}

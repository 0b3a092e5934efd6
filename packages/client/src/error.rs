//! Error types for the Parley session client.
//!
//! One enum per concern. Nothing here is fatal to the process: command errors
//! are returned to the caller that issued the command, everything else is
//! logged where it happens.

use thiserror::Error;

use crate::domain::RoomId;

/// Failure of the duplex channel itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Send attempted while the channel is not open
    #[error("channel is not open")]
    NotOpen,

    /// The underlying socket refused the frame
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Why a correlated (or one-way) command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The frame could not be handed to the channel
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status code outside 200..=299
    #[error("server rejected command ({code}): {message}")]
    Protocol { code: u16, message: String },

    /// The channel closed before a response arrived
    #[error("channel closed before a response arrived")]
    ChannelClosed,

    /// No response arrived within the configured timeout
    #[error("timed out waiting for a response")]
    TimedOut,

    /// The command could not be serialized
    #[error("failed to encode command: {0}")]
    Encode(String),
}

/// A single logical frame that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not valid JSON, or a known field had the wrong shape
    #[error("malformed frame: {0}")]
    Json(String),

    /// None of `response`, `notification` or `message` is present
    #[error("frame carries no known top-level field")]
    Unclassified,

    /// More than one of `response`, `notification` or `message` is present
    #[error("frame carries more than one top-level field")]
    Ambiguous,
}

/// Illegal room state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A join or leave for this room is still in flight
    #[error("room '{0}' is still joining or leaving")]
    TransitionInProgress(RoomId),

    /// Another room is already open
    #[error("room '{0}' is already open")]
    RoomAlreadyOpen(RoomId),

    /// The operation needs an open room
    #[error("no room is open")]
    NoOpenRoom,

    /// The transition being settled no longer matches the local state
    #[error("room '{0}' is no longer in the expected state")]
    Stale(RoomId),
}

/// Failure of the HTTP snapshot/history collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The response body did not have the expected shape
    #[error("failed to decode API response: {0}")]
    Decode(String),
}

/// Errors surfaced to the UI by the session command surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Joining a room failed; the room is back to closed
    #[error("failed to join room '{room_id}': {source}")]
    JoinFailed {
        room_id: RoomId,
        source: CommandError,
    },

    /// The server accepted the join but the room was deleted before the
    /// response arrived; the room is closed
    #[error("room '{0}' was deleted while joining")]
    RoomDeleted(RoomId),

    /// Leaving a room failed; the room is still joined
    #[error("failed to leave room '{room_id}': {source}")]
    LeaveFailed {
        room_id: RoomId,
        source: CommandError,
    },
}

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The websocket connection could not be established
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection went away
    #[error("Connection lost")]
    ConnectionLost { open_room: Option<RoomId> },

    /// The server refused our credentials
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

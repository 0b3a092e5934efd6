//! Domain logic for client-side operations.
//!
//! Pure functions deciding what the reconnect loop does with an error.

use crate::{
    domain::RoomId,
    error::{ApiError, ClientError},
};

/// Check if the client should exit immediately based on the error type.
///
/// # Arguments
///
/// * `error` - The client error to check
///
/// # Returns
///
/// `true` if retrying cannot help (e.g., Unauthorized), `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Unauthorized(_) | ClientError::Api(ApiError::Status { status: 401 | 403, .. })
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Room to re-open after reconnecting, if the error carries one.
pub fn room_to_resume(error: &ClientError) -> Option<RoomId> {
    match error {
        ClientError::ConnectionLost { open_room } => open_room.clone(),
        _ => None,
    }
}

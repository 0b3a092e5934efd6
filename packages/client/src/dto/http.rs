//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Entry of `GET /api/subscriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub external_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seq_id: u64,
    #[serde(default)]
    pub last_read_seq_id: u64,
    #[serde(default)]
    pub is_online: bool,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDto {
    #[serde(default)]
    pub status_code: u16,
    pub message: String,
}

//! `ChatApi` over the server's JSON HTTP API.
//!
//! - `GET /api/subscriptions`
//! - `GET /api/messages?room_id=..&limit=..[&before=..]`
//!
//! Non-2xx responses carry `{"status_code": .., "message": ".."}`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    domain::{ChatApi, Message, Room, RoomId},
    dto::{
        http::{ApiErrorDto, RoomSummaryDto},
        websocket::MessageDto,
    },
    error::ApiError,
};

/// reqwest-backed [`ChatApi`].
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{base}/{suffix}")
    }

    /// Send `request` and decode a JSON list. An empty body (or `null`) is an
    /// empty list.
    async fn request_list<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Request(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let list: Option<Vec<T>> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(list.unwrap_or_default())
    }
}

/// Build an [`ApiError::Status`], preferring the server's error message over
/// the raw body.
fn status_error(status: u16, body: &str) -> ApiError {
    let message = match serde_json::from_str::<ApiErrorDto>(body) {
        Ok(dto) => dto.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.trim().to_string(),
    };
    ApiError::Status { status, message }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_subscriptions(&self) -> Result<Vec<Room>, ApiError> {
        let url = self.endpoint("/api/subscriptions");
        tracing::debug!("GET {}", url);
        let rooms: Vec<RoomSummaryDto> = self.request_list(self.client.get(&url)).await?;
        Ok(rooms.into_iter().map(Room::from).collect())
    }

    async fn get_messages(
        &self,
        room_id: &RoomId,
        before: Option<u64>,
        limit: usize,
    ) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint("/api/messages");
        let mut query = vec![
            ("room_id", room_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }
        tracing::debug!("GET {} {:?}", url, query);

        let messages: Vec<MessageDto> = self
            .request_list(self.client.get(&url).query(&query))
            .await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }
}

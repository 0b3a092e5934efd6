//! Client configuration.

use std::time::Duration;

pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HISTORY_PAGE_LIMIT: usize = 10;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 5;

/// Settings for one client process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chat server
    pub ws_url: String,
    /// Base URL of the HTTP API (snapshot and history)
    pub api_url: String,
    /// How long a correlated command may stay pending
    pub command_timeout: Duration,
    /// Messages fetched per history page
    pub history_page_limit: usize,
    /// Reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Pause between reconnect attempts
    pub reconnect_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            history_page_limit: DEFAULT_HISTORY_PAGE_LIMIT,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_interval: Duration::from_secs(DEFAULT_RECONNECT_INTERVAL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        // テスト項目: デフォルト設定が定数と一致する
        // given (前提条件):

        // when (操作):
        let config = ClientConfig::default();

        // then (期待する結果):
        assert_eq!(config.ws_url, "ws://127.0.0.1:8000/ws");
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.command_timeout, Duration::from_secs(10));
        assert_eq!(config.history_page_limit, 10);
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_interval, Duration::from_secs(5));
    }
}

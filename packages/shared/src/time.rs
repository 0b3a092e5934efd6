//! Time-related utilities for displaying server timestamps.
//!
//! The server stamps every message in UTC. The client renders them in JST.

use chrono::{DateTime, FixedOffset, Offset, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// The JST (UTC+9) offset.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in UTC.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a UTC timestamp to JST RFC 3339 format
pub fn to_jst_rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&jst()).to_rfc3339()
}

/// Convert a UTC timestamp to a short JST wall-clock time (`HH:MM:SS`)
pub fn to_jst_clock_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&jst()).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_jst_rfc3339_format() {
        // テスト項目: UTC のタイムスタンプが JST の RFC 3339 形式に変換される
        // given (前提条件):
        // 2022-12-31 15:00:00 UTC == 2023-01-01 00:00:00 JST
        let timestamp = Utc.with_ymd_and_hms(2022, 12, 31, 15, 0, 0).unwrap();

        // when (操作):
        let result = to_jst_rfc3339(&timestamp);

        // then (期待する結果):
        assert!(result.starts_with("2023-01-01T00:00:00"));
        assert!(result.contains("+09:00"));
    }

    #[test]
    fn test_to_jst_clock_time() {
        // テスト項目: 時刻のみの短い表示形式に変換される
        // given (前提条件):
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 3, 4, 5).unwrap();

        // when (操作):
        let result = to_jst_clock_time(&timestamp);

        // then (期待する結果):
        assert_eq!(result, "12:04:05");
    }

    #[test]
    fn test_now_utc_is_after_epoch() {
        // テスト項目: now_utc が正のタイムスタンプを返す
        // given (前提条件):

        // when (操作):
        let now = now_utc();

        // then (期待する結果):
        assert!(now.timestamp_millis() > 0);
    }
}

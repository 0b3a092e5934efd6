//! Logging setup utilities for the Parley chat client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LIBRARY_TARGET: &str = "parley_client";

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the client library crate and the binary log at `default_log_level`
/// unless the `RUST_LOG` environment variable says otherwise.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "parley-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use parley_shared::logger::setup_logger;
///
/// setup_logger("parley-client", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the filter directives used when `RUST_LOG` is not set.
fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    if binary_target == LIBRARY_TARGET {
        format!("{}={}", LIBRARY_TARGET, default_log_level)
    } else {
        format!(
            "{}={},{}={}",
            LIBRARY_TARGET, default_log_level, binary_target, default_log_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_skip_binary_sharing_library_target() {
        // テスト項目: バイナリ名がライブラリと同じターゲットになる場合、ディレクティブは 1 つだけ
        // given (前提条件):
        let binary_name = "parley-client";

        // when (操作):
        let directives = default_directives(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(directives, "parley_client=debug");
    }

    #[test]
    fn test_default_directives_normalize_hyphenated_binary_name() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let binary_name = "chat-bot";

        // when (操作):
        let directives = default_directives(binary_name, "warn");

        // then (期待する結果):
        assert_eq!(directives, "parley_client=warn,chat_bot=warn");
    }
}

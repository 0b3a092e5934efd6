//! Interactive Parley chat client with reconnection support.
//!
//! Connects to the chat server's WebSocket endpoint, loads the caller's room
//! subscriptions over HTTP and opens a prompt. Automatically reconnects on
//! disconnection and re-opens the room that was open.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-client
//! cargo run --bin parley-client -- --url ws://chat.example.com/ws --api-url http://chat.example.com
//! ```

use std::time::Duration;

use clap::Parser;

use parley_client::{ClientConfig, cli::run_client, config};
use parley_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parley-client")]
#[command(about = "Parley chat client: rooms, presence and messages over one WebSocket", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = config::DEFAULT_WS_URL)]
    url: String,

    /// HTTP API base URL
    #[arg(short = 'a', long, default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Seconds to wait for a command response
    #[arg(long, default_value_t = config::DEFAULT_COMMAND_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Messages fetched per history page
    #[arg(long, default_value_t = config::DEFAULT_HISTORY_PAGE_LIMIT)]
    history_limit: usize,

    /// Reconnect attempts before giving up
    #[arg(long, default_value_t = config::DEFAULT_MAX_RECONNECT_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Seconds between reconnect attempts
    #[arg(long, default_value_t = config::DEFAULT_RECONNECT_INTERVAL_SECS)]
    reconnect_interval_secs: u64,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            ws_url: args.url,
            api_url: args.api_url,
            command_timeout: Duration::from_secs(args.timeout_secs),
            history_page_limit: args.history_limit,
            max_reconnect_attempts: args.max_reconnect_attempts,
            reconnect_interval: Duration::from_secs(args.reconnect_interval_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = run_client(args.into()).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

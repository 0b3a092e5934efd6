//! Duplex channel adapter.
//!
//! ## 責務
//!
//! - Wrap a raw duplex socket behind connect/send/close
//! - Report inbound deliveries, errors and closure as [`ChannelEvent`]s
//!
//! The adapter knows nothing about the chat protocol: a delivery is an opaque
//! string which may hold several newline-separated frames.
//!
//! ## 実装
//!
//! - `websocket`: tokio-tungstenite client
//! - `memory`: in-process loopback, used to script a server in tests

pub mod memory;
pub mod websocket;

pub use memory::{MemoryChannel, MemoryPeer};
pub use websocket::WebSocketChannel;

use crate::error::TransportError;

/// Something the channel observed. Delivered in arrival order on the event
/// receiver returned by `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// One physical delivery
    Frame(String),
    /// A non-fatal socket error
    Error(String),
    /// The channel is closed; no more events follow
    Closed,
}

/// Outbound half of a duplex channel.
#[cfg_attr(test, mockall::automock)]
pub trait DuplexChannel: Send + Sync {
    /// Queue a frame for transmission. Fails immediately if the channel is
    /// not open.
    fn send(&self, frame: String) -> Result<(), TransportError>;

    /// Start closing the channel. Idempotent.
    fn close(&self);

    fn is_open(&self) -> bool;
}

//! Infrastructure layer: concrete transports and API clients.
//!
//! - `channel`: duplex channel adapters (WebSocket, in-memory)
//! - `api`: HTTP implementation of `ChatApi`

pub mod api;
pub mod channel;

//! Parley session client.
//!
//! One multiplexed duplex connection per session carries correlated commands
//! (join, leave, publish, mark read), their responses, and unsolicited
//! notifications. The client keeps a local model of the caller's rooms, the
//! open room's roster and messages, and read positions consistent with those
//! pushes.
//!
//! ## Layers
//!
//! - `domain`: room model and state reconciler (no I/O)
//! - `dto`: wire shapes
//! - `protocol`: frame codec, correlation engine, notification dispatcher
//! - `infrastructure`: WebSocket / in-memory channels, HTTP API client
//! - `session`: ties a connection to the state and exposes the command surface
//! - `cli`: interactive front end

pub mod cli;
pub mod config;
pub mod domain;
pub mod dto;
pub mod error;
pub mod infrastructure;
pub mod protocol;
pub mod session;

pub use config::ClientConfig;
pub use session::{NoopObserver, Session, SessionObserver};

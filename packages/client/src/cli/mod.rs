//! Interactive command-line front end.
//!
//! - `command`: parsing of input lines
//! - `formatter`: rendering of rooms, messages and notifications
//! - `observer`: prints inbound events while the prompt is active
//! - `repl`: one interactive session on one connection
//! - `runner`: reconnect loop around `repl`

pub mod command;
pub mod domain;
pub mod formatter;
pub mod observer;
pub mod repl;
pub mod runner;
pub mod ui;

pub use runner::run_client;

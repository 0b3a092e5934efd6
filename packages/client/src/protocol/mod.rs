//! Chat protocol engine.
//!
//! - `codec`: delivery splitting and frame classification
//! - `correlation`: correlation ids and pending completions
//! - `dispatcher`: notification classification and handler dispatch

pub mod codec;
pub mod correlation;
pub mod dispatcher;

pub use codec::{InboundFrame, decode_delivery, decode_frame, encode_command, split_delivery};
pub use correlation::{CommandResult, Connection, PendingReply};
pub use dispatcher::{classify, dispatch};

//! Correlation engine.
//!
//! ## 責務
//!
//! - Assign correlation ids (starting at 1, never reused within a connection)
//! - Track one pending completion per in-flight command
//! - Route response frames back to the caller that issued the command
//!
//! Every pending completion is removed from the table before it is settled,
//! so it is settled exactly once: by a response, a send failure, a timeout
//! (`forget`) or closure of the connection.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    dto::websocket::{Command, ResponseBody},
    error::CommandError,
    infrastructure::channel::DuplexChannel,
};

use super::codec::encode_command;

/// Outcome of a correlated command: the response `data` on success.
pub type CommandResult = Result<Option<Value>, CommandError>;

/// Future side of a pending completion.
///
/// Resolves with [`CommandError::ChannelClosed`] if the completion is dropped
/// without being settled.
#[derive(Debug)]
pub struct PendingReply {
    id: u64,
    rx: oneshot::Receiver<CommandResult>,
}

impl PendingReply {
    /// Correlation id the command was sent with
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for PendingReply {
    type Output = CommandResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(CommandError::ChannelClosed)))
    }
}

/// One client connection: the channel, its id sequence and the pending table.
///
/// A new connection always starts a fresh id sequence.
pub struct Connection {
    channel: Arc<dyn DuplexChannel>,
    next_id: u64,
    pending: HashMap<u64, oneshot::Sender<CommandResult>>,
}

impl Connection {
    pub fn new(channel: Arc<dyn DuplexChannel>) -> Self {
        Self {
            channel,
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Send a correlated command.
    ///
    /// # Returns
    ///
    /// A [`PendingReply`] settled by the matching response. If the frame
    /// cannot be handed to the channel the reply is already rejected and no
    /// completion stays registered.
    pub fn send_command(&mut self, command: &Command) -> PendingReply {
        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let sent = encode_command(Some(id), command)
            .and_then(|frame| self.channel.send(frame).map_err(CommandError::from));

        if let Err(e) = sent {
            tracing::warn!("Failed to send '{}' command (id={}): {}", command.name(), id, e);
            if let Some(tx) = self.pending.remove(&id) {
                let _ = tx.send(Err(e));
            }
        } else {
            tracing::debug!("Sent '{}' command (id={})", command.name(), id);
        }

        PendingReply { id, rx }
    }

    /// Send a one-way command. Settles as soon as the frame is handed to the
    /// channel.
    pub fn send_oneway(&self, command: &Command) -> Result<(), CommandError> {
        let frame = encode_command(None, command)?;
        self.channel.send(frame)?;
        tracing::debug!("Sent one-way '{}' command", command.name());
        Ok(())
    }

    /// Route a response frame to its pending completion.
    ///
    /// Returns `false` if no completion is waiting for `id` (late, duplicate
    /// or uncorrelated response); such responses are logged and discarded.
    pub fn handle_response(&mut self, id: Option<u64>, response: ResponseBody) -> bool {
        let Some(id) = id else {
            tracing::warn!(
                "Discarding response without correlation id (code {})",
                response.response_code
            );
            return false;
        };
        let Some(tx) = self.pending.remove(&id) else {
            tracing::debug!("Discarding response for unknown id {}", id);
            return false;
        };

        if tx.send(settle(response)).is_err() {
            tracing::debug!("Caller for id {} is no longer waiting", id);
        }
        true
    }

    /// Drop the pending completion for `id` without settling it, so a late
    /// response is discarded.
    pub fn forget(&mut self, id: u64) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Reject every pending completion with `error`.
    pub fn reject_all(&mut self, error: CommandError) {
        if !self.pending.is_empty() {
            tracing::info!("Rejecting {} pending command(s): {}", self.pending.len(), error);
        }
        for (_, tx) in self.pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Close the channel and reject everything still pending.
    pub fn close(&mut self) {
        self.channel.close();
        self.reject_all(CommandError::ChannelClosed);
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Ids still waiting for a response, ascending
    pub fn pending_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.pending.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Interpret a response status code: 200..=299 succeeds with the payload.
fn settle(response: ResponseBody) -> CommandResult {
    match response.response_code {
        200..=299 => Ok(response.data),
        code => Err(CommandError::Protocol {
            code,
            message: response
                .error
                .unwrap_or_else(|| format!("response code {code}")),
        }),
    }
}

//! In-process DuplexChannel implementation.
//!
//! [`MemoryChannel`] is the client end, [`MemoryPeer`] plays the server: it
//! reads what the client sent and injects deliveries, errors and closure.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::mpsc;

use crate::error::TransportError;

use super::{ChannelEvent, DuplexChannel};

/// Client end of an in-memory channel.
pub struct MemoryChannel {
    sent: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    open: Arc<AtomicBool>,
}

/// Server end of an in-memory channel.
pub struct MemoryPeer {
    sent: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    open: Arc<AtomicBool>,
}

impl MemoryChannel {
    /// Create an open channel, its peer and the client's event receiver.
    pub fn pair() -> (Self, MemoryPeer, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));
        (
            Self {
                sent: sent_tx,
                events: event_tx.clone(),
                open: open.clone(),
            },
            MemoryPeer {
                sent: sent_rx,
                events: event_tx,
                open,
            },
            event_rx,
        )
    }
}

impl DuplexChannel for MemoryChannel {
    fn send(&self, frame: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.sent.send(frame).map_err(|_| TransportError::NotOpen)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(ChannelEvent::Closed);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl MemoryPeer {
    /// Next frame the client sent, waiting for it if necessary.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Next frame the client sent, if one is already queued.
    pub fn try_next_sent(&mut self) -> Option<String> {
        self.sent.try_recv().ok()
    }

    /// Next sent frame parsed as JSON.
    pub async fn next_sent_json(&mut self) -> Option<serde_json::Value> {
        let frame = self.next_sent().await?;
        serde_json::from_str(&frame).ok()
    }

    /// Deliver one physical delivery to the client.
    pub fn deliver(&self, delivery: impl Into<String>) {
        let _ = self.events.send(ChannelEvent::Frame(delivery.into()));
    }

    /// Report a socket error to the client.
    pub fn fail(&self, error: impl Into<String>) {
        let _ = self.events.send(ChannelEvent::Error(error.into()));
    }

    /// Mark the channel as not open without closing it, so sends fail.
    pub fn stall(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Drop the connection from the server side.
    pub fn disconnect(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(ChannelEvent::Closed);
        }
    }
}

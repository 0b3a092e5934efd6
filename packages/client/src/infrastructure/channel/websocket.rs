//! WebSocket を使った DuplexChannel 実装
//!
//! One reader task turns socket messages into [`ChannelEvent`]s, one writer
//! task drains an unbounded queue into the socket. `send` only enqueues, so
//! it never blocks and reports a closed channel synchronously.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::error::{ClientError, TransportError};

use super::{ChannelEvent, DuplexChannel};

enum Outbound {
    Frame(String),
    Close,
}

/// WebSocket client channel.
pub struct WebSocketChannel {
    outbound: mpsc::UnboundedSender<Outbound>,
    open: Arc<AtomicBool>,
}

impl WebSocketChannel {
    /// Connect to `url` and start the reader and writer tasks.
    ///
    /// # Returns
    ///
    /// The channel and the receiver of its events.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), ClientError> {
        let (ws_stream, _response) = connect_async(url).await.map_err(handshake_error)?;
        tracing::info!("Connected to {}", url);

        let (write, mut read) = ws_stream.split();
        let open = Arc::new(AtomicBool::new(true));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Outbound>();

        tokio::spawn(run_writer(
            write,
            outbound_rx,
            open.clone(),
            event_tx.clone(),
        ));

        // reader: socket -> events
        let open_for_read = open.clone();
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        tracing::debug!("Received delivery: {}", text.as_str());
                        if event_tx
                            .send(ChannelEvent::Frame(text.as_str().to_owned()))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => {
                            if event_tx.send(ChannelEvent::Frame(text)).is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            let _ = event_tx.send(ChannelEvent::Error(format!(
                                "dropped {} bytes of non UTF-8 binary data",
                                data.len()
                            )));
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("Server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        let _ = event_tx.send(ChannelEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            open_for_read.store(false, Ordering::SeqCst);
            let _ = event_tx.send(ChannelEvent::Closed);
        });

        Ok((
            Self {
                outbound: outbound_tx,
                open,
            },
            event_rx,
        ))
    }
}

/// Drain the outbound queue into the socket. A write failure closes the
/// channel: it reports the error, then `Closed`, so pending commands are
/// rejected without waiting for the read half to notice.
async fn run_writer<S>(
    mut write: S,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    open: Arc<AtomicBool>,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
) where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(outbound) = outbound_rx.recv().await {
        match outbound {
            Outbound::Frame(text) => {
                tracing::debug!("Sending frame: {}", text);
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    tracing::warn!("WebSocket write error: {}", e);
                    open.store(false, Ordering::SeqCst);
                    let _ = event_tx.send(ChannelEvent::Error(e.to_string()));
                    let _ = event_tx.send(ChannelEvent::Closed);
                    break;
                }
            }
            Outbound::Close => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!("Failed to send close frame: {}", e);
                }
                break;
            }
        }
    }
}

/// A 401/403 handshake response means the server refused our credentials.
fn handshake_error(error: tungstenite::Error) -> ClientError {
    match &error {
        tungstenite::Error::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            ClientError::Unauthorized(format!("handshake rejected with {}", response.status()))
        }
        _ => ClientError::ConnectionError(error.to_string()),
    }
}

impl DuplexChannel for WebSocketChannel {
    fn send(&self, frame: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| TransportError::SendFailed("writer task stopped".to_string()))
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            tracing::info!("Closing WebSocket channel");
            let _ = self.outbound.send(Outbound::Close);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

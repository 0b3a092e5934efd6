//! Client session.
//!
//! ## 責務
//!
//! - Own one [`Connection`] and the [`ChatState`] it keeps up to date
//! - Run the reader task: decode deliveries, route responses, dispatch
//!   notifications to the state and to the UI observer
//! - Expose the command surface (open/leave room, publish, mark read,
//!   history paging) and the close operation
//!
//! ## 並行性
//!
//! The connection, state and observer live together behind one async mutex.
//! The lock is held only while mutating, never while awaiting a reply, so the
//! reader task can always route the response a caller is waiting for.

use std::sync::Arc;

use serde_json::Value;
use tokio::{
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
};

use crate::{
    config::ClientConfig,
    domain::{ChatApi, ChatState, Message, NotificationHandler, RoomDetails, RoomId, RoomPhase},
    dto::websocket::{Command, RoomInfoDto},
    error::{ClientError, CommandError, DecodeError, SessionError, StateError},
    infrastructure::channel::{ChannelEvent, DuplexChannel, WebSocketChannel},
    protocol::{
        CommandResult, Connection, InboundFrame, PendingReply, classify, decode_frame, dispatch,
        split_delivery,
    },
};

/// UI hooks. Notification slots come from [`NotificationHandler`]; every
/// hook defaults to a no-op.
///
/// Hooks run after the state has been updated, while the session lock is
/// held: they must not call back into the session.
pub trait SessionObserver: NotificationHandler + Send {
    /// A chat message was pushed to a room
    fn on_message(&mut self, _message: &Message) {}

    /// A frame in a delivery could not be decoded
    fn on_decode_error(&mut self, _error: &DecodeError) {}

    /// The channel reported a non-fatal error
    fn on_channel_error(&mut self, _error: &str) {}

    /// The channel closed
    fn on_closed(&mut self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl NotificationHandler for NoopObserver {}

impl SessionObserver for NoopObserver {}

/// Outcome of processing one physical delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Frames decoded and handled
    pub processed: usize,
    /// Frames dropped because they could not be decoded
    pub failed: usize,
}

struct SessionCore {
    connection: Connection,
    state: ChatState,
    observer: Box<dyn SessionObserver>,
}

impl SessionCore {
    /// Decode and handle every frame of a delivery in order. A bad frame is
    /// logged and skipped.
    fn handle_delivery(&mut self, delivery: &str) -> DeliveryStats {
        let mut stats = DeliveryStats::default();
        for text in split_delivery(delivery) {
            match decode_frame(text) {
                Ok(frame) => {
                    self.handle_frame(frame);
                    stats.processed += 1;
                }
                Err(e) => {
                    tracing::warn!("Dropping undecodable frame: {} ({})", e, text);
                    self.observer.on_decode_error(&e);
                    stats.failed += 1;
                }
            }
        }
        stats
    }

    fn handle_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::Response { id, response } => {
                self.connection.handle_response(id, response);
            }
            InboundFrame::Notification(body) => {
                if let Some(notification) = classify(body) {
                    tracing::debug!(
                        "Notification {:?} for room '{}'",
                        notification.kind(),
                        notification.room_id()
                    );
                    dispatch(&notification, &mut self.state);
                    dispatch(&notification, self.observer.as_mut());
                }
            }
            InboundFrame::Push(dto) => {
                let message = Message::from(dto);
                self.state.apply_message(&message);
                self.observer.on_message(&message);
            }
        }
    }
}

/// One connected client session.
///
/// A session never outlives its connection: after a reconnect, start a new
/// session and call [`Session::resync`].
pub struct Session {
    core: Arc<Mutex<SessionCore>>,
    api: Arc<dyn ChatApi>,
    config: ClientConfig,
    closed_rx: watch::Receiver<bool>,
    reader: JoinHandle<()>,
}

impl Session {
    /// Connect to `config.ws_url` and start a session on the new channel.
    pub async fn connect(
        config: ClientConfig,
        api: Arc<dyn ChatApi>,
        observer: Box<dyn SessionObserver>,
    ) -> Result<Self, ClientError> {
        let (channel, events) = WebSocketChannel::connect(&config.ws_url).await?;
        Ok(Self::start(Arc::new(channel), events, api, observer, config))
    }

    /// Start a session on an already connected channel.
    ///
    /// # Arguments
    ///
    /// * `channel` - Outbound half of the channel
    /// * `events` - Events reported by the same channel
    /// * `api` - Snapshot and history source
    /// * `observer` - UI hooks
    /// * `config` - Command timeout and history page size
    pub fn start(
        channel: Arc<dyn DuplexChannel>,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
        api: Arc<dyn ChatApi>,
        observer: Box<dyn SessionObserver>,
        config: ClientConfig,
    ) -> Self {
        let core = Arc::new(Mutex::new(SessionCore {
            connection: Connection::new(channel),
            state: ChatState::new(),
            observer,
        }));
        let (closed_tx, closed_rx) = watch::channel(false);
        let reader = tokio::spawn(run_reader(core.clone(), events, closed_tx));

        Self {
            core,
            api,
            config,
            closed_rx,
            reader,
        }
    }

    // ========================================
    // Snapshot / resync
    // ========================================

    /// Seed the room list from the subscription snapshot.
    pub async fn bootstrap(&self) -> Result<usize, SessionError> {
        let rooms = self.api.list_subscriptions().await?;
        let count = rooms.len();
        self.core.lock().await.state.seed_rooms(rooms);
        tracing::info!("Loaded {} subscribed room(s)", count);
        Ok(count)
    }

    /// Full resynchronization after a (re)connect: re-fetch the snapshot and
    /// re-open `resume` if it is still in the room list.
    pub async fn resync(&self, resume: Option<&RoomId>) -> Result<(), SessionError> {
        self.bootstrap().await?;
        let Some(room_id) = resume else {
            return Ok(());
        };
        let known = self.core.lock().await.state.room(room_id).is_some();
        if known {
            tracing::info!("Re-opening room '{}'", room_id);
            self.open_room(room_id).await
        } else {
            tracing::info!("Room '{}' is gone, not re-opening it", room_id);
            Ok(())
        }
    }

    // ========================================
    // Commands
    // ========================================

    /// Open `room_id`, leaving the currently open room first.
    ///
    /// The join is only sent after the leave settles successfully. If the
    /// leave fails the join is not attempted. A leave that succeeds after the
    /// room was deleted still counts as settled. A successful join is followed
    /// by a history backfill; backfill failures are logged, not returned.
    pub async fn open_room(&self, room_id: &RoomId) -> Result<(), SessionError> {
        let current = {
            let core = self.core.lock().await;
            core.state
                .active_room()
                .map(|active| (active.room_id().clone(), active.phase()))
        };

        match current {
            Some((open, RoomPhase::Joined)) if &open == room_id => {
                tracing::debug!("Room '{}' is already open", room_id);
                return Ok(());
            }
            Some((_, RoomPhase::Joined)) => {
                self.leave_room(false).await?;
            }
            Some((busy, _)) => return Err(StateError::TransitionInProgress(busy).into()),
            None => {}
        }

        self.join_room(room_id).await?;
        if let Err(e) = self.backfill(room_id).await {
            tracing::warn!("Failed to load history for room '{}': {}", room_id, e);
        }
        Ok(())
    }

    async fn join_room(&self, room_id: &RoomId) -> Result<(), SessionError> {
        let reply = {
            let mut core = self.core.lock().await;
            core.state.begin_join(room_id)?;
            core.connection.send_command(&Command::join(room_id.as_str()))
        };

        let result = self.await_reply(reply).await;

        let mut core = self.core.lock().await;
        match result {
            Ok(data) => match core.state.commit_join(room_id, room_details(data)) {
                Ok(()) => {
                    tracing::info!("Joined room '{}'", room_id);
                    Ok(())
                }
                Err(StateError::Stale(_)) => {
                    tracing::info!("Room '{}' was deleted while joining", room_id);
                    Err(SessionError::RoomDeleted(room_id.clone()))
                }
                Err(e) => Err(e.into()),
            },
            Err(source) => {
                if let Err(e) = core.state.rollback_join(room_id) {
                    tracing::debug!("Join rollback skipped: {}", e);
                }
                Err(SessionError::JoinFailed {
                    room_id: room_id.clone(),
                    source,
                })
            }
        }
    }

    /// Leave the open room. With `unsubscribe` the room is also dropped from
    /// the room list.
    ///
    /// # Returns
    ///
    /// The room that was left.
    pub async fn leave_room(&self, unsubscribe: bool) -> Result<RoomId, SessionError> {
        let (room_id, reply) = {
            let mut core = self.core.lock().await;
            let room_id = core.state.begin_leave(unsubscribe)?;
            let reply = core
                .connection
                .send_command(&Command::leave(room_id.as_str(), unsubscribe));
            (room_id, reply)
        };

        let result = self.await_reply(reply).await;

        let mut core = self.core.lock().await;
        match result {
            Ok(_) => {
                match core.state.commit_leave(&room_id) {
                    Ok(()) => tracing::info!("Left room '{}'", room_id),
                    // room_deleted already closed it
                    Err(StateError::Stale(_)) => {
                        tracing::info!("Room '{}' was deleted while leaving", room_id)
                    }
                    Err(e) => return Err(e.into()),
                }
                Ok(room_id)
            }
            Err(source) => {
                if let Err(e) = core.state.rollback_leave(&room_id) {
                    tracing::debug!("Leave rollback skipped: {}", e);
                }
                Err(SessionError::LeaveFailed { room_id, source })
            }
        }
    }

    /// Publish a message to the open room. One-way: succeeds once the frame
    /// is handed to the channel.
    pub async fn publish(&self, content: &str) -> Result<(), SessionError> {
        let core = self.core.lock().await;
        let room_id = core.state.open_room_id().ok_or(StateError::NoOpenRoom)?;
        core.connection
            .send_oneway(&Command::publish(room_id.as_str(), content))?;
        Ok(())
    }

    /// Mark the open room as read up to its latest known message.
    ///
    /// # Returns
    ///
    /// The confirmed read position.
    pub async fn mark_read(&self) -> Result<u64, SessionError> {
        let (room_id, seq_id, reply) = {
            let mut core = self.core.lock().await;
            let room_id = core
                .state
                .open_room_id()
                .cloned()
                .ok_or(StateError::NoOpenRoom)?;
            let seq_id = core.state.room(&room_id).map_or(0, |room| room.seq_id);
            let reply = core
                .connection
                .send_command(&Command::mark_read(room_id.as_str(), seq_id));
            (room_id, seq_id, reply)
        };

        self.await_reply(reply).await?;
        self.core.lock().await.state.mark_read(&room_id, seq_id);
        Ok(seq_id)
    }

    /// Fetch the page of history older than the oldest message loaded for
    /// the open room.
    ///
    /// # Returns
    ///
    /// How many new messages were merged.
    pub async fn load_older_history(&self) -> Result<usize, SessionError> {
        let (room_id, before) = {
            let core = self.core.lock().await;
            let active = core
                .state
                .active_room()
                .filter(|active| active.phase() == RoomPhase::Joined)
                .ok_or(StateError::NoOpenRoom)?;
            (active.room_id().clone(), active.messages().oldest_seq())
        };
        self.fetch_history(&room_id, before).await
    }

    async fn backfill(&self, room_id: &RoomId) -> Result<usize, SessionError> {
        self.fetch_history(room_id, None).await
    }

    async fn fetch_history(
        &self,
        room_id: &RoomId,
        before: Option<u64>,
    ) -> Result<usize, SessionError> {
        let messages = self
            .api
            .get_messages(room_id, before, self.config.history_page_limit)
            .await?;
        let fetched = messages.len();
        let added = self.core.lock().await.state.merge_history(room_id, messages);
        tracing::debug!(
            "History for room '{}': fetched {}, added {}",
            room_id,
            fetched,
            added
        );
        Ok(added)
    }

    /// Wait for a reply, giving up after the configured timeout. A timed out
    /// command is forgotten so its late response is discarded.
    async fn await_reply(&self, reply: PendingReply) -> CommandResult {
        let id = reply.id();
        match tokio::time::timeout(self.config.command_timeout, reply).await {
            Ok(result) => result,
            Err(_) => {
                self.core.lock().await.connection.forget(id);
                tracing::warn!(
                    "Command {} timed out after {:?}",
                    id,
                    self.config.command_timeout
                );
                Err(CommandError::TimedOut)
            }
        }
    }

    // ========================================
    // State access / lifecycle
    // ========================================

    /// Run `f` against the current state.
    pub async fn with_state<R>(&self, f: impl FnOnce(&ChatState) -> R) -> R {
        let core = self.core.lock().await;
        f(&core.state)
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> ChatState {
        self.with_state(ChatState::clone).await
    }

    pub async fn open_room_id(&self) -> Option<RoomId> {
        self.with_state(|state| state.open_room_id().cloned()).await
    }

    pub async fn pending_commands(&self) -> usize {
        self.core.lock().await.connection.pending_count()
    }

    /// Close the channel. Pending commands are rejected with
    /// [`CommandError::ChannelClosed`].
    pub async fn close(&self) {
        self.core.lock().await.connection.close();
    }

    /// Resolves once the channel has closed and the reader has stopped.
    pub async fn closed(&self) {
        let mut closed_rx = self.closed_rx.clone();
        let _ = closed_rx.wait_for(|closed| *closed).await;
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn run_reader(
    core: Arc<Mutex<SessionCore>>,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    closed_tx: watch::Sender<bool>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Frame(delivery) => {
                let stats = core.lock().await.handle_delivery(&delivery);
                if stats.failed > 0 {
                    tracing::debug!(
                        "Delivery: {} frame(s) handled, {} dropped",
                        stats.processed,
                        stats.failed
                    );
                }
            }
            ChannelEvent::Error(error) => {
                tracing::warn!("Channel error: {}", error);
                core.lock().await.observer.on_channel_error(&error);
            }
            ChannelEvent::Closed => break,
        }
    }

    {
        let mut core = core.lock().await;
        core.connection.reject_all(CommandError::ChannelClosed);
        core.observer.on_closed();
    }
    tracing::info!("Session channel closed");
    let _ = closed_tx.send(true);
}

/// Room details from a join response payload. An absent or malformed payload
/// still commits the join, just without metadata.
fn room_details(data: Option<Value>) -> Option<RoomDetails> {
    let data = data.filter(|value| !value.is_null())?;
    match serde_json::from_value::<RoomInfoDto>(data) {
        Ok(dto) => Some(dto.into()),
        Err(e) => {
            tracing::warn!("Ignoring malformed join payload: {}", e);
            None
        }
    }
}

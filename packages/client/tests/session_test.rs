//! End-to-end tests against an in-process fake chat server.
//!
//! The fake server speaks the real wire protocol over axum's WebSocket and
//! serves the HTTP snapshot/history endpoints, so these tests exercise
//! `WebSocketChannel`, `HttpChatApi` and `Session` together.

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{
        Query,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use parley_client::{
    ClientConfig, Session, SessionObserver,
    domain::{ChatApi, NotificationHandler, PresenceChanged, RoomId, RoomPhase},
    error::{ApiError, ClientError, CommandError, SessionError},
    infrastructure::{api::HttpChatApi, channel::WebSocketChannel},
};

// ========================================
// Fake server
// ========================================

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    room_id: String,
    limit: usize,
    before: Option<u64>,
}

async fn subscriptions() -> Json<Value> {
    Json(json!([
        {
            "external_id": "r1",
            "name": "General",
            "description": "chit chat",
            "seq_id": 3,
            "last_read_seq_id": 1,
            "is_online": true
        },
        {
            "external_id": "r2",
            "name": "Random",
            "seq_id": 0,
            "last_read_seq_id": 0
        }
    ]))
}

async fn messages(Query(query): Query<HistoryQuery>) -> impl IntoResponse {
    if query.room_id != "r1" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"status_code": 404, "message": "room not found"})),
        );
    }
    let newest = query.before.map_or(3, |before| before.saturating_sub(1));
    let page: Vec<Value> = (1..=newest)
        .rev()
        .take(query.limit)
        .map(|seq_id| {
            json!({
                "id": 100 + seq_id,
                "seq_id": seq_id,
                "room_id": "r1",
                "user_id": 2,
                "username": "bob",
                "content": format!("old message {seq_id}"),
                "timestamp": "2024-01-01T00:00:00Z"
            })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(page)))
}

async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

async fn unauthorized() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

/// Answers commands the way the chat server does. A `publish` containing
/// "bye" makes the server hang up.
async fn handle_socket(socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut seq_id = 3;

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(command) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        let id = command.get("id").cloned().unwrap_or(Value::Null);

        let delivery = if let Some(join) = command.get("join") {
            if join["room_id"] == "r1" {
                // response and a presence notification batched in one delivery
                [
                    json!({"id": id, "response": {"response_code": 200, "data": {
                        "external_id": "r1",
                        "name": "General",
                        "description": "chit chat",
                        "seq_id": 3,
                        "last_read_seq_id": 1,
                        "subscribers": [
                            {"id": 1, "username": "alice", "is_present": true},
                            {"id": 2, "username": "bob", "is_present": false}
                        ]
                    }}}),
                    json!({"notification": {"presence": {"room_id": "r1", "user_id": 2, "present": true}}}),
                ]
                .map(|frame| frame.to_string())
                .join("\n")
            } else {
                json!({"id": id, "response": {"response_code": 404, "error": "no such room"}})
                    .to_string()
            }
        } else if let Some(publish) = command.get("publish") {
            let content = publish["content"].as_str().unwrap_or_default().to_string();
            if content.contains("bye") {
                break;
            }
            seq_id += 1;
            json!({"message": {
                "id": 100 + seq_id,
                "seq_id": seq_id,
                "room_id": publish["room_id"],
                "user_id": 1,
                "username": "alice",
                "content": content,
                "timestamp": "2024-01-01T00:00:00Z"
            }})
            .to_string()
        } else if command.get("leave").is_some() || command.get("mark_read").is_some() {
            json!({"id": id, "response": {"response_code": 200}}).to_string()
        } else {
            json!({"id": id, "response": {"response_code": 400, "error": "unknown command"}})
                .to_string()
        };

        if sender.send(Message::Text(delivery.into())).await.is_err() {
            break;
        }
    }
}

/// Start the fake server on an ephemeral port and return its base address.
async fn start_server() -> String {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/ws-unauthorized", get(unauthorized))
        .route("/api/subscriptions", get(subscriptions))
        .route("/api/messages", get(messages));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("127.0.0.1:{}", addr.port())
}

fn config_for(addr: &str) -> ClientConfig {
    ClientConfig {
        ws_url: format!("ws://{addr}/ws"),
        api_url: format!("http://{addr}"),
        command_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }
}

// ========================================
// Observer
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Observed {
    Presence(Option<u64>, bool),
    Message(String),
    Closed,
}

struct ForwardingObserver {
    tx: mpsc::UnboundedSender<Observed>,
}

impl NotificationHandler for ForwardingObserver {
    fn on_presence_changed(&mut self, event: &PresenceChanged) {
        let _ = self.tx.send(Observed::Presence(event.user_id, event.present));
    }
}

impl SessionObserver for ForwardingObserver {
    fn on_message(&mut self, message: &parley_client::domain::Message) {
        let _ = self.tx.send(Observed::Message(message.body.clone()));
    }

    fn on_closed(&mut self) {
        let _ = self.tx.send(Observed::Closed);
    }
}

async fn connect(addr: &str) -> (Session, mpsc::UnboundedReceiver<Observed>) {
    let config = config_for(addr);
    let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::new(config.api_url.clone()));
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::connect(config, api, Box::new(ForwardingObserver { tx }))
        .await
        .unwrap();
    (session, rx)
}

// ========================================
// Tests
// ========================================

#[tokio::test]
async fn test_full_session_flow() {
    // テスト項目: 一覧取得 → join → 履歴 → publish → 既読 の一連の流れが実サーバー相当で動く
    // given (前提条件):
    let addr = start_server().await;
    let (session, mut observed) = connect(&addr).await;

    // when (操作):
    let room_count = session.bootstrap().await.unwrap();
    session.open_room(&RoomId::new("r1")).await.unwrap();

    // then (期待する結果): join 応答と同じ配信のプレゼンス通知もオブザーバーに届く
    assert_eq!(room_count, 2);
    assert_eq!(observed.recv().await, Some(Observed::Presence(Some(2), true)));
    let state = session.snapshot().await;
    let active = state.active_room().unwrap();
    assert_eq!(active.phase(), RoomPhase::Joined);
    assert_eq!(active.roster().len(), 2);
    assert_eq!(active.roster().get(1).unwrap().username, "alice");
    let seqs: Vec<u64> = active.messages().iter().map(|m| m.seq_id).collect();
    assert_eq!(seqs, vec![1, 2, 3]);

    // when (操作):
    session.publish("hello").await.unwrap();

    // then (期待する結果):
    assert_eq!(observed.recv().await, Some(Observed::Message("hello".to_string())));
    let state = session.snapshot().await;
    let r1 = state.room(&RoomId::new("r1")).unwrap();
    assert_eq!(r1.seq_id, 4);
    assert_eq!(r1.unread_count(), 3);

    // when (操作):
    let read_up_to = session.mark_read().await.unwrap();

    // then (期待する結果):
    assert_eq!(read_up_to, 4);
    let state = session.snapshot().await;
    assert_eq!(state.room(&RoomId::new("r1")).unwrap().unread_count(), 0);
    assert_eq!(state.total_unread(), 0);

    session.close().await;
}

#[tokio::test]
async fn test_join_rejected_by_server() {
    // テスト項目: サーバーが join を拒否すると JoinFailed になり部屋は closed のまま
    // given (前提条件):
    let addr = start_server().await;
    let (session, _observed) = connect(&addr).await;

    // when (操作):
    let result = session.open_room(&RoomId::new("nope")).await;

    // then (期待する結果):
    assert_eq!(
        result,
        Err(SessionError::JoinFailed {
            room_id: RoomId::new("nope"),
            source: CommandError::Protocol {
                code: 404,
                message: "no such room".to_string()
            }
        })
    );
    assert!(session.snapshot().await.active_room().is_none());
}

#[tokio::test]
async fn test_switching_rooms_over_websocket() {
    // テスト項目: 部屋を開いた状態で leave → 別の部屋の join が行われ、拒否されれば closed になる
    // given (前提条件):
    let addr = start_server().await;
    let (session, _observed) = connect(&addr).await;
    session.bootstrap().await.unwrap();
    session.open_room(&RoomId::new("r1")).await.unwrap();

    // when (操作):
    let result = session.open_room(&RoomId::new("r2")).await;

    // then (期待する結果): leave(r1) は成功し、join(r2) はサーバーに拒否される
    assert!(matches!(result, Err(SessionError::JoinFailed { .. })));
    let state = session.snapshot().await;
    assert!(state.active_room().is_none());
    assert!(state.room(&RoomId::new("r1")).is_some());
}

#[tokio::test]
async fn test_server_hangup_closes_session() {
    // テスト項目: サーバーが接続を切るとセッションが closed になり、以降のコマンドは失敗する
    // given (前提条件):
    let addr = start_server().await;
    let (session, mut observed) = connect(&addr).await;
    session.open_room(&RoomId::new("r1")).await.unwrap();
    assert_eq!(observed.recv().await, Some(Observed::Presence(Some(2), true)));

    // when (操作):
    session.publish("bye").await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), session.closed())
        .await
        .unwrap();

    // then (期待する結果):
    assert!(session.is_closed());
    assert_eq!(observed.recv().await, Some(Observed::Closed));
    let result = session.leave_room(false).await;
    assert!(matches!(
        result,
        Err(SessionError::LeaveFailed {
            source: CommandError::Transport(_),
            ..
        })
    ));
    assert_eq!(session.open_room_id().await, Some(RoomId::new("r1")));
}

#[tokio::test]
async fn test_http_api_paging_and_errors() {
    // テスト項目: 履歴 API が before で古いページを返し、404 はサーバーのメッセージ付きエラーになる
    // given (前提条件):
    let addr = start_server().await;
    let api = HttpChatApi::new(format!("http://{addr}"));

    // when (操作):
    let rooms = api.list_subscriptions().await.unwrap();
    let older = api
        .get_messages(&RoomId::new("r1"), Some(3), 10)
        .await
        .unwrap();
    let missing = api.get_messages(&RoomId::new("zzz"), None, 10).await;

    // then (期待する結果):
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].unread_count(), 2);
    assert!(rooms[0].online);
    let seqs: Vec<u64> = older.iter().map(|m| m.seq_id).collect();
    assert_eq!(seqs, vec![2, 1]);
    assert_eq!(
        missing,
        Err(ApiError::Status {
            status: 404,
            message: "room not found".to_string()
        })
    );
}

#[tokio::test]
async fn test_unauthorized_handshake() {
    // テスト項目: ハンドシェイクが 401 で拒否されると Unauthorized エラーになる
    // given (前提条件):
    let addr = start_server().await;

    // when (操作):
    let result = WebSocketChannel::connect(&format!("ws://{addr}/ws-unauthorized")).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::Unauthorized(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    // テスト項目: 接続先がない場合は ConnectionError になる
    // given (前提条件):
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    // when (操作):
    let result = WebSocketChannel::connect(&format!("ws://{addr}/ws")).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::ConnectionError(_))));
}

//! Integration tests: boot the server on an ephemeral port and drive it over
//! HTTP and WebSocket like a real client would.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use codeduel_server::{
    config::ServerConfig,
    infrastructure::{auth::StaticCredentialVerifier, problem::BuiltinProblemCatalog},
    ui::Server,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const CREDENTIALS: &str = r#"{
    "token-alice": { "participant_id": "alice", "display_name": "Alice", "email": "alice@example.com" },
    "token-bob": { "participant_id": "bob", "display_name": "Bob", "email": "bob@example.com" },
    "token-carol": { "participant_id": "carol", "display_name": "Carol", "email": "carol@example.com" }
}"#;

/// Helper struct to manage server task lifecycle
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
    http: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let verifier = StaticCredentialVerifier::from_json_str(CREDENTIALS).unwrap();
        let server = Server::new(
            &config,
            Arc::new(verifier),
            Arc::new(BuiltinProblemCatalog::new()),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));
        TestServer {
            addr,
            shutdown: Some(shutdown),
            handle: Some(handle),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.http.get(self.url(path)).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn create_room(&self, token: &str, capacity: usize) -> String {
        let (status, body) = self
            .post(
                "/api/rooms",
                token,
                json!({ "title": "duel", "capacity": capacity, "difficulty": 1 }),
            )
            .await;
        assert_eq!(status, 201);
        body["room"]["id"].as_str().unwrap().to_string()
    }

    async fn connect(&self, room: &str) -> WsClient {
        let url = format!("ws://{}/ws?room={}", self.addr, room);
        let (ws, _) = connect_async(url).await.unwrap();
        ws
    }

    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
    }
}

async fn send(ws: &mut WsClient, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

async fn authorize(ws: &mut WsClient, token: &str) {
    send(ws, json!({ "type": "authorization", "content": token })).await;
}

/// Read frames until one has `roomupdate.type == update_type`.
async fn recv_update(ws: &mut WsClient, update_type: &str) -> Value {
    let read = async {
        loop {
            let msg = ws.next().await.unwrap().unwrap();
            if let Message::Text(text) = msg {
                let frame: Value = serde_json::from_str(text.as_str()).unwrap();
                if frame["roomupdate"]["type"] == update_type {
                    return frame;
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(3), read)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", update_type))
}

/// Read the next text frame, if one arrives within `wait`.
async fn recv_text(ws: &mut WsClient, wait: Duration) -> Option<Value> {
    let read = async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<Value>(text.as_str()).ok();
                }
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    };
    tokio::time::timeout(wait, read).await.ok().flatten()
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, body) = server.get("/api/health").await;

    // then (期待する結果):
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    server.stop().await;
}

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    // テスト項目: 不正なトークンでの Room 作成は 401
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, body) = server
        .post(
            "/api/rooms",
            "forged",
            json!({ "title": "duel", "capacity": 2, "difficulty": 1 }),
        )
        .await;

    // then (期待する結果):
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
    server.stop().await;
}

#[tokio::test]
async fn test_join_full_room_is_conflict() {
    // テスト項目: 定員に達した Room への参加は 409 で、参加者は変わらない
    // given (前提条件):
    let server = TestServer::start().await;
    let room = server.create_room("token-alice", 2).await;
    let (status, _) = server
        .post(&format!("/api/rooms/{}/join", room), "token-bob", json!({}))
        .await;
    assert_eq!(status, 200);

    // when (操作):
    let (status, body) = server
        .post(&format!("/api/rooms/{}/join", room), "token-carol", json!({}))
        .await;

    // then (期待する結果):
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    let (_, detail) = server.get(&format!("/api/rooms/{}", room)).await;
    assert_eq!(detail["participants"], json!(["alice", "bob"]));
    server.stop().await;
}

#[tokio::test]
async fn test_last_leave_deletes_room() {
    // テスト項目: 最後の参加者が退出すると Room が削除される
    // given (前提条件):
    let server = TestServer::start().await;
    let room = server.create_room("token-alice", 2).await;

    // when (操作):
    let (status, body) = server
        .post(&format!("/api/rooms/{}/leave", room), "token-alice", json!({}))
        .await;

    // then (期待する結果):
    assert_eq!(status, 200);
    assert_eq!(body["room_deleted"], true);
    let (status, _) = server.get(&format!("/api/rooms/{}", room)).await;
    assert_eq!(status, 404);
    server.stop().await;
}

#[tokio::test]
async fn test_chat_requires_authorization() {
    // テスト項目: 認証前のチャットは中継されず、認証後のチャットは中継される
    // given (前提条件):
    let server = TestServer::start().await;
    let room = server.create_room("token-alice", 2).await;
    server
        .post(&format!("/api/rooms/{}/join", room), "token-bob", json!({}))
        .await;
    let mut bob = server.connect(&room).await;
    authorize(&mut bob, "token-bob").await;
    recv_update(&mut bob, "USER_JOIN").await;
    let mut alice = server.connect(&room).await;

    // when (操作): 認証前にチャットを送る
    send(
        &mut alice,
        json!({ "type": "chat_message", "room": room, "content": "too early", "sender": "alice" }),
    )
    .await;

    // then (期待する結果): bob には何も届かない
    assert!(recv_text(&mut bob, Duration::from_millis(300)).await.is_none());

    // when (操作): 認証してからチャットを送る
    authorize(&mut alice, "token-alice").await;
    let join = recv_update(&mut bob, "USER_JOIN").await;
    assert_eq!(join["roomupdate"]["data"]["participant"], "alice");
    send(
        &mut alice,
        json!({ "type": "chat_message", "room": room, "timestamp": 42, "content": "hello", "sender": "alice" }),
    )
    .await;

    // then (期待する結果):
    let chat = recv_text(&mut bob, Duration::from_secs(3)).await.unwrap();
    assert_eq!(chat["type"], "chat_message");
    assert_eq!(chat["content"], "hello");
    assert_eq!(chat["sender"], "alice");
    assert_eq!(chat["timestamp"], 42);
    server.stop().await;
}

#[tokio::test]
async fn test_setting_change_is_relayed_and_persisted() {
    // テスト項目: ロビーでの設定変更が他の参加者に届き、Room 詳細に反映される
    // given (前提条件):
    let server = TestServer::start().await;
    let room = server.create_room("token-alice", 2).await;
    server
        .post(&format!("/api/rooms/{}/join", room), "token-bob", json!({}))
        .await;
    let mut alice = server.connect(&room).await;
    let mut bob = server.connect(&room).await;
    authorize(&mut alice, "token-alice").await;
    authorize(&mut bob, "token-bob").await;
    recv_update(&mut bob, "USER_JOIN").await;

    // when (操作):
    send(
        &mut alice,
        json!({
            "type": "room_message",
            "room": room,
            "roomupdate": { "type": "CHANGE_DIFFICULTY", "data": { "value": 3 } }
        }),
    )
    .await;

    // then (期待する結果):
    let update = recv_update(&mut bob, "CHANGE_DIFFICULTY").await;
    assert_eq!(update["roomupdate"]["data"]["value"], 3);
    let (_, detail) = server.get(&format!("/api/rooms/{}", room)).await;
    assert_eq!(detail["difficulty"], 3);
    assert_eq!(detail["live_connections"], 2);
    server.stop().await;
}

#[tokio::test]
async fn test_game_flow_until_winner() {
    // テスト項目: 起動 → 進捗報告 → 全ケース通過で勝者が決まり、GAME_OVER が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let room = server.create_room("token-alice", 2).await;
    server
        .post(&format!("/api/rooms/{}/join", room), "token-bob", json!({}))
        .await;
    let mut alice = server.connect(&room).await;
    let mut bob = server.connect(&room).await;
    authorize(&mut alice, "token-alice").await;
    authorize(&mut bob, "token-bob").await;
    recv_update(&mut bob, "USER_JOIN").await;

    // オーナー以外は起動できない
    let (status, _) = server
        .post(
            &format!("/api/rooms/{}/launch", room),
            "token-bob",
            json!({ "problem_id": "problem01" }),
        )
        .await;
    assert_eq!(status, 403);

    // when (操作):
    let (status, body) = server
        .post(
            &format!("/api/rooms/{}/launch", room),
            "token-alice",
            json!({ "problem_id": "problem01" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["room"]["status"], "in_game");
    let launch = recv_update(&mut bob, "LAUNCH_GAME").await;
    assert_eq!(launch["roomupdate"]["data"]["totalCases"], 8);

    let (_, progress) = server
        .post(
            &format!("/api/rooms/{}/progress", room),
            "token-alice",
            json!({ "score": 5 }),
        )
        .await;
    assert_eq!(progress["accepted"], true);
    let result = recv_update(&mut bob, "CODE_SUBMIT_RESULT").await;
    assert_eq!(result["roomupdate"]["data"]["leader"], "alice");

    let (_, progress) = server
        .post(
            &format!("/api/rooms/{}/progress", room),
            "token-bob",
            json!({ "score": 8 }),
        )
        .await;

    // then (期待する結果):
    assert_eq!(progress["won"], true);
    let over = recv_update(&mut alice, "GAME_OVER").await;
    assert_eq!(over["type"], "game_message");
    assert_eq!(over["roomupdate"]["data"]["value"], "bob");

    // 終了後の進捗報告は受け付けられない
    let (_, late) = server
        .post(
            &format!("/api/rooms/{}/progress", room),
            "token-alice",
            json!({ "score": 8 }),
        )
        .await;
    assert_eq!(late["accepted"], false);
    server.stop().await;
}

#[tokio::test]
async fn test_disconnect_removes_participant() {
    // テスト項目: 認証済み接続の切断で参加者が Room から外れ、USER_LEAVE が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let room = server.create_room("token-alice", 2).await;
    server
        .post(&format!("/api/rooms/{}/join", room), "token-bob", json!({}))
        .await;
    let mut alice = server.connect(&room).await;
    let mut bob = server.connect(&room).await;
    authorize(&mut alice, "token-alice").await;
    authorize(&mut bob, "token-bob").await;
    recv_update(&mut alice, "USER_JOIN").await;
    recv_update(&mut alice, "USER_JOIN").await;

    // when (操作):
    bob.close(None).await.unwrap();

    // then (期待する結果):
    let leave = recv_update(&mut alice, "USER_LEAVE").await;
    assert_eq!(leave["roomupdate"]["data"]["participant"], "bob");
    let (_, detail) = server.get(&format!("/api/rooms/{}", room)).await;
    assert_eq!(detail["participants"], json!(["alice"]));
    server.stop().await;
}

#[tokio::test]
async fn test_connect_without_room_is_bad_request() {
    // テスト項目: room クエリのない接続要求は拒否される
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let result = connect_async(format!("ws://{}/ws", server.addr)).await;

    // then (期待する結果):
    assert!(result.is_err());
    server.stop().await;
}

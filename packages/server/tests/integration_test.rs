//! Integration tests driving a live server over real WebSocket
//! connections.
//!
//! Each test boots the full axum server on its own port inside the
//! test runtime and talks to it with a tokio-tungstenite client.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use pollroom_server::{
    config::AllowedOrigins, infrastructure::WebSocketMessagePusher, ui::Server,
    usecase::SessionCoordinator,
};
use pollroom_shared::time::SystemClock;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Boot a server on the given port inside the current runtime.
fn spawn_server(port: u16) {
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let coordinator = SessionCoordinator::new(message_pusher, Arc::new(SystemClock));
    let server = Server::new(coordinator, AllowedOrigins::Any);
    tokio::spawn(async move {
        if let Err(e) = server.run("127.0.0.1".to_string(), port).await {
            panic!("Test server failed: {e}");
        }
    });
}

/// Connect a WebSocket client, retrying while the server binds.
async fn connect(port: u16) -> WsClient {
    let url = format!("ws://127.0.0.1:{port}/ws");
    for _ in 0..50 {
        if let Ok((ws, _)) = connect_async(&url).await {
            return ws;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("Could not connect to test server at {url}");
}

async fn send_json(client: &mut WsClient, payload: Value) {
    client
        .send(Message::text(payload.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Read frames until one with the given `type` arrives, skipping
/// everything else.
async fn read_until_type(client: &mut WsClient, message_type: &str) -> Value {
    let deadline = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = client.next().await {
            let frame = frame.expect("WebSocket read failed");
            if let Message::Text(text) = frame {
                let payload: Value =
                    serde_json::from_str(text.as_str()).expect("Frame is not JSON");
                if payload["type"] == message_type {
                    return payload;
                }
            }
        }
        panic!("Connection closed while waiting for '{message_type}'");
    });
    deadline
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for '{message_type}'"))
}

async fn register_teacher(client: &mut WsClient) {
    send_json(client, json!({"type": "register", "role": "teacher"})).await;
    let ack = read_until_type(client, "teacherRegistered").await;
    assert_eq!(ack["ok"], true);
}

async fn register_student(client: &mut WsClient, name: &str) {
    send_json(
        client,
        json!({"type": "register", "role": "student", "name": name}),
    )
    .await;
    let ack = read_until_type(client, "studentRegistered").await;
    assert_eq!(ack["ok"], true);
    assert_eq!(ack["name"], name);
}

#[tokio::test]
async fn test_register_pushes_session_state_to_new_connection() {
    // テスト項目: 登録直後に履歴とチャットのスナップショットが届く
    // given (前提条件):
    let port = 18090;
    spawn_server(port);
    let mut student = connect(port).await;

    // when (操作):
    send_json(
        &mut student,
        json!({"type": "register", "role": "student", "name": "Alice"}),
    )
    .await;

    // then (期待する結果): 登録応答・過去ポーリング・チャット履歴の順に届く
    let registered = read_until_type(&mut student, "studentRegistered").await;
    assert_eq!(registered["name"], "Alice");
    let past = read_until_type(&mut student, "pastPolls").await;
    assert_eq!(past["polls"], json!([]));
    let chat = read_until_type(&mut student, "chatHistory").await;
    assert_eq!(chat["messages"], json!([]));
}

#[tokio::test]
async fn test_full_poll_flow_ends_when_all_students_answer() {
    // テスト項目: 作成 → 全員投票 → all_answered 終了の一連のフロー
    // given (前提条件): 教師 1 人と学生 2 人が接続済み
    let port = 18091;
    spawn_server(port);
    let mut teacher = connect(port).await;
    let mut alice = connect(port).await;
    let mut bob = connect(port).await;
    register_teacher(&mut teacher).await;
    register_student(&mut alice, "Alice").await;
    register_student(&mut bob, "Bob").await;

    // when (操作): ポーリングを開始して両学生が投票する
    send_json(
        &mut teacher,
        json!({
            "type": "createPoll",
            "question": "Favorite color?",
            "options": ["Red", "Blue"],
            "durationSec": 60
        }),
    )
    .await;
    let started = read_until_type(&mut alice, "pollStarted").await;
    assert_eq!(started["question"], "Favorite color?");
    assert_eq!(started["active"], true);

    send_json(&mut alice, json!({"type": "submitAnswer", "optionIndex": 0})).await;
    let first_update = read_until_type(&mut bob, "voteUpdate").await;
    assert_eq!(first_update["total"], 1);

    send_json(&mut bob, json!({"type": "submitAnswer", "optionIndex": 1})).await;

    // then (期待する結果): 全員回答で終了が全員に配信される
    for client in [&mut teacher, &mut alice, &mut bob] {
        let ended = read_until_type(client, "pollEnded").await;
        assert_eq!(ended["reason"], "all_answered");
        assert_eq!(ended["totalResponses"], 2);
        assert_eq!(ended["options"][0]["count"], 1);
        assert_eq!(ended["options"][1]["count"], 1);
        assert_eq!(ended["active"], false);
    }
}

#[tokio::test]
async fn test_double_vote_is_rejected_with_failure_ack() {
    // テスト項目: 同一接続からの 2 票目が ack のエラーで拒否される
    // given (前提条件): 学生 2 人、うち 1 人が投票済み
    let port = 18092;
    spawn_server(port);
    let mut teacher = connect(port).await;
    let mut alice = connect(port).await;
    let mut bob = connect(port).await;
    register_teacher(&mut teacher).await;
    register_student(&mut alice, "Alice").await;
    register_student(&mut bob, "Bob").await;
    send_json(
        &mut teacher,
        json!({
            "type": "createPoll",
            "question": "Q?",
            "options": ["A", "B"]
        }),
    )
    .await;
    read_until_type(&mut alice, "pollStarted").await;
    send_json(&mut alice, json!({"type": "submitAnswer", "optionIndex": 0})).await;
    read_until_type(&mut alice, "voteUpdate").await;

    // when (操作):
    send_json(&mut alice, json!({"type": "submitAnswer", "optionIndex": 1})).await;

    // then (期待する結果):
    let ack = read_until_type(&mut alice, "ack").await;
    assert_eq!(ack["event"], "submitAnswer");
    assert_eq!(ack["ok"], false);
    assert_eq!(ack["error"], "You have already answered.");
}

#[tokio::test]
async fn test_chat_message_is_broadcast_to_all_connections() {
    // テスト項目: チャットメッセージが全接続に配信される
    // given (前提条件):
    let port = 18093;
    spawn_server(port);
    let mut teacher = connect(port).await;
    let mut alice = connect(port).await;
    register_teacher(&mut teacher).await;
    register_student(&mut alice, "Alice").await;

    // when (操作):
    send_json(&mut alice, json!({"type": "chatMessage", "text": "hello"})).await;

    // then (期待する結果): 送信者にも教師にも届く
    for client in [&mut teacher, &mut alice] {
        let chat = read_until_type(client, "chatNew").await;
        assert_eq!(chat["name"], "Alice");
        assert_eq!(chat["role"], "student");
        assert_eq!(chat["text"], "hello");
    }
}

#[tokio::test]
async fn test_removed_student_connection_is_closed() {
    // テスト項目: removeStudent された学生のソケットが閉じられる
    // given (前提条件): 教師と学生が接続済みで、教師がロスターを取得している
    let port = 18094;
    spawn_server(port);
    let mut teacher = connect(port).await;
    let mut alice = connect(port).await;
    register_teacher(&mut teacher).await;
    register_student(&mut alice, "Alice").await;
    send_json(&mut teacher, json!({"type": "listStudents"})).await;
    let roster = read_until_type(&mut teacher, "students").await;
    let student_id = roster["students"][0]["id"].as_str().unwrap().to_string();

    // when (操作):
    send_json(
        &mut teacher,
        json!({"type": "removeStudent", "studentId": student_id}),
    )
    .await;

    // then (期待する結果): 学生側のストリームが終了する
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = alice.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return,
                _ => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "Student socket was not closed");

    // ロスターから学生が消えている
    send_json(&mut teacher, json!({"type": "listStudents"})).await;
    let roster = read_until_type(&mut teacher, "students").await;
    assert_eq!(roster["students"], json!([]));
}

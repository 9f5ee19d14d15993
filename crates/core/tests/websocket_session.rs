//! End-to-end sessions against a local tungstenite server.

use std::time::Duration;

use aw::{ConnectionState, Level, Outcome, SessionConfig, SessionManager, SessionStatus};
use aw_runtime::CLOSE_NORMAL;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn accept(listener: &TcpListener) -> (WebSocketStream<TcpStream>, String) {
	let (stream, _) = listener.accept().await.unwrap();
	let (path_tx, path_rx) = oneshot::channel();
	let ws = tokio_tungstenite::accept_hdr_async(stream, move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
		let _ = path_tx.send(request.uri().path().to_string());
		Ok(response)
	})
	.await
	.unwrap();
	(ws, path_rx.await.unwrap())
}

async fn settle(manager: &mut SessionManager<aw_runtime::WebSocketConnector>) -> SessionStatus {
	tokio::time::timeout(Duration::from_secs(5), manager.run_until_settled())
		.await
		.expect("session should settle")
}

#[tokio::test]
async fn completed_analysis() {
	init_tracing();
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (mut ws, path) = accept(&listener).await;
		for frame in [
			r#"{"type":"log","message":"starting"}"#,
			r#"{"type":"progress","progress":42}"#,
			r#"{"type":"result","data":{"risk":7}}"#,
		] {
			ws.send(Message::Text(frame.into())).await.unwrap();
		}
		ws.close(Some(CloseFrame {
			code: CloseCode::Normal,
			reason: "done".into(),
		}))
		.await
		.unwrap();
		while let Some(Ok(_)) = ws.next().await {}
		path
	});

	let mut manager = SessionManager::websocket(&format!("ws://{addr}/ws/analysis/"), SessionConfig::default()).unwrap();
	let view = manager.observe(Some("A1"));

	assert_eq!(settle(&mut manager).await, SessionStatus::Completed);
	assert_eq!(server.await.unwrap(), "/ws/analysis/A1");

	let view = view.borrow();
	assert_eq!(view.connection(), ConnectionState::Closed);
	assert_eq!(view.progress(), 100.0);
	assert_eq!(view.outcome(), Some(&Outcome::Result(json!({"risk": 7}))));
	let messages: Vec<_> = view.log().iter().map(|e| (e.level, e.message.as_str())).collect();
	assert_eq!(
		messages,
		vec![
			(Level::Info, "Connected to analysis server"),
			(Level::Info, "starting"),
			(Level::Success, "Analysis completed successfully"),
		]
	);
}

#[tokio::test]
async fn dropped_connection_is_lost() {
	init_tracing();
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	tokio::spawn(async move {
		let (mut ws, _) = accept(&listener).await;
		ws.send(Message::Text(r#"{"type":"progress","progress":10}"#.into())).await.unwrap();
		drop(ws);
	});

	let mut manager = SessionManager::websocket(&format!("ws://{addr}/ws/analysis/"), SessionConfig::default()).unwrap();
	manager.observe(Some("A1"));

	assert_eq!(settle(&mut manager).await, SessionStatus::ConnectionLost);
	let view = manager.view();
	assert_eq!(view.connection(), ConnectionState::Errored);
	assert!(view.outcome().is_none());
	let warnings = view.log().iter().filter(|e| e.level == Level::Warning).count();
	assert_eq!(warnings, 1);
}

#[tokio::test]
async fn superseded_session_closes_normally() {
	init_tracing();
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let (opened_tx, opened_rx) = oneshot::channel();
	let server = tokio::spawn(async move {
		let (mut first, first_path) = accept(&listener).await;
		let _ = opened_tx.send(());
		let (_second, second_path) = accept(&listener).await;

		let close = loop {
			match first.next().await {
				Some(Ok(Message::Close(frame))) => break frame.map(|f| (u16::from(f.code), f.reason.to_string())),
				Some(Ok(_)) => continue,
				_ => break None,
			}
		};
		(first_path, second_path, close)
	});

	let mut manager = SessionManager::websocket(&format!("ws://{addr}/ws/analysis/"), SessionConfig::default()).unwrap();
	manager.observe(Some("A1"));
	opened_rx.await.unwrap();
	let view = manager.observe(Some("A2"));

	let (first_path, second_path, close) = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
	assert_eq!(first_path, "/ws/analysis/A1");
	assert_eq!(second_path, "/ws/analysis/A2");
	assert_eq!(close, Some((CLOSE_NORMAL, "superseded".to_string())));
	assert_eq!(view.borrow().analysis_id().map(|id| id.as_str()), Some("A2"));
}

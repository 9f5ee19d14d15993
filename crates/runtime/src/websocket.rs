//! WebSocket transport built on tokio-tungstenite.
//!
//! Each [`WebSocketConnector::connect`] call spawns one task that owns the
//! socket. The task forwards everything it observes to the [`EventSink`] and
//! exits after reporting exactly one `Closed` signal, or immediately when the
//! handle asks it to close.

use std::time::Duration;

use aw_protocol::AnalysisId;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use url::Url;

use crate::connector::Connector;
use crate::error::{Result, TransportError};
use crate::event::EventSink;
use crate::handle::{CLOSE_ABNORMAL, CLOSE_NO_STATUS, CloseRequest, CloseSignal, TransportHandle};

/// Default handshake deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens one WebSocket per analysis at `<endpoint>/<analysis id>`.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
	endpoint: Url,
	connect_timeout: Duration,
}

impl WebSocketConnector {
	/// Creates a connector for a `ws://` or `wss://` endpoint.
	pub fn new(endpoint: &str) -> Result<Self> {
		let invalid = |reason: &str| TransportError::InvalidEndpoint {
			endpoint: endpoint.to_string(),
			reason: reason.to_string(),
		};

		let endpoint = Url::parse(endpoint).map_err(|err| invalid(&err.to_string()))?;
		if !matches!(endpoint.scheme(), "ws" | "wss") {
			return Err(invalid("scheme must be ws or wss"));
		}
		if endpoint.cannot_be_a_base() {
			return Err(invalid("endpoint cannot carry a path"));
		}

		Ok(Self {
			endpoint,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
		})
	}

	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;
		self
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	pub fn connect_timeout(&self) -> Duration {
		self.connect_timeout
	}

	/// Returns the address for `analysis_id`, appended as one encoded path segment.
	pub fn address_for(&self, analysis_id: &AnalysisId) -> Url {
		let mut url = self.endpoint.clone();
		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().push(analysis_id.as_str());
		}
		url
	}
}

impl Connector for WebSocketConnector {
	fn connect(&self, sink: EventSink) -> Result<TransportHandle> {
		let runtime = tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
		let url = self.address_for(sink.analysis_id());
		let (handle, close_rx) = TransportHandle::new(sink.epoch(), sink.analysis_id().clone());

		runtime.spawn(run_socket(url, self.connect_timeout, sink, close_rx));
		Ok(handle)
	}
}

async fn run_socket(url: Url, connect_timeout: Duration, sink: EventSink, mut close_rx: CloseSignal) {
	debug!(target = "aw.transport", %url, epoch = %sink.epoch(), "connecting");

	let handshake = tokio::time::timeout(connect_timeout, connect_async(url.as_str()));
	let mut socket = tokio::select! {
		result = handshake => match result {
			Ok(Ok((socket, _response))) => socket,
			Ok(Err(err)) => {
				warn!(target = "aw.transport", %url, error = %err, "connect failed");
				sink.fault(err.to_string());
				sink.closed(CLOSE_ABNORMAL, "connect failed");
				return;
			}
			Err(_) => {
				warn!(target = "aw.transport", %url, timeout_ms = connect_timeout.as_millis() as u64, "handshake timed out");
				sink.fault(format!("handshake timed out after {}ms", connect_timeout.as_millis()));
				sink.closed(CLOSE_ABNORMAL, "connect timeout");
				return;
			}
		},
		_ = &mut close_rx => {
			debug!(target = "aw.transport", %url, "closed before handshake completed");
			return;
		}
	};

	debug!(target = "aw.transport", %url, "connected");
	sink.opened();

	loop {
		tokio::select! {
			request = &mut close_rx => {
				let request = request.unwrap_or_else(|_| CloseRequest::normal("released"));
				close_socket(&mut socket, &request, connect_timeout).await;
				sink.closed(request.code, request.reason);
				return;
			}
			message = socket.next() => match message {
				Some(Ok(Message::Text(text))) => {
					sink.frame(text.to_string());
				}
				Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
					Ok(text) => {
						sink.frame(text);
					}
					Err(_) => debug!(target = "aw.transport", len = bytes.len(), "dropping non-UTF-8 binary frame"),
				},
				Some(Ok(Message::Close(frame))) => {
					let (code, reason) = frame
						.map(|frame| (u16::from(frame.code), frame.reason.to_string()))
						.unwrap_or((CLOSE_NO_STATUS, String::new()));
					debug!(target = "aw.transport", %url, code, %reason, "peer closed");
					drain(&mut socket, connect_timeout).await;
					sink.closed(code, reason);
					return;
				}
				Some(Ok(_)) => {}
				Some(Err(err)) => {
					warn!(target = "aw.transport", %url, error = %err, "socket error");
					sink.fault(err.to_string());
					sink.closed(CLOSE_ABNORMAL, err.to_string());
					return;
				}
				None => {
					debug!(target = "aw.transport", %url, "stream ended without close frame");
					sink.closed(CLOSE_ABNORMAL, "connection dropped");
					return;
				}
			}
		}
	}
}

async fn close_socket(socket: &mut Socket, request: &CloseRequest, deadline: Duration) {
	let frame = CloseFrame {
		code: CloseCode::from(request.code),
		reason: request.reason.clone().into(),
	};
	if let Err(err) = socket.close(Some(frame)).await {
		debug!(target = "aw.transport", error = %err, "close handshake failed");
		return;
	}
	drain(socket, deadline).await;
}

/// Reads until the peer finishes the close handshake or `deadline` passes.
async fn drain(socket: &mut Socket, deadline: Duration) {
	let _ = tokio::time::timeout(deadline, async {
		while let Some(Ok(_)) = socket.next().await {}
	})
	.await;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_non_websocket_endpoints() {
		assert!(matches!(
			WebSocketConnector::new("http://localhost:8000/ws/analysis/"),
			Err(TransportError::InvalidEndpoint { .. })
		));
		assert!(matches!(WebSocketConnector::new("not a url"), Err(TransportError::InvalidEndpoint { .. })));
	}

	#[test]
	fn appends_identifier_as_segment() {
		let connector = WebSocketConnector::new("ws://localhost:8000/ws/analysis/").unwrap();
		let id = AnalysisId::parse("A1").unwrap();
		assert_eq!(connector.address_for(&id).as_str(), "ws://localhost:8000/ws/analysis/A1");

		let connector = WebSocketConnector::new("ws://localhost:8000/ws/analysis").unwrap();
		assert_eq!(connector.address_for(&id).as_str(), "ws://localhost:8000/ws/analysis/A1");
	}

	#[test]
	fn encodes_identifier() {
		let connector = WebSocketConnector::new("wss://example.com/stream/").unwrap();
		let id = AnalysisId::parse("a/b c").unwrap();
		assert_eq!(connector.address_for(&id).as_str(), "wss://example.com/stream/a%2Fb%20c");
	}

	#[test]
	fn connect_requires_runtime() {
		let connector = WebSocketConnector::new("ws://127.0.0.1:9/").unwrap();
		let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
		let sink = EventSink::new(crate::Epoch::new(1), AnalysisId::parse("A1").unwrap(), tx);
		assert!(matches!(connector.connect(sink), Err(TransportError::NoRuntime)));
	}
}

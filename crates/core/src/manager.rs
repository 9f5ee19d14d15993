//! Public controller for one live analysis session.
//!
//! The manager owns the only channel transports report into, so every
//! mutation of the view happens inside [`SessionManager::handle`], one event
//! at a time, in delivery order. Events are tagged with the epoch of the
//! transport that produced them; anything from a superseded transport is
//! discarded before it can touch the view.

use aw_protocol::AnalysisId;
use aw_runtime::{Connector, TransportEvent, TransportSignal, WebSocketConnector};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::machine::{BindOutcome, ConnectionState, SessionMachine};
use crate::view::{Outcome, SessionStatus, SessionView};

/// Change in a session's terminal status, reported once per session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
	Completed(Value),
	Failed(String),
	ConnectionLost,
}

/// Binds analysis identifiers to transports and publishes the reduced view.
pub struct SessionManager<C: Connector> {
	connector: C,
	machine: SessionMachine,
	events_tx: mpsc::UnboundedSender<TransportEvent>,
	events_rx: mpsc::UnboundedReceiver<TransportEvent>,
	view_tx: watch::Sender<SessionView>,
}

impl SessionManager<WebSocketConnector> {
	/// Creates a manager that opens WebSockets under `endpoint`.
	pub fn websocket(endpoint: &str, config: SessionConfig) -> Result<Self> {
		Ok(Self::new(WebSocketConnector::new(endpoint)?, config))
	}
}

impl<C: Connector> SessionManager<C> {
	pub fn new(connector: C, config: SessionConfig) -> Self {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let (view_tx, _) = watch::channel(SessionView::default());
		Self {
			connector,
			machine: SessionMachine::new(config.progress_policy),
			events_tx,
			events_rx,
			view_tx,
		}
	}

	/// Binds `analysis_id` and returns a live projection of the view.
	///
	/// `None` (or a blank identifier) clears the session. A different
	/// identifier supersedes the current session; the identifier of the live
	/// session is a no-op.
	pub fn observe<S: AsRef<str>>(&mut self, analysis_id: Option<S>) -> watch::Receiver<SessionView> {
		let analysis_id = analysis_id.and_then(AnalysisId::parse);
		match self.machine.bind(analysis_id, &self.connector, &self.events_tx) {
			BindOutcome::Unchanged => {}
			BindOutcome::Bound(_) | BindOutcome::Cleared => self.publish(),
		}
		self.view_tx.subscribe()
	}

	/// Clears the session; equivalent to `observe(None)`.
	pub fn clear(&mut self) {
		self.machine.clear("cleared");
		self.publish();
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionView> {
		self.view_tx.subscribe()
	}

	pub fn view(&self) -> &SessionView {
		self.machine.view()
	}

	pub fn status(&self) -> SessionStatus {
		self.machine.view().status()
	}

	pub fn connection(&self) -> ConnectionState {
		self.machine.state()
	}

	/// Returns `true` while the bound session still has a pending or open transport.
	pub fn is_live(&self) -> bool {
		self.machine.state().is_live()
	}

	/// Applies one transport event.
	///
	/// Returns a notice when the event moved the session into a terminal
	/// status (completed, failed, or connection lost).
	pub fn handle(&mut self, event: TransportEvent) -> Option<SessionNotice> {
		if !self.machine.is_current(event.epoch) {
			debug!(
				target = "aw.session",
				analysis_id = %event.analysis_id,
				epoch = %event.epoch,
				signal = ?event.signal,
				"discarding event from superseded transport"
			);
			return None;
		}

		let before = self.status();
		match event.signal {
			TransportSignal::Opened => self.machine.on_open(),
			TransportSignal::Frame(text) => self.machine.on_frame(&text),
			TransportSignal::Closed { code, reason } => self.machine.on_close(code, &reason),
			TransportSignal::Fault(detail) => self.machine.on_transport_error(&detail),
		}
		self.publish();

		let after = self.status();
		if before == after {
			return None;
		}
		self.notice_for(after)
	}

	/// Waits for the next transport event and applies it.
	pub async fn next_event(&mut self) -> Option<SessionNotice> {
		let event = self.events_rx.recv().await?;
		self.handle(event)
	}

	/// Applies every event already queued without waiting.
	pub fn drain(&mut self) -> Vec<SessionNotice> {
		let mut notices = Vec::new();
		while let Ok(event) = self.events_rx.try_recv() {
			notices.extend(self.handle(event));
		}
		notices
	}

	/// Drives events until the session is no longer live.
	pub async fn run_until_settled(&mut self) -> SessionStatus {
		while self.is_live() {
			self.next_event().await;
		}
		self.status()
	}

	/// Releases the transport with a normal close and returns to idle.
	pub fn shutdown(&mut self) {
		self.machine.clear("disposed");
		self.publish();
	}

	fn notice_for(&self, status: SessionStatus) -> Option<SessionNotice> {
		match (status, self.view().outcome()) {
			(SessionStatus::Completed, Some(Outcome::Result(payload))) => Some(SessionNotice::Completed(payload.clone())),
			(SessionStatus::Failed, Some(Outcome::Failure(reason))) => Some(SessionNotice::Failed(reason.clone())),
			(SessionStatus::ConnectionLost, _) => Some(SessionNotice::ConnectionLost),
			_ => None,
		}
	}

	fn publish(&self) {
		self.view_tx.send_replace(self.machine.view().clone());
	}
}

impl<C: Connector> Drop for SessionManager<C> {
	fn drop(&mut self) {
		self.machine.teardown("disposed");
	}
}

//! Connection lifecycle for the bound session.
//!
//! Transitions are a pure table on [`ConnectionState`]; [`SessionMachine`]
//! applies them and performs the side effects (opening and closing transports,
//! feeding the reducer).
//!
//! ```text
//!            bind                opened
//!   Idle ───────────▶ Connecting ───────▶ Open
//!    ▲                    │                │
//!    │ clear              │ close / fault  │ close(1000) ──▶ Closed
//!    └────────────────────┴────────────────┴ close(other) / fault ──▶ Errored
//! ```

use aw_protocol::{AnalysisId, StreamEvent, decode_frame};
use aw_runtime::{CLOSE_ABNORMAL, CLOSE_NORMAL, Connector, Epoch, EventSink, TransportEvent, TransportHandle, is_normal_close};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ProgressPolicy;
use crate::reducer;
use crate::view::SessionView;

/// Connection state of the bound session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
	#[default]
	Idle,
	Connecting,
	Open,
	Closed,
	Errored,
}

/// Inputs to the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
	Bind,
	Clear,
	Opened,
	Closed { normal: bool },
	TransportFault,
}

impl ConnectionState {
	/// Returns `true` while a transport is pending or open.
	pub fn is_live(self) -> bool {
		matches!(self, ConnectionState::Connecting | ConnectionState::Open)
	}

	pub fn transition(self, signal: Signal) -> ConnectionState {
		use ConnectionState::*;

		match (self, signal) {
			(_, Signal::Clear) => Idle,
			(_, Signal::Bind) => Connecting,
			(Connecting, Signal::Opened) => Open,
			(Connecting | Open, Signal::Closed { normal: true }) => Closed,
			(Connecting | Open, Signal::Closed { normal: false }) => Errored,
			(Connecting | Open, Signal::TransportFault) => Errored,
			(state, _) => state,
		}
	}
}

/// Live binding of one identifier to one transport.
#[derive(Debug)]
pub struct Session {
	analysis_id: AnalysisId,
	epoch: Epoch,
	created_at: DateTime<Utc>,
	state: ConnectionState,
	transport: Option<TransportHandle>,
	close_seen: bool,
	loss_noted: bool,
}

impl Session {
	pub fn analysis_id(&self) -> &AnalysisId {
		&self.analysis_id
	}

	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	pub fn created_at(&self) -> DateTime<Utc> {
		self.created_at
	}

	pub fn state(&self) -> ConnectionState {
		self.state
	}

	/// Returns `true` while this session still owns a transport.
	pub fn has_transport(&self) -> bool {
		self.transport.is_some()
	}
}

/// Result of [`SessionMachine::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
	/// Same identifier as the live session; nothing happened.
	Unchanged,
	/// A new session was started with this epoch.
	Bound(Epoch),
	/// The session was torn down and the view reset to idle.
	Cleared,
}

/// Owns the bound session, its transport, and the accumulated view.
#[derive(Debug)]
pub struct SessionMachine {
	session: Option<Session>,
	view: SessionView,
	last_epoch: Epoch,
	policy: ProgressPolicy,
}

impl SessionMachine {
	pub fn new(policy: ProgressPolicy) -> Self {
		Self {
			session: None,
			view: SessionView::default(),
			last_epoch: Epoch::default(),
			policy,
		}
	}

	pub fn view(&self) -> &SessionView {
		&self.view
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	pub fn state(&self) -> ConnectionState {
		self.session.as_ref().map_or(ConnectionState::Idle, Session::state)
	}

	/// Returns `true` when `epoch` belongs to the bound session.
	pub fn is_current(&self, epoch: Epoch) -> bool {
		self.session.as_ref().is_some_and(|session| session.epoch == epoch)
	}

	/// Binds `analysis_id`, replacing any other session.
	///
	/// `None` tears down the session and resets the view to idle. The same
	/// identifier as a live session is a no-op; after a terminal state it
	/// starts over with a fresh transport.
	pub fn bind<C: Connector>(&mut self, analysis_id: Option<AnalysisId>, connector: &C, events: &mpsc::UnboundedSender<TransportEvent>) -> BindOutcome {
		let Some(analysis_id) = analysis_id else {
			self.clear("cleared");
			return BindOutcome::Cleared;
		};

		if let Some(session) = &self.session {
			if session.analysis_id == analysis_id && session.state.is_live() {
				debug!(target = "aw.session", %analysis_id, "already bound; keeping session");
				return BindOutcome::Unchanged;
			}
		}

		self.teardown("superseded");

		self.last_epoch = self.last_epoch.next();
		let epoch = self.last_epoch;
		let created_at = Utc::now();
		let state = ConnectionState::Idle.transition(Signal::Bind);

		info!(target = "aw.session", %analysis_id, %epoch, "binding session");
		self.view = SessionView::for_session(analysis_id.clone(), created_at);
		self.view.set_connection(state);
		self.session = Some(Session {
			analysis_id: analysis_id.clone(),
			epoch,
			created_at,
			state,
			transport: None,
			close_seen: false,
			loss_noted: false,
		});

		match connector.connect(EventSink::new(epoch, analysis_id.clone(), events.clone())) {
			Ok(handle) => {
				if let Some(session) = self.session.as_mut() {
					session.transport = Some(handle);
				}
			}
			Err(err) => {
				warn!(target = "aw.session", %analysis_id, error = %err, "transport failed to start");
				self.on_transport_error(&err.to_string());
				self.on_close(CLOSE_ABNORMAL, "connect failed");
			}
		}

		BindOutcome::Bound(epoch)
	}

	/// Tears down the session and resets the view to idle.
	pub fn clear(&mut self, reason: &str) {
		self.teardown(reason);
		if let Some(session) = self.session.take() {
			info!(target = "aw.session", analysis_id = %session.analysis_id, %reason, "session cleared");
		}
		self.view = SessionView::default();
	}

	/// Closes the active transport with a normal code, keeping the view.
	pub fn teardown(&mut self, reason: &str) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		if let Some(handle) = session.transport.take() {
			debug!(target = "aw.session", analysis_id = %session.analysis_id, epoch = %session.epoch, %reason, "releasing transport");
			handle.close(CLOSE_NORMAL, reason);
		}
	}

	pub fn on_open(&mut self) {
		if self.state() != ConnectionState::Connecting {
			debug!(target = "aw.session", state = ?self.state(), "ignoring open outside connecting");
			return;
		}
		self.transition(Signal::Opened);
		reducer::note_connected(&mut self.view);
	}

	pub fn on_frame(&mut self, raw: &str) {
		if self.state() != ConnectionState::Open {
			debug!(target = "aw.session", state = ?self.state(), "ignoring frame outside open");
			reducer::note_ignored(&mut self.view);
			return;
		}

		match decode_frame(raw) {
			Ok(event) => {
				if let StreamEvent::Unknown { kind } = &event {
					debug!(target = "aw.codec", %kind, "unrecognised message type");
				}
				let terminal = event.is_terminal();
				if reducer::apply(&mut self.view, event, self.policy) && terminal {
					info!(target = "aw.session", status = %self.view.status(), "analysis finished");
				}
			}
			Err(err) => {
				debug!(target = "aw.codec", error = %err, "dropping undecodable frame");
				reducer::note_undecodable(&mut self.view);
			}
		}
	}

	pub fn on_close(&mut self, code: u16, reason: &str) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		if session.close_seen {
			return;
		}
		session.close_seen = true;
		if let Some(handle) = session.transport.take() {
			handle.release();
		}

		let normal = is_normal_close(code);
		self.transition(Signal::Closed { normal });

		if normal {
			info!(target = "aw.session", code, %reason, "session closed");
		} else {
			warn!(target = "aw.session", code, %reason, terminal = self.view.is_terminal(), "connection lost");
			self.note_loss();
		}
	}

	pub fn on_transport_error(&mut self, detail: &str) {
		if self.session.is_none() {
			return;
		}
		warn!(target = "aw.session", %detail, "transport fault");
		reducer::note_transport_error(&mut self.view, detail);
		self.transition(Signal::TransportFault);
		if self.state() == ConnectionState::Errored {
			self.note_loss();
		}
	}

	/// Appends the connection-lost warning at most once per session.
	fn note_loss(&mut self) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		if session.loss_noted {
			return;
		}
		session.loss_noted = true;
		reducer::note_connection_lost(&mut self.view);
	}

	fn transition(&mut self, signal: Signal) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let next = session.state.transition(signal);
		if next != session.state {
			debug!(target = "aw.session", from = ?session.state, to = ?next, ?signal, "state transition");
		}
		session.state = next;
		self.view.set_connection(next);
	}
}

#[cfg(test)]
mod tests {
	use aw_runtime::{CloseRequest, FakeConnector};

	use super::*;
	use crate::SessionStatus;

	fn id(raw: &str) -> Option<AnalysisId> {
		AnalysisId::parse(raw)
	}

	#[test]
	fn transition_table() {
		use ConnectionState::*;

		assert_eq!(Idle.transition(Signal::Bind), Connecting);
		assert_eq!(Connecting.transition(Signal::Opened), Open);
		assert_eq!(Open.transition(Signal::Closed { normal: true }), Closed);
		assert_eq!(Open.transition(Signal::Closed { normal: false }), Errored);
		assert_eq!(Connecting.transition(Signal::TransportFault), Errored);
		assert_eq!(Errored.transition(Signal::Closed { normal: true }), Errored);
		assert_eq!(Closed.transition(Signal::Opened), Closed);
		assert_eq!(Idle.transition(Signal::Opened), Idle);
		assert_eq!(Errored.transition(Signal::Bind), Connecting);
		assert_eq!(Open.transition(Signal::Clear), Idle);
	}

	#[test]
	fn live_states() {
		assert!(ConnectionState::Connecting.is_live());
		assert!(ConnectionState::Open.is_live());
		assert!(!ConnectionState::Idle.is_live());
		assert!(!ConnectionState::Closed.is_live());
		assert!(!ConnectionState::Errored.is_live());
	}

	#[test]
	fn open_appends_connected_entry() {
		let (connector, _controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_open();

		assert_eq!(machine.state(), ConnectionState::Open);
		assert_eq!(machine.view().log().len(), 1);
		assert_eq!(machine.view().log()[0].message, reducer::CONNECTED_MESSAGE);
	}

	#[test]
	fn frames_before_open_are_ignored() {
		let (connector, _controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_frame(r#"{"type":"progress","progress":50}"#);

		assert_eq!(machine.view().progress(), 0.0);
		assert_eq!(machine.view().diagnostics().ignored_frames, 1);
	}

	#[test]
	fn malformed_frame_keeps_session_open() {
		let (connector, _controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_open();
		machine.on_frame("{not json");
		machine.on_frame(r#"{"type":"progress","progress":5}"#);

		assert_eq!(machine.state(), ConnectionState::Open);
		assert_eq!(machine.view().diagnostics().dropped_frames, 1);
		assert_eq!(machine.view().progress(), 5.0);
	}

	#[test]
	fn normal_close_adds_no_warning() {
		let (connector, _controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_open();
		machine.on_close(CLOSE_NORMAL, "");

		assert_eq!(machine.state(), ConnectionState::Closed);
		assert_eq!(machine.view().log().len(), 1);
		assert!(!machine.session().unwrap().has_transport());
	}

	#[test]
	fn abnormal_close_after_outcome_adds_no_warning() {
		let (connector, _controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_open();
		machine.on_frame(r#"{"type":"result","data":{}}"#);
		let entries = machine.view().log().len();
		machine.on_close(CLOSE_ABNORMAL, "");

		assert_eq!(machine.state(), ConnectionState::Errored);
		assert_eq!(machine.view().log().len(), entries);
		assert_eq!(machine.view().status(), SessionStatus::Completed);
	}

	#[test]
	fn fault_then_close_warns_once() {
		let (connector, _controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_transport_error("refused");
		assert_eq!(machine.view().log().len(), 1);
		assert_eq!(machine.view().log()[0].message, reducer::CONNECTION_LOST_MESSAGE);
		machine.on_close(CLOSE_ABNORMAL, "");
		machine.on_close(CLOSE_ABNORMAL, "");

		assert_eq!(machine.state(), ConnectionState::Errored);
		assert!(machine.view().transport_error().is_some());
		assert!(machine.view().outcome().is_none());
		assert_eq!(machine.view().log().len(), 1);
	}

	#[test]
	fn refused_connect_is_a_transport_fault() {
		let (connector, controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		controller.refuse_next("offline");
		let outcome = machine.bind(id("A1"), &connector, &tx);

		assert!(matches!(outcome, BindOutcome::Bound(_)));
		assert_eq!(machine.state(), ConnectionState::Errored);
		assert_eq!(machine.view().status(), SessionStatus::ConnectionLost);
		assert_eq!(machine.view().log().len(), 1);
	}

	#[test]
	fn clear_closes_transport_and_resets() {
		let (connector, controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.on_open();
		assert_eq!(machine.bind(None, &connector, &tx), BindOutcome::Cleared);

		assert_eq!(controller.close_request(0), Some(CloseRequest::normal("cleared")));
		assert_eq!(machine.state(), ConnectionState::Idle);
		assert_eq!(machine.view(), &SessionView::default());
	}

	#[test]
	fn epochs_increase_per_bind() {
		let (connector, controller) = FakeConnector::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		let mut machine = SessionMachine::new(ProgressPolicy::Permissive);

		machine.bind(id("A1"), &connector, &tx);
		machine.bind(id("A2"), &connector, &tx);

		assert!(controller.epoch(1) > controller.epoch(0));
		assert!(machine.is_current(controller.epoch(1)));
		assert!(!machine.is_current(controller.epoch(0)));
	}
}

//! Observable session state.

use std::fmt;

use aw_protocol::{AnalysisId, Level};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::machine::ConnectionState;

/// One immutable line of the session log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
	/// Unique within the session, assigned in arrival order starting at 1.
	pub id: u64,
	pub message: String,
	pub level: Level,
	pub timestamp: DateTime<Utc>,
}

/// Terminal value of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
	Result(Value),
	Failure(String),
}

/// Per-session counters for frames that did not change the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
	/// Frames that could not be decoded.
	pub dropped_frames: u64,
	/// Well-formed frames with an unrecognised `type`.
	pub unknown_frames: u64,
	/// Frames that arrived outside `Open` or after the outcome.
	pub ignored_frames: u64,
}

/// Renderable summary of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	/// No analysis bound.
	Disconnected,
	/// Transport opened, handshake pending.
	Connecting,
	/// Connected, analysis in progress.
	Streaming,
	/// Transport ended before an outcome arrived.
	ConnectionLost,
	Completed,
	Failed,
}

impl SessionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			SessionStatus::Disconnected => "disconnected",
			SessionStatus::Connecting => "connecting",
			SessionStatus::Streaming => "streaming",
			SessionStatus::ConnectionLost => "connection_lost",
			SessionStatus::Completed => "completed",
			SessionStatus::Failed => "failed",
		}
	}
}

impl fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Reduced, externally observable state of the current session.
///
/// Fields are private; the log only grows through the reducer and is reset
/// only when a new session is bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
	analysis_id: Option<AnalysisId>,
	connection: ConnectionState,
	#[serde(skip_serializing_if = "Option::is_none")]
	started_at: Option<DateTime<Utc>>,
	log: Vec<LogEntry>,
	progress: f64,
	outcome: Option<Outcome>,
	transport_error: Option<String>,
	diagnostics: Diagnostics,
	#[serde(skip)]
	next_log_id: u64,
}

impl Default for SessionView {
	fn default() -> Self {
		Self {
			analysis_id: None,
			connection: ConnectionState::Idle,
			started_at: None,
			log: Vec::new(),
			progress: 0.0,
			outcome: None,
			transport_error: None,
			diagnostics: Diagnostics::default(),
			next_log_id: 1,
		}
	}
}

impl SessionView {
	/// Fresh view for a newly bound session.
	pub fn for_session(analysis_id: AnalysisId, started_at: DateTime<Utc>) -> Self {
		Self {
			analysis_id: Some(analysis_id),
			connection: ConnectionState::Connecting,
			started_at: Some(started_at),
			..Self::default()
		}
	}

	pub fn analysis_id(&self) -> Option<&AnalysisId> {
		self.analysis_id.as_ref()
	}

	pub fn connection(&self) -> ConnectionState {
		self.connection
	}

	pub fn started_at(&self) -> Option<DateTime<Utc>> {
		self.started_at
	}

	pub fn log(&self) -> &[LogEntry] {
		&self.log
	}

	/// Completion percentage in `[0, 100]`.
	pub fn progress(&self) -> f64 {
		self.progress
	}

	pub fn outcome(&self) -> Option<&Outcome> {
		self.outcome.as_ref()
	}

	/// Transport fault description, distinct from an analysis failure.
	pub fn transport_error(&self) -> Option<&str> {
		self.transport_error.as_deref()
	}

	pub fn diagnostics(&self) -> Diagnostics {
		self.diagnostics
	}

	/// Returns `true` once an outcome has been recorded.
	pub fn is_terminal(&self) -> bool {
		self.outcome.is_some()
	}

	pub fn status(&self) -> SessionStatus {
		match (&self.outcome, self.connection) {
			(Some(Outcome::Result(_)), _) => SessionStatus::Completed,
			(Some(Outcome::Failure(_)), _) => SessionStatus::Failed,
			(None, ConnectionState::Idle) => SessionStatus::Disconnected,
			(None, ConnectionState::Connecting) => SessionStatus::Connecting,
			(None, ConnectionState::Open) => SessionStatus::Streaming,
			(None, ConnectionState::Closed | ConnectionState::Errored) => SessionStatus::ConnectionLost,
		}
	}

	pub(crate) fn set_connection(&mut self, state: ConnectionState) {
		self.connection = state;
	}

	pub(crate) fn set_progress(&mut self, value: f64) {
		self.progress = value;
	}

	pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
		self.outcome = Some(outcome);
	}

	pub(crate) fn set_transport_error(&mut self, detail: String) {
		self.transport_error = Some(detail);
	}

	pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
		&mut self.diagnostics
	}

	pub(crate) fn push_log(&mut self, level: Level, message: impl Into<String>, timestamp: DateTime<Utc>) {
		let id = self.next_log_id;
		self.next_log_id += 1;
		self.log.push(LogEntry {
			id,
			message: message.into(),
			level,
			timestamp,
		});
	}
}

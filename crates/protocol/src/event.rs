//! Typed events decoded from inbound frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::Level;

/// Failure reason used when an `error` frame carries no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred during processing.";

/// One decoded inbound frame.
///
/// ```json
/// { "type": "log",      "message": "starting", "level": "info" }
/// { "type": "progress", "progress": 42 }
/// { "type": "result",   "data": { "risk": 7 } }
/// { "type": "error",    "message": "bad input" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
	/// A server-side log line.
	Log(LogRecord),
	/// Completion percentage, already clamped to `[0, 100]`.
	Progress { value: f64 },
	/// Terminal success payload.
	Result { payload: Value },
	/// Terminal analysis failure.
	Error { reason: String },
	/// Well-formed frame with an unrecognised `type`.
	Unknown { kind: String },
}

impl StreamEvent {
	/// Returns `true` for events that end the analysis.
	pub fn is_terminal(&self) -> bool {
		matches!(self, StreamEvent::Result { .. } | StreamEvent::Error { .. })
	}
}

/// Payload of a `log` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
	pub message: String,
	pub level: Level,
	/// Server-supplied timestamp; `None` means "use arrival time".
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<DateTime<Utc>>,
}

/// Clamps a raw progress value into `[0, 100]`.
pub fn clamp_progress(raw: f64) -> f64 {
	raw.clamp(0.0, 100.0)
}

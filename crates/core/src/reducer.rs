//! Folds decoded stream events into a [`SessionView`].
//!
//! | event    | effect |
//! |----------|--------|
//! | Log      | append an entry in arrival order |
//! | Progress | clamp and set, unless progress already reached 100 |
//! | Result   | set the outcome, force progress to 100, append a success entry |
//! | Error    | set the failure outcome, append an error entry |
//! | Unknown  | count it, nothing else |
//!
//! Terminal events are absorbing: once an outcome exists, stream events only
//! bump [`Diagnostics::ignored_frames`](crate::Diagnostics).

use aw_protocol::{Level, StreamEvent};
use chrono::Utc;

use crate::config::ProgressPolicy;
use crate::view::{Outcome, SessionView};

pub const CONNECTED_MESSAGE: &str = "Connected to analysis server";
pub const COMPLETED_MESSAGE: &str = "Analysis completed successfully";
pub const CONNECTION_LOST_MESSAGE: &str = "Connection to analysis server lost";
pub const TRANSPORT_ERROR_MESSAGE: &str = "Connection error - cannot connect to analysis server";

const PROGRESS_COMPLETE: f64 = 100.0;

/// Applies one decoded event. Returns `true` when the view changed.
pub fn apply(view: &mut SessionView, event: StreamEvent, policy: ProgressPolicy) -> bool {
	if view.is_terminal() {
		view.diagnostics_mut().ignored_frames += 1;
		return false;
	}

	match event {
		StreamEvent::Log(record) => {
			let timestamp = record.timestamp.unwrap_or_else(Utc::now);
			view.push_log(record.level, record.message, timestamp);
			true
		}
		StreamEvent::Progress { value } => apply_progress(view, value, policy),
		StreamEvent::Result { payload } => {
			view.set_outcome(Outcome::Result(payload));
			view.set_progress(PROGRESS_COMPLETE);
			view.push_log(Level::Success, COMPLETED_MESSAGE, Utc::now());
			true
		}
		StreamEvent::Error { reason } => {
			view.push_log(Level::Error, reason.clone(), Utc::now());
			view.set_outcome(Outcome::Failure(reason));
			true
		}
		StreamEvent::Unknown { .. } => {
			view.diagnostics_mut().unknown_frames += 1;
			false
		}
	}
}

fn apply_progress(view: &mut SessionView, value: f64, policy: ProgressPolicy) -> bool {
	if view.progress() >= PROGRESS_COMPLETE {
		view.diagnostics_mut().ignored_frames += 1;
		return false;
	}

	let value = aw_protocol::clamp_progress(value);
	if policy == ProgressPolicy::Monotonic && value < view.progress() {
		view.diagnostics_mut().ignored_frames += 1;
		return false;
	}

	view.set_progress(value);
	true
}

/// Appends the synthetic entry announcing a completed handshake.
pub fn note_connected(view: &mut SessionView) {
	view.push_log(Level::Info, CONNECTED_MESSAGE, Utc::now());
}

/// Appends the warning for a connection that dropped before an outcome.
/// Does nothing once the session has an outcome.
pub fn note_connection_lost(view: &mut SessionView) {
	if !view.is_terminal() {
		view.push_log(Level::Warning, CONNECTION_LOST_MESSAGE, Utc::now());
	}
}

/// Records a transport fault; never touches the outcome.
pub fn note_transport_error(view: &mut SessionView, detail: &str) {
	let message = if detail.is_empty() {
		TRANSPORT_ERROR_MESSAGE.to_string()
	} else {
		format!("{TRANSPORT_ERROR_MESSAGE}: {detail}")
	};
	view.set_transport_error(message);
}

pub fn note_undecodable(view: &mut SessionView) {
	view.diagnostics_mut().dropped_frames += 1;
}

pub fn note_ignored(view: &mut SessionView) {
	view.diagnostics_mut().ignored_frames += 1;
}

//! Offline reduction of recorded streams.
//!
//! A recording holds one raw frame per line, exactly as the server sent them.
//! Replaying it runs the same codec and reducer a live session uses, without
//! a transport, which makes it handy for checking what a client would have
//! shown for a given server run.

use std::io::BufRead;

use aw_protocol::{AnalysisId, decode_frame};
use chrono::Utc;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::machine::ConnectionState;
use crate::reducer;
use crate::view::SessionView;

/// Reduces every frame in `reader` and returns the final view.
///
/// Blank lines are skipped. The returned view is `Closed` since the recording
/// ended normally.
pub fn replay<R: BufRead>(analysis_id: AnalysisId, reader: R, config: &SessionConfig) -> Result<SessionView> {
	let mut view = SessionView::for_session(analysis_id, Utc::now());
	view.set_connection(ConnectionState::Open);

	for (index, line) in reader.lines().enumerate() {
		let line = line?;
		if line.trim().is_empty() {
			continue;
		}
		match decode_frame(&line) {
			Ok(event) => {
				reducer::apply(&mut view, event, config.progress_policy);
			}
			Err(err) => {
				debug!(target = "aw.codec", line = index + 1, error = %err, "dropping undecodable frame");
				reducer::note_undecodable(&mut view);
			}
		}
	}

	view.set_connection(ConnectionState::Closed);
	Ok(view)
}

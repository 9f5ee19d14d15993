//! Close handles for running transports.

use aw_protocol::AnalysisId;
use tokio::sync::oneshot;
use tracing::debug;

use crate::event::Epoch;

/// Close code for a normal, intentional closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code reported when no close status was received.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Close code for a connection that dropped without a close handshake.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Returns `true` when `code` denotes a graceful shutdown.
pub fn is_normal_close(code: u16) -> bool {
	code == CLOSE_NORMAL
}

/// Close code and reason sent to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
	pub code: u16,
	pub reason: String,
}

impl CloseRequest {
	pub fn normal(reason: impl Into<String>) -> Self {
		Self {
			code: CLOSE_NORMAL,
			reason: reason.into(),
		}
	}
}

/// Receiving half of a handle's close channel, held by the transport task.
pub type CloseSignal = oneshot::Receiver<CloseRequest>;

/// Owning handle for one running transport.
///
/// Dropping the handle closes the transport with [`CLOSE_NORMAL`], so the
/// remote end is released on every exit path. Use [`TransportHandle::release`]
/// when the transport has already finished on its own.
#[derive(Debug)]
pub struct TransportHandle {
	epoch: Epoch,
	analysis_id: AnalysisId,
	close_tx: Option<oneshot::Sender<CloseRequest>>,
}

impl TransportHandle {
	/// Creates a handle and the close signal the transport task listens on.
	pub fn new(epoch: Epoch, analysis_id: AnalysisId) -> (Self, CloseSignal) {
		let (close_tx, close_rx) = oneshot::channel();
		let handle = Self {
			epoch,
			analysis_id,
			close_tx: Some(close_tx),
		};
		(handle, close_rx)
	}

	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	pub fn analysis_id(&self) -> &AnalysisId {
		&self.analysis_id
	}

	/// Asks the transport to close with `code` and `reason`.
	pub fn close(mut self, code: u16, reason: impl Into<String>) {
		self.send_close(CloseRequest {
			code,
			reason: reason.into(),
		});
	}

	/// Drops the handle without sending a close request.
	pub fn release(mut self) {
		self.close_tx = None;
	}

	fn send_close(&mut self, request: CloseRequest) {
		if let Some(tx) = self.close_tx.take() {
			debug!(
				target = "aw.transport",
				analysis_id = %self.analysis_id,
				epoch = %self.epoch,
				code = request.code,
				reason = %request.reason,
				"closing transport"
			);
			let _ = tx.send(request);
		}
	}
}

impl Drop for TransportHandle {
	fn drop(&mut self) {
		self.send_close(CloseRequest::normal("disposed"));
	}
}

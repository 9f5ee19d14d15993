use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures raised synchronously while opening a transport.
///
/// Faults that happen after a transport is running (refused handshakes, dropped
/// sockets) are not errors here; they arrive as [`TransportSignal::Fault`]
/// events so they are ordered with everything else the transport produced.
///
/// [`TransportSignal::Fault`]: crate::event::TransportSignal::Fault
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("invalid endpoint `{endpoint}`: {reason}")]
	InvalidEndpoint { endpoint: String, reason: String },

	#[error("no async runtime available to drive the transport")]
	NoRuntime,

	#[error("connection refused: {0}")]
	Refused(String),
}

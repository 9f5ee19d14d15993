//! Epoch-tagged transport events.

use std::fmt;

use aw_protocol::AnalysisId;
use tokio::sync::mpsc;

/// Monotonically increasing tag distinguishing successive transports.
///
/// Every transport is opened for exactly one epoch. Events carrying an epoch
/// other than the manager's current one belong to a superseded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
	pub const fn new(value: u64) -> Self {
		Self(value)
	}

	pub const fn get(self) -> u64 {
		self.0
	}

	pub fn next(self) -> Self {
		Self(self.0 + 1)
	}
}

impl fmt::Display for Epoch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Lifecycle signal produced by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
	/// Handshake completed.
	Opened,
	/// One inbound text frame.
	Frame(String),
	/// The connection closed with the given close code.
	Closed { code: u16, reason: String },
	/// The transport failed to establish or broke unexpectedly.
	Fault(String),
}

/// A transport signal tagged with the transport that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
	pub epoch: Epoch,
	pub analysis_id: AnalysisId,
	pub signal: TransportSignal,
}

/// Sending half handed to a transport; stamps every signal with the
/// transport's identifier and epoch.
#[derive(Debug, Clone)]
pub struct EventSink {
	epoch: Epoch,
	analysis_id: AnalysisId,
	tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSink {
	pub fn new(epoch: Epoch, analysis_id: AnalysisId, tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
		Self { epoch, analysis_id, tx }
	}

	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	pub fn analysis_id(&self) -> &AnalysisId {
		&self.analysis_id
	}

	pub fn opened(&self) -> bool {
		self.emit(TransportSignal::Opened)
	}

	pub fn frame(&self, text: impl Into<String>) -> bool {
		self.emit(TransportSignal::Frame(text.into()))
	}

	pub fn closed(&self, code: u16, reason: impl Into<String>) -> bool {
		self.emit(TransportSignal::Closed { code, reason: reason.into() })
	}

	pub fn fault(&self, detail: impl Into<String>) -> bool {
		self.emit(TransportSignal::Fault(detail.into()))
	}

	/// Returns `false` once the receiving manager is gone.
	fn emit(&self, signal: TransportSignal) -> bool {
		self.tx
			.send(TransportEvent {
				epoch: self.epoch,
				analysis_id: self.analysis_id.clone(),
				signal,
			})
			.is_ok()
	}
}

//! Fake connector for unit testing session lifecycle without sockets.
//!
//! Provides an in-memory transport that records every connect call and lets a
//! test drive each transport's lifecycle by hand.
//!
//! # Example
//!
//! ```ignore
//! let (connector, controller) = FakeConnector::new();
//! let mut manager = SessionManager::new(connector, SessionConfig::default());
//!
//! manager.observe(Some("A1"));
//! controller.open(0);
//! controller.frame(0, r#"{"type":"progress","progress":42}"#);
//! manager.drain();
//! ```

use std::sync::Arc;

use aw_protocol::AnalysisId;
use parking_lot::Mutex;

use crate::connector::Connector;
use crate::error::{Result, TransportError};
use crate::event::{Epoch, EventSink};
use crate::handle::{CloseRequest, CloseSignal, TransportHandle};

/// In-memory [`Connector`]; every `connect` call creates one fake transport.
pub struct FakeConnector {
	state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
	/// Creates a connector and the controller that drives its transports.
	pub fn new() -> (Self, FakeController) {
		let state = Arc::new(Mutex::new(FakeState::default()));
		let connector = Self { state: Arc::clone(&state) };
		(connector, FakeController { state })
	}
}

impl Connector for FakeConnector {
	fn connect(&self, sink: EventSink) -> Result<TransportHandle> {
		let mut state = self.state.lock();
		if let Some(reason) = state.refuse_next.take() {
			return Err(TransportError::Refused(reason));
		}

		let (handle, close_rx) = TransportHandle::new(sink.epoch(), sink.analysis_id().clone());
		state.transports.push(FakeTransport {
			sink,
			close_rx,
			close: None,
		});
		Ok(handle)
	}
}

#[derive(Default)]
struct FakeState {
	transports: Vec<FakeTransport>,
	refuse_next: Option<String>,
}

struct FakeTransport {
	sink: EventSink,
	close_rx: CloseSignal,
	close: Option<CloseRequest>,
}

impl FakeTransport {
	fn poll_close(&mut self) -> Option<CloseRequest> {
		if self.close.is_none() {
			self.close = self.close_rx.try_recv().ok();
		}
		self.close.clone()
	}
}

/// Drives fake transports and inspects what the manager did with them.
///
/// Transports are addressed by connect order, starting at 0.
#[derive(Clone)]
pub struct FakeController {
	state: Arc<Mutex<FakeState>>,
}

impl FakeController {
	/// Number of transports opened so far.
	pub fn connection_count(&self) -> usize {
		self.state.lock().transports.len()
	}

	/// Identifiers of every transport opened so far, in connect order.
	pub fn connected_ids(&self) -> Vec<AnalysisId> {
		self.state.lock().transports.iter().map(|t| t.sink.analysis_id().clone()).collect()
	}

	pub fn epoch(&self, index: usize) -> Epoch {
		self.with(index, |t| t.sink.epoch())
	}

	/// Makes the next `connect` call fail synchronously.
	pub fn refuse_next(&self, reason: impl Into<String>) {
		self.state.lock().refuse_next = Some(reason.into());
	}

	pub fn open(&self, index: usize) {
		self.with(index, |t| t.sink.opened());
	}

	pub fn frame(&self, index: usize, text: impl Into<String>) {
		let text = text.into();
		self.with(index, |t| t.sink.frame(text));
	}

	pub fn close(&self, index: usize, code: u16, reason: impl Into<String>) {
		let reason = reason.into();
		self.with(index, |t| t.sink.closed(code, reason));
	}

	pub fn fault(&self, index: usize, detail: impl Into<String>) {
		let detail = detail.into();
		self.with(index, |t| t.sink.fault(detail));
	}

	/// Close request the manager sent to transport `index`, if any.
	pub fn close_request(&self, index: usize) -> Option<CloseRequest> {
		self.with(index, FakeTransport::poll_close)
	}

	fn with<T>(&self, index: usize, f: impl FnOnce(&mut FakeTransport) -> T) -> T {
		let mut state = self.state.lock();
		let count = state.transports.len();
		let transport = state
			.transports
			.get_mut(index)
			.unwrap_or_else(|| panic!("fake transport {index} does not exist ({count} opened)"));
		f(transport)
	}
}

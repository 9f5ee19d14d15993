use crate::error::Result;
use crate::event::EventSink;
use crate::handle::TransportHandle;

/// Opens transports on behalf of the session manager.
///
/// `connect` must not block. The transport reports its lifecycle through
/// `sink` (opened, frames, close, faults) and is closed through the returned
/// handle. An `Err` means the transport could not even be started; nothing will
/// be emitted on `sink` in that case.
pub trait Connector {
	fn connect(&self, sink: EventSink) -> Result<TransportHandle>;
}

impl<C: Connector + ?Sized> Connector for &C {
	fn connect(&self, sink: EventSink) -> Result<TransportHandle> {
		(**self).connect(sink)
	}
}

impl<C: Connector + ?Sized> Connector for Box<C> {
	fn connect(&self, sink: EventSink) -> Result<TransportHandle> {
		(**self).connect(sink)
	}
}

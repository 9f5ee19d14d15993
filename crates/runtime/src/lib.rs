//! Transport layer for the analysis progress stream.
//!
//! A transport is one persistent connection addressed by an analysis
//! identifier. Transports never touch session state: they forward
//! [`TransportEvent`]s, each tagged with the [`Epoch`] the transport was opened
//! for, into a channel owned by the session manager. The manager decides which
//! events are still relevant.
//!
//! * [`Connector`] is the seam the manager opens transports through.
//! * [`WebSocketConnector`] is the production implementation (tokio-tungstenite).
//! * [`FakeConnector`] is an in-memory implementation for tests.

pub mod connector;
pub mod error;
pub mod event;
pub mod fake;
pub mod handle;
pub mod websocket;

pub use connector::Connector;
pub use error::{Result, TransportError};
pub use event::{Epoch, EventSink, TransportEvent, TransportSignal};
pub use fake::{FakeConnector, FakeController};
pub use handle::{CLOSE_ABNORMAL, CLOSE_NO_STATUS, CLOSE_NORMAL, CloseRequest, CloseSignal, TransportHandle, is_normal_close};
pub use websocket::{DEFAULT_CONNECT_TIMEOUT, WebSocketConnector};

//! Session engine for live analysis progress streams.
//!
//! A [`SessionManager`] binds one analysis identifier at a time to a
//! transport, decodes every inbound frame, and folds the resulting events into
//! a [`SessionView`]: an append-only log, a completion percentage, and a
//! terminal [`Outcome`]. Consumers receive the view through a
//! `tokio::sync::watch` channel.
//!
//! # Layers
//!
//! * [`reducer`]: pure folding of decoded events into the view
//! * [`machine`]: connection lifecycle for the bound session
//! * [`manager`]: public controller, epoch filtering, view publication
//!
//! # Example
//!
//! ```no_run
//! # use aw::{SessionConfig, SessionManager};
//! # use aw_runtime::WebSocketConnector;
//! # async fn demo() -> aw::Result<()> {
//! let connector = WebSocketConnector::new("ws://localhost:8000/ws/analysis/")?;
//! let mut manager = SessionManager::new(connector, SessionConfig::default());
//!
//! let view = manager.observe(Some("A1"));
//! let status = manager.run_until_settled().await;
//! println!("{status}: {:.0}%", view.borrow().progress());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod machine;
pub mod manager;
pub mod reducer;
pub mod replay;
pub mod view;

pub use aw_protocol::{AnalysisId, Level, StreamEvent};
pub use config::{ProgressPolicy, SessionConfig};
pub use error::{Error, Result};
pub use machine::{BindOutcome, ConnectionState, Session, SessionMachine, Signal};
pub use manager::{SessionManager, SessionNotice};
pub use replay::replay;
pub use view::{Diagnostics, LogEntry, Outcome, SessionStatus, SessionView};

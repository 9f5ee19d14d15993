//! Wire types for the analysis progress stream.
//!
//! This crate contains the serde-serializable types exchanged with the analysis
//! server and the codec that turns one raw text frame into a typed
//! [`StreamEvent`]. These types represent the "protocol layer": the shapes of
//! data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: no I/O, no session state
//! * Lenient on input: missing optional fields fall back to documented defaults
//! * Closed: every frame decodes to exactly one event variant or a [`DecodeError`]
//!
//! Session lifecycle and view reduction are built on top of these types in `aw-rs`.

pub mod codec;
pub mod event;
pub mod id;
pub mod level;

pub use codec::{DecodeError, decode_frame, decode_value};
pub use event::{DEFAULT_ERROR_MESSAGE, LogRecord, StreamEvent, clamp_progress};
pub use id::AnalysisId;
pub use level::Level;

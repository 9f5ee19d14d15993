//! Frame codec: raw text frame in, exactly one [`StreamEvent`] or [`DecodeError`] out.
//!
//! The codec is deliberately lenient about optional fields. Only three things
//! make a frame undecodable: it is not JSON, it is not a JSON object, or it
//! lacks a string `type` discriminant. A `progress` frame without a numeric
//! value is also rejected since there is nothing to apply.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::{DEFAULT_ERROR_MESSAGE, LogRecord, StreamEvent, clamp_progress};
use crate::level::Level;

/// Reasons a frame could not be interpreted.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("frame is not valid JSON: {0}")]
	Malformed(#[from] serde_json::Error),

	#[error("frame is not a JSON object")]
	NotAnObject,

	#[error("frame has no string `type` field")]
	MissingType,

	#[error("field `{field}` must be {expected}")]
	InvalidField { field: &'static str, expected: &'static str },
}

/// Decodes one raw inbound frame.
pub fn decode_frame(raw: &str) -> Result<StreamEvent, DecodeError> {
	let value: Value = serde_json::from_str(raw)?;
	decode_value(value)
}

/// Decodes an already-parsed frame.
pub fn decode_value(value: Value) -> Result<StreamEvent, DecodeError> {
	let Value::Object(envelope) = value else {
		return Err(DecodeError::NotAnObject);
	};

	let kind = envelope.get("type").and_then(Value::as_str).ok_or(DecodeError::MissingType)?;

	let event = match kind {
		"log" => StreamEvent::Log(decode_log(&envelope)),
		"progress" => {
			let raw = envelope.get("progress").and_then(Value::as_f64).ok_or(DecodeError::InvalidField {
				field: "progress",
				expected: "a number",
			})?;
			StreamEvent::Progress { value: clamp_progress(raw) }
		}
		"result" => {
			let payload = match envelope.get("data") {
				Some(data) if !data.is_null() => data.clone(),
				_ => Value::Object(envelope.clone()),
			};
			StreamEvent::Result { payload }
		}
		"error" => {
			let reason = non_empty_str(&envelope, "message").unwrap_or(DEFAULT_ERROR_MESSAGE).to_string();
			StreamEvent::Error { reason }
		}
		other => StreamEvent::Unknown { kind: other.to_string() },
	};

	Ok(event)
}

fn decode_log(envelope: &Map<String, Value>) -> LogRecord {
	let message = envelope.get("message").and_then(Value::as_str).unwrap_or_default().to_string();
	let level = envelope.get("level").and_then(Value::as_str).map(Level::from_wire).unwrap_or_default();
	let timestamp = envelope
		.get("timestamp")
		.and_then(Value::as_str)
		.and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
		.map(|ts| ts.with_timezone(&Utc));

	LogRecord { message, level, timestamp }
}

fn non_empty_str<'a>(envelope: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
	envelope.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

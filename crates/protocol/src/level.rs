//! Log severity carried on `log` frames.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a log entry.
///
/// Severity is assigned at the protocol boundary so consumers never need to
/// inspect message text to decide how an entry should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
	#[default]
	Info,
	Warning,
	Error,
	Success,
}

impl Level {
	/// Parses a wire severity, falling back to [`Level::Info`] for anything unrecognised.
	pub fn from_wire(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"warning" | "warn" => Level::Warning,
			"error" => Level::Error,
			"success" => Level::Success,
			_ => Level::Info,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Level::Info => "info",
			Level::Warning => "warning",
			Level::Error => "error",
			Level::Success => "success",
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

//! Opaque analysis identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier naming one analysis run.
///
/// Sessions are keyed 1:1 by this value, compared exactly as given. The
/// identifier is never blank: [`AnalysisId::parse`] maps empty or
/// whitespace-only input to `None`, which callers treat as "no analysis
/// selected".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(String);

impl AnalysisId {
	/// Returns an identifier for `raw`, or `None` when it is blank.
	pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
		let raw = raw.as_ref();
		if raw.trim().is_empty() { None } else { Some(Self(raw.to_string())) }
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AnalysisId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for AnalysisId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

//! Engine configuration.

use serde::{Deserialize, Serialize};

/// How progress values that move backwards are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPolicy {
	/// Apply every value below 100, including regressions.
	#[default]
	Permissive,
	/// Ignore values lower than the current progress.
	Monotonic,
}

/// Settings for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
	pub progress_policy: ProgressPolicy,
}

impl SessionConfig {
	pub fn with_progress_policy(mut self, policy: ProgressPolicy) -> Self {
		self.progress_policy = policy;
		self
	}
}

//! Layered settings: config file, then environment, then flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aw::{ProgressPolicy, SessionConfig};
use aw_runtime::DEFAULT_CONNECT_TIMEOUT;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CliError, Result};

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws/analysis/";

/// Environment variable that overrides the configured endpoint.
pub const ENDPOINT_ENV: &str = "AW_ENDPOINT";

/// `$XDG_CONFIG_HOME/aw/config.json` (or the platform equivalent).
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("aw").join("config.json"))
}

/// Contents of the JSON config file; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
	pub endpoint: Option<String>,
	pub connect_timeout_secs: Option<u64>,
	pub progress_policy: Option<ProgressPolicy>,
}

impl FileConfig {
	/// Loads `explicit`, or the default path when it exists.
	///
	/// A missing default file yields an empty config; a missing explicit file
	/// is an error.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::read(path),
			None => match default_config_path() {
				Some(path) if path.is_file() => Self::read(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	fn read(path: &Path) -> Result<Self> {
		let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn session_config(&self) -> SessionConfig {
		SessionConfig::default().with_progress_policy(self.progress_policy.unwrap_or_default())
	}
}

/// Command-line overrides for `aw watch`.
#[derive(Debug, Clone, Default)]
pub struct WatchFlags {
	pub endpoint: Option<String>,
	pub strict_progress: bool,
	pub timeout_secs: Option<u64>,
}

/// Resolved settings for one `aw watch` run.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSettings {
	pub endpoint: Url,
	pub connect_timeout: Duration,
	pub session: SessionConfig,
}

impl WatchSettings {
	/// Merges `file`, the endpoint from the environment, and `flags`, later layers winning.
	pub fn resolve(file: &FileConfig, env_endpoint: Option<String>, flags: WatchFlags) -> Result<Self> {
		let endpoint = flags
			.endpoint
			.or(env_endpoint.filter(|value| !value.trim().is_empty()))
			.or_else(|| file.endpoint.clone())
			.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

		let connect_timeout = flags
			.timeout_secs
			.or(file.connect_timeout_secs)
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_CONNECT_TIMEOUT);

		let mut session = file.session_config();
		if flags.strict_progress {
			session = session.with_progress_policy(ProgressPolicy::Monotonic);
		}

		Ok(Self {
			endpoint: parse_endpoint(&endpoint)?,
			connect_timeout,
			session,
		})
	}

	pub fn from_env(file: &FileConfig, flags: WatchFlags) -> Result<Self> {
		Self::resolve(file, std::env::var(ENDPOINT_ENV).ok(), flags)
	}
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
	let invalid = |reason: String| CliError::InvalidEndpoint {
		endpoint: endpoint.to_string(),
		reason,
	};
	let url = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
	match url.scheme() {
		"ws" | "wss" => Ok(url),
		other => Err(invalid(format!("unsupported scheme {other:?}, expected ws or wss"))),
	}
}

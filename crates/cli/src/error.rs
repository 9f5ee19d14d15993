use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("cannot read config {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid endpoint {endpoint:?}: {reason}")]
	InvalidEndpoint { endpoint: String, reason: String },

	#[error("analysis identifier must not be blank")]
	BlankIdentifier,
}

pub type Result<T> = std::result::Result<T, CliError>;

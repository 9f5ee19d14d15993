mod replay;
mod watch;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::Commands;
use crate::config::{FileConfig, WatchFlags};
use crate::output::OutputFormat;

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
	pub format: OutputFormat,
	pub config_path: Option<PathBuf>,
}

impl CommandContext {
	pub fn new(format: OutputFormat, config_path: Option<PathBuf>) -> Self {
		Self { format, config_path }
	}

	pub fn file_config(&self) -> Result<FileConfig> {
		Ok(FileConfig::load(self.config_path.as_deref())?)
	}
}

/// Runs `command`; `Ok(false)` means it ran but the session did not complete.
pub async fn dispatch(command: Commands, ctx: &CommandContext) -> Result<bool> {
	match command {
		Commands::Watch {
			id,
			endpoint,
			strict_progress,
			timeout,
		} => {
			let flags = WatchFlags {
				endpoint,
				strict_progress,
				timeout_secs: timeout,
			};
			watch::run(ctx, &id, flags).await
		}
		Commands::Replay { path, id } => replay::run(ctx, &path, &id),
	}
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "aw")]
#[command(about = "Follow live analysis progress streams from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Config file (defaults to $XDG_CONFIG_HOME/aw/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Stream one analysis until it completes, fails, or the connection drops
	Watch {
		/// Analysis identifier
		id: String,

		/// Base WebSocket endpoint; the identifier is appended as a path segment
		#[arg(long, value_name = "URL")]
		endpoint: Option<String>,

		/// Ignore progress values lower than the current one
		#[arg(long)]
		strict_progress: bool,

		/// Connect timeout in seconds
		#[arg(long, value_name = "SECS")]
		timeout: Option<u64>,
	},

	/// Reduce a recorded stream (one raw frame per line) offline
	Replay {
		/// Recording file, or `-` for stdin
		path: PathBuf,

		/// Identifier to label the replayed session with
		#[arg(long, default_value = "replay")]
		id: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_watch_with_flags() {
		let cli = Cli::try_parse_from(["aw", "-vv", "watch", "A1", "--endpoint", "ws://host/ws/", "--strict-progress", "--timeout", "3"]).unwrap();

		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Text);
		match cli.command {
			Commands::Watch {
				id,
				endpoint,
				strict_progress,
				timeout,
			} => {
				assert_eq!(id, "A1");
				assert_eq!(endpoint.as_deref(), Some("ws://host/ws/"));
				assert!(strict_progress);
				assert_eq!(timeout, Some(3));
			}
			other => panic!("expected watch, got {other:?}"),
		}
	}

	#[test]
	fn global_flags_after_subcommand() {
		let cli = Cli::try_parse_from(["aw", "replay", "-", "-f", "ndjson", "--config", "aw.json"]).unwrap();

		assert_eq!(cli.format, OutputFormat::Ndjson);
		assert_eq!(cli.config, Some(PathBuf::from("aw.json")));
		match cli.command {
			Commands::Replay { path, id } => {
				assert_eq!(path, PathBuf::from("-"));
				assert_eq!(id, "replay");
			}
			other => panic!("expected replay, got {other:?}"),
		}
	}

	#[test]
	fn watch_requires_identifier() {
		assert!(Cli::try_parse_from(["aw", "watch"]).is_err());
	}

	#[test]
	fn rejects_unknown_format() {
		assert!(Cli::try_parse_from(["aw", "-f", "toon", "replay", "-"]).is_err());
	}
}

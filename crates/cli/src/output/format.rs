use clap::ValueEnum;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text (default)
	#[default]
	Text,
	/// One JSON document with the final view
	Json,
	/// Newline-delimited JSON (streaming)
	Ndjson,
}

impl OutputFormat {
	/// Whether log entries are written as they arrive.
	pub fn streams_entries(self) -> bool {
		matches!(self, OutputFormat::Text | OutputFormat::Ndjson)
	}
}

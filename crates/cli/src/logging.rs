//! Subscriber setup for the `aw` binary.
//!
//! Logs go to stderr so stdout stays parseable in json/ndjson modes.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Default filter for the given `-v` count; `RUST_LOG` overrides it.
pub fn default_directive(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	}
}

pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.with_target(verbose > 1)
		.try_init();
}

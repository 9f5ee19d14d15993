use aw_cli::cli::Cli;
use aw_cli::commands::{self, CommandContext};
use aw_cli::logging;
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let ctx = CommandContext::new(cli.format, cli.config);

	match commands::dispatch(cli.command, &ctx).await {
		Ok(true) => {}
		Ok(false) => std::process::exit(1),
		Err(err) => {
			error!(target = "aw", error = %format!("{err:#}"), "command failed");
			std::process::exit(1);
		}
	}
}

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use aw::{AnalysisId, SessionStatus};
use tracing::debug;

use super::CommandContext;
use crate::error::CliError;
use crate::output::Renderer;

pub fn run(ctx: &CommandContext, path: &Path, id: &str) -> Result<bool> {
	let analysis_id = AnalysisId::parse(id).ok_or(CliError::BlankIdentifier)?;
	let config = ctx.file_config()?.session_config();

	let view = if path == Path::new("-") {
		debug!(target = "aw", "replaying from stdin");
		aw::replay(analysis_id, io::stdin().lock(), &config).context("failed to read recording from stdin")?
	} else {
		let file = File::open(path).with_context(|| format!("cannot open recording {}", path.display()))?;
		aw::replay(analysis_id, BufReader::new(file), &config).with_context(|| format!("failed to read recording {}", path.display()))?
	};

	let mut renderer = Renderer::new(ctx.format, io::stdout());
	renderer.entries(&view)?;
	renderer.summary(&view)?;
	Ok(view.status() == SessionStatus::Completed)
}

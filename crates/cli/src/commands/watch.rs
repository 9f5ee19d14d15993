use std::io;

use anyhow::Result;
use aw::{AnalysisId, SessionManager, SessionStatus};
use aw_runtime::WebSocketConnector;
use tracing::{info, warn};

use super::CommandContext;
use crate::config::{WatchFlags, WatchSettings};
use crate::error::CliError;
use crate::output::Renderer;

pub async fn run(ctx: &CommandContext, id: &str, flags: WatchFlags) -> Result<bool> {
	let analysis_id = AnalysisId::parse(id).ok_or(CliError::BlankIdentifier)?;
	let settings = WatchSettings::from_env(&ctx.file_config()?, flags)?;

	let connector = WebSocketConnector::new(settings.endpoint.as_str())?.with_connect_timeout(settings.connect_timeout);
	info!(target = "aw", %analysis_id, address = %connector.address_for(&analysis_id), "watching analysis");

	let mut manager = SessionManager::new(connector, settings.session);
	let mut renderer = Renderer::new(ctx.format, io::stdout());
	manager.observe(Some(analysis_id.as_str()));

	let interrupt = tokio::signal::ctrl_c();
	tokio::pin!(interrupt);

	while manager.is_live() {
		tokio::select! {
			_ = &mut interrupt => {
				warn!(target = "aw", %analysis_id, "interrupted; closing session");
				break;
			}
			notice = manager.next_event() => {
				renderer.entries(manager.view())?;
				if let Some(notice) = notice {
					info!(target = "aw", ?notice, "session settled");
					break;
				}
			}
		}
	}

	let view = manager.view().clone();
	manager.shutdown();

	renderer.entries(&view)?;
	renderer.summary(&view)?;
	Ok(view.status() == SessionStatus::Completed)
}

use std::io::{self, Write};

use aw::{Level, LogEntry, Outcome, SessionView};
use colored::Colorize;
use serde_json::json;

use super::OutputFormat;

/// Writes log entries incrementally and a summary once the session settles.
pub struct Renderer<W: Write> {
	format: OutputFormat,
	out: W,
	printed: usize,
}

impl<W: Write> Renderer<W> {
	pub fn new(format: OutputFormat, out: W) -> Self {
		Self { format, out, printed: 0 }
	}

	/// Writes the entries of `view` not written yet.
	pub fn entries(&mut self, view: &SessionView) -> io::Result<()> {
		let log = view.log();
		if self.printed > log.len() {
			self.printed = 0;
		}
		if self.format.streams_entries() {
			for entry in &log[self.printed..] {
				match self.format {
					OutputFormat::Ndjson => writeln!(self.out, "{}", json!({ "record": "log", "entry": entry }))?,
					_ => writeln!(self.out, "{}", text_entry(entry))?,
				}
			}
			self.out.flush()?;
		}
		self.printed = log.len();
		Ok(())
	}

	pub fn summary(&mut self, view: &SessionView) -> io::Result<()> {
		match self.format {
			OutputFormat::Json => {
				let doc = json!({ "status": view.status(), "view": view });
				serde_json::to_writer_pretty(&mut self.out, &doc)?;
				writeln!(self.out)?;
			}
			OutputFormat::Ndjson => {
				writeln!(self.out, "{}", json!({ "record": "summary", "status": view.status(), "view": view }))?;
			}
			OutputFormat::Text => self.text_summary(view)?,
		}
		self.out.flush()
	}

	fn text_summary(&mut self, view: &SessionView) -> io::Result<()> {
		writeln!(self.out, "{} {}", "status:".bold(), view.status())?;
		writeln!(self.out, "{} {:.0}%", "progress:".bold(), view.progress())?;
		match view.outcome() {
			Some(Outcome::Result(payload)) => writeln!(self.out, "{} {payload}", "result:".bold())?,
			Some(Outcome::Failure(reason)) => writeln!(self.out, "{} {}", "failure:".bold(), reason.red())?,
			None => {}
		}
		if let Some(detail) = view.transport_error() {
			writeln!(self.out, "{} {}", "transport:".bold(), detail.yellow())?;
		}
		let diagnostics = view.diagnostics();
		if diagnostics.dropped_frames + diagnostics.unknown_frames + diagnostics.ignored_frames > 0 {
			writeln!(
				self.out,
				"{} dropped={} unknown={} ignored={}",
				"frames:".bold(),
				diagnostics.dropped_frames,
				diagnostics.unknown_frames,
				diagnostics.ignored_frames
			)?;
		}
		Ok(())
	}

	pub fn into_inner(self) -> W {
		self.out
	}
}

fn text_entry(entry: &LogEntry) -> String {
	let level = match entry.level {
		Level::Info => "info".blue(),
		Level::Warning => "warn".yellow(),
		Level::Error => "error".red(),
		Level::Success => "ok".green(),
	};
	format!("{} {level:>5} {}", entry.timestamp.format("%H:%M:%S").to_string().dimmed(), entry.message)
}

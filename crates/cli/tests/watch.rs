use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn aw_binary() -> PathBuf {
	let mut path = std::env::current_exe().expect("current_exe should resolve");
	path.pop();
	path.pop();
	path.push("aw");
	path
}

fn run_aw(home: &Path, args: &[&str], endpoint_env: Option<&str>) -> (bool, String, String) {
	let mut command = Command::new(aw_binary());
	command.args(args).env("XDG_CONFIG_HOME", home).env("HOME", home).env_remove("RUST_LOG");
	match endpoint_env {
		Some(endpoint) => command.env("AW_ENDPOINT", endpoint),
		None => command.env_remove("AW_ENDPOINT"),
	};
	let output = command.output().expect("failed to execute aw");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

/// An endpoint on a port nothing listens on.
fn dead_endpoint() -> String {
	let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
	let addr = listener.local_addr().unwrap();
	drop(listener);
	format!("ws://{addr}/ws/analysis/")
}

#[test]
fn unreachable_server_is_connection_lost() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let endpoint = dead_endpoint();

	let (success, stdout, stderr) = run_aw(tmp.path(), &["-f", "json", "watch", "A1", "--endpoint", &endpoint, "--timeout", "2"], None);
	assert!(!success);

	let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap_or_else(|_| panic!("stdout: {stdout}\nstderr: {stderr}"));
	assert_eq!(doc["status"], "connection_lost");
	assert_eq!(doc["view"]["connection"], "errored");
	assert!(doc["view"]["transport_error"].as_str().unwrap().starts_with("Connection error - cannot connect to analysis server"));
	let log = doc["view"]["log"].as_array().expect("log should be an array");
	assert_eq!(log.len(), 1);
	assert_eq!(log[0]["level"], "warning");
	assert_eq!(log[0]["message"], "Connection to analysis server lost");
}

#[test]
fn endpoint_from_environment() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let endpoint = dead_endpoint();

	let (success, stdout, _) = run_aw(tmp.path(), &["-f", "json", "watch", "A1", "--timeout", "2"], Some(&endpoint));
	assert!(!success);
	let doc: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be json");
	assert_eq!(doc["view"]["analysis_id"], "A1");
	assert_eq!(doc["status"], "connection_lost");
}

#[test]
fn rejects_non_websocket_endpoint() {
	let tmp = TempDir::new().expect("temp dir should be created");

	let (success, stdout, stderr) = run_aw(tmp.path(), &["watch", "A1", "--endpoint", "http://localhost:8000/"], None);
	assert!(!success);
	assert!(stdout.is_empty());
	assert!(stderr.contains("invalid endpoint"), "stderr: {stderr}");
}

#[test]
fn rejects_blank_identifier() {
	let tmp = TempDir::new().expect("temp dir should be created");

	let (success, _, stderr) = run_aw(tmp.path(), &["watch", "  "], None);
	assert!(!success);
	assert!(stderr.contains("must not be blank"), "stderr: {stderr}");
}

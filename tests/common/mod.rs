#![allow(dead_code)]

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

#[path = "../../src/providers/stub_server.rs"]
mod stub_server;

pub use stub_server::StubServer;

/// A local address nothing listens on.
pub fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    drop(listener);
    format!("http://{addr}")
}

/// The binary with a clean, isolated environment rooted at `work_dir`.
pub fn quip_command(work_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_quip"));
    cmd.current_dir(work_dir)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("ANTHROPIC_BASE_URL")
        .env_remove("SYSTEM_PROMPT")
        .env_remove("QUIP_LIGHT_MODEL")
        .env_remove("QUIP_CAPABLE_MODEL")
        .env_remove("RUST_LOG")
        .env_remove("LOG_OUTPUT")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_FILE_PATH")
        .env("MODEL_TIMEOUT_SECS", "5")
        .env("HISTORY_DIR", work_dir.join("history"))
        .arg("--no-color");
    cmd
}

pub fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run quip binary")
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect(),
        Err(_) => Vec::new(),
    }
}

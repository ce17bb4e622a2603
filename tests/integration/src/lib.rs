//! Test helpers: engines in temporary directories, a recording chunk
//! sink, and a runner for the `ramdb` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;

use ramdb_core::{Engine, EngineConfig};
use ramdb_protocol::ChunkSink;

/// An engine whose files live in a temporary directory.
///
/// The directory outlives the engine so tests can reopen it.
pub struct TestEngine {
    pub engine: Engine,
    dir: tempfile::TempDir,
}

impl TestEngine {
    /// Opens an engine in a fresh directory with no background work.
    pub fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::open(config_in(dir.path()));
        Self { engine, dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> EngineConfig {
        config_in(self.dir.path())
    }

    /// Closes the current engine and opens a new one over the same files.
    pub fn reopen(&mut self) {
        self.engine.close();
        self.engine = Engine::open(self.config());
    }
}

/// A config that keeps every file inside `dir`.
pub fn config_in(dir: &Path) -> EngineConfig {
    EngineConfig {
        data_path: dir.join("data.rdb.gz"),
        backup_dir: dir.join("backups"),
        ..Default::default()
    }
}

/// A chunk sink that records every push.
#[derive(Default)]
pub struct Recorder {
    pushes: Mutex<Vec<(String, String, String)>>,
}

impl Recorder {
    /// The recorded `(channel, topic, message)` triples, in push order.
    pub fn pushes(&self) -> Vec<(String, String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.pushes().into_iter().map(|(_, _, m)| m).collect()
    }
}

impl ChunkSink for Recorder {
    fn push(&self, channel: &str, topic: &str, message: &str) {
        self.pushes
            .lock()
            .unwrap()
            .push((channel.into(), topic.into(), message.into()));
    }
}

/// Runs the `ramdb` binary against a snapshot file.
pub fn run_cli(data_path: &Path, args: &[&str]) -> Output {
    Command::new(cli_binary())
        .arg("--data-path")
        .arg(data_path)
        .args(args)
        .env("RUST_LOG", "error")
        .env("NO_COLOR", "1")
        .env_remove("RAMDB_CONFIG")
        .output()
        .unwrap_or_else(|e| panic!("failed to run ramdb: {e}"))
}

/// Runs the `ramdb` binary with raw arguments.
pub fn run_cli_raw(args: &[&str]) -> Output {
    Command::new(cli_binary())
        .args(args)
        .env("RUST_LOG", "error")
        .env("NO_COLOR", "1")
        .env_remove("RAMDB_CONFIG")
        .output()
        .unwrap_or_else(|e| panic!("failed to run ramdb: {e}"))
}

/// Locates the ramdb binary in the cargo target directory.
fn cli_binary() -> PathBuf {
    // test binary is in target/<profile>/deps/, the cli one level up
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push(format!("ramdb{}", std::env::consts::EXE_SUFFIX));
    if !path.exists() {
        panic!(
            "ramdb binary not found. run `cargo build` first.\nlooked at: {}",
            path.display()
        );
    }
    path
}

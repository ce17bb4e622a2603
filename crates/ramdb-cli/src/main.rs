//! ramdb: command-line front end for a ramdb store.
//!
//! Opens an engine backed by the configured snapshot file and runs
//! commands against it, either one at a time (one-shot mode) or from an
//! interactive REPL.

mod commands;
mod dispatch;
mod format;
mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use ramdb_core::{Engine, EngineConfig};
use ramdb_protocol::SplitMode;
use tracing_subscriber::EnvFilter;

use crate::dispatch::{ChunkCollector, Outcome, Session};

/// Embedded multi-type data store.
#[derive(Parser)]
#[command(name = "ramdb", version, about)]
struct Args {
    /// Path to a TOML config file.
    #[arg(short = 'c', long, env = "RAMDB_CONFIG")]
    config: Option<PathBuf>,

    /// Print a config template with the default values and exit.
    #[arg(long)]
    config_template: bool,

    /// Primary snapshot file. Overrides the config file.
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Output budget in bytes before replies are delivered in chunks.
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Split chunked replies on byte boundaries instead of character counts.
    #[arg(long)]
    split_bytes: bool,

    /// Command to execute (one-shot mode). If omitted, starts the REPL.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if args.config_template {
        return match EngineConfig::default().to_toml() {
            Ok(template) => {
                print!("{template}");
                ExitCode::SUCCESS
            }
            Err(e) => exit_err(&format!("failed to render config template: {e}")),
        };
    }

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file_or_default(path),
        None => EngineConfig::default(),
    };
    if let Some(path) = args.data_path {
        config.data_path = path;
    }
    if let Some(size) = args.buffer_size {
        config.buffer_size = size;
    }

    let mode = if args.split_bytes {
        SplitMode::Bytes
    } else {
        SplitMode::Chars
    };

    if args.command.is_empty() {
        let mut session =
            Session::new(Engine::open(config), ChunkCollector::default()).with_split_mode(mode);
        repl::run_repl(&session);
        if !session.engine_mut().close() {
            return exit_err("final save failed");
        }
        ExitCode::SUCCESS
    } else {
        run_oneshot(config, mode, &args.command)
    }
}

/// Runs a single command, saving the primary file if it wrote anything.
fn run_oneshot(mut config: EngineConfig, mode: SplitMode, command: &[String]) -> ExitCode {
    // one-shot runs write the primary file only
    config.save_on_close = false;
    config.auto_backup = false;
    let session =
        Session::new(Engine::open(config), ChunkCollector::default()).with_split_mode(mode);

    let Some(outcome) = run_command(&session, command) else {
        return ExitCode::FAILURE;
    };
    if outcome.command.is_write() && !session.engine().persistence().save(false) {
        return exit_err("failed to save changes");
    }
    if outcome.reply.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Runs one tokenized command and prints the result.
///
/// Returns `None` (after printing the error) if the command didn't parse.
pub(crate) fn run_command(session: &Session<ChunkCollector>, tokens: &[String]) -> Option<Outcome> {
    let (name, args) = tokens.split_first()?;
    match session.call(name, args) {
        Ok(outcome) => {
            if outcome.chunked {
                println!("{}", format::format_chunks(&session.sink().take()));
                println!("{}", outcome.output.dimmed());
            } else {
                println!("{}", format::format_reply(&outcome.reply));
            }
            Some(outcome)
        }
        Err(e) => {
            eprintln!("{} {}", "(error)".red(), e.to_string().red());
            None
        }
    }
}

fn exit_err(msg: &str) -> ExitCode {
    eprintln!("{}", msg.red());
    ExitCode::FAILURE
}

//! Interactive REPL for ramdb.
//!
//! Uses rustyline for readline editing, history, and tab-completion.
//! Lines are tokenized and run directly against the session's engine;
//! validation happens in command parsing.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use thiserror::Error;

use crate::commands::{command_names, commands_by_group, find_command};
use crate::dispatch::{ChunkCollector, Session};
use crate::run_command;

/// Runs the interactive REPL loop until `quit`, `exit` or Ctrl-D.
pub fn run_repl(session: &Session<ChunkCollector>) {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = match Editor::with_config(config) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}", format!("failed to create editor: {e}").red());
            return;
        }
    };
    rl.set_helper(Some(RamdbHelper));

    let history_path = history_file();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    println!(
        "{} {} ({} keys loaded)",
        "ramdb".bold(),
        env!("CARGO_PKG_VERSION"),
        session.engine().store().key_count()
    );

    loop {
        match rl.readline("ramdb> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                let first_word = trimmed.split_whitespace().next().unwrap_or("");
                match first_word.to_lowercase().as_str() {
                    "quit" | "exit" => break,
                    "clear" => {
                        print!("\x1B[2J\x1B[1;1H");
                        let _ = std::io::stdout().flush();
                        continue;
                    }
                    "help" => {
                        println!("{}", help_text(trimmed));
                        continue;
                    }
                    _ => {}
                }

                let tokens = match tokenize(trimmed) {
                    Ok(t) => t,
                    Err(e) => {
                        eprintln!("{}", format!("parse error: {e}").red());
                        continue;
                    }
                };

                run_command(session, &tokens);
            }
            // Ctrl-C: just show a new prompt
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}", format!("readline error: {e}").red());
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
}

/// Renders the `help` output: the grouped command table, or the details
/// of one command when `line` names it.
fn help_text(line: &str) -> String {
    let mut out = String::new();

    if let Some(name) = line.split_whitespace().nth(1) {
        match find_command(name) {
            Some(cmd) => {
                let _ = writeln!(out, "  {} {}", cmd.name.bold(), cmd.args.dimmed());
                let _ = writeln!(out, "  {}", cmd.summary);
                let _ = write!(out, "  group: {}", cmd.group);
            }
            None => {
                let _ = write!(out, "no command named '{name}' (see 'help')");
            }
        }
        return out;
    }

    for (group, cmds) in commands_by_group() {
        let _ = writeln!(out, "{}", group.bold());
        for cmd in cmds {
            let _ = writeln!(out, "  {:<14} {:<32} {}", cmd.name, cmd.args, cmd.summary.dimmed());
        }
    }
    let _ = write!(out, "local: help [command], clear, quit");
    out
}

/// History lives in `$RAMDB_HISTORY`, or `~/.ramdb_history` when unset.
fn history_file() -> Option<PathBuf> {
    match std::env::var_os("RAMDB_HISTORY") {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::home_dir().map(|home| home.join(".ramdb_history")),
    }
}

// -----------------------------------------------------------------------
// line splitting
// -----------------------------------------------------------------------

/// A line the REPL could not split into arguments.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("missing closing {0} quote")]
    Unclosed(char),
    #[error("line ends in a backslash")]
    DanglingEscape,
}

/// Splits a REPL line into arguments.
///
/// Whitespace separates arguments. Double quotes group text and honor
/// backslash escapes; single quotes group text verbatim. Quoted and bare
/// text that touch form one argument, and `""` yields an empty one.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut args = Vec::new();
    // `None` between arguments, `Some` while one is being built
    let mut arg: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in line.chars() {
        if escaped {
            arg.get_or_insert_with(String::new).push(ch);
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some('"'), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => arg.get_or_insert_with(String::new).push(c),
            (None, '"' | '\'') => {
                arg.get_or_insert_with(String::new);
                quote = Some(ch);
            }
            (None, c) if c.is_whitespace() => args.extend(arg.take()),
            (None, c) => arg.get_or_insert_with(String::new).push(c),
        }
    }

    if escaped {
        return Err(TokenizeError::DanglingEscape);
    }
    if let Some(q) = quote {
        return Err(TokenizeError::Unclosed(q));
    }
    args.extend(arg);
    Ok(args)
}

// -----------------------------------------------------------------------
// rustyline helper
// -----------------------------------------------------------------------

struct RamdbHelper;

impl Helper for RamdbHelper {}

/// Commands the REPL handles itself.
const LOCAL_COMMANDS: &[&str] = &["HELP", "QUIT", "EXIT", "CLEAR"];

impl Completer for RamdbHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];

        // only the command name is completed
        if prefix.contains(' ') {
            return Ok((pos, vec![]));
        }

        let upper = prefix.to_uppercase();
        let mut matches: Vec<Pair> = command_names()
            .into_iter()
            .filter(|name| name.starts_with(&upper))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: format!("{name} "),
            })
            .collect();

        for &local in LOCAL_COMMANDS {
            if local.starts_with(&upper) {
                matches.push(Pair {
                    display: local.to_string(),
                    replacement: format!("{} ", local.to_lowercase()),
                });
            }
        }

        Ok((0, matches))
    }
}

impl Hinter for RamdbHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        if pos != line.len() {
            return None;
        }

        let trimmed = line.trim_start();
        let (first, rest) = trimmed.split_once(' ')?;

        // show the synopsis until the first argument is typed
        let cmd = find_command(first)?;
        if cmd.args.is_empty() || !rest.trim().is_empty() {
            return None;
        }
        Some(cmd.args.to_string())
    }
}

impl Highlighter for RamdbHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }

        let trimmed_start = line.len() - line.trim_start().len();
        let trimmed = &line[trimmed_start..];
        let first_end = trimmed.find(' ').unwrap_or(trimmed.len());
        let first = &trimmed[..first_end];
        let rest = &trimmed[first_end..];

        let is_known = find_command(first).is_some()
            || LOCAL_COMMANDS.iter().any(|c| c.eq_ignore_ascii_case(first));

        let highlighted_cmd = if is_known {
            format!("\x1b[1;36m{first}\x1b[0m") // bold cyan
        } else {
            format!("\x1b[31m{first}\x1b[0m") // red
        };

        Cow::Owned(format!(
            "{}{}{}",
            &line[..trimmed_start],
            highlighted_cmd,
            highlight_quotes(rest),
        ))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m")) // dim
    }

    fn highlight_char(
        &self,
        _line: &str,
        _pos: usize,
        _kind: rustyline::highlight::CmdKind,
    ) -> bool {
        true
    }
}

/// Highlights quoted strings in green within the argument portion.
fn highlight_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 32);
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '"' && ch != '\'' {
            out.push(ch);
            continue;
        }
        out.push_str("\x1b[32m");
        out.push(ch);
        while let Some(c) = chars.next() {
            out.push(c);
            if c == ch {
                break;
            }
            if c == '\\' && ch == '"' {
                if let Some(esc) = chars.next() {
                    out.push(esc);
                }
            }
        }
        out.push_str("\x1b[0m");
    }

    out
}

impl Validator for RamdbHelper {}

//! Command-line interface for teemux.
//!
//! Uses lexopt for minimal binary size overhead. The argv is split on
//! the mandatory `--` separator first: everything before it is flags
//! and routing specs for teemux, everything after is the child
//! command, passed through untouched.

use std::ffi::OsString;

use crate::error::TeemuxError;
use crate::Result;

/// Parsed command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Raw routing specs (`1=out.log`, `2+1=all.log`, `stderr`, ...).
    pub routes: Vec<String>,
    /// Keep ANSI sequences in destination files.
    pub keep_ansi: bool,
    /// Never allocate a PTY, even when stdout is a terminal.
    pub no_pty: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
    /// Child command argv (after `--`).
    pub command: Vec<String>,
}

/// Parse command-line arguments from the process environment.
pub fn parse_args() -> Result<Args> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let all: Vec<OsString> = args.into_iter().collect();
    let separator = all.iter().position(|a| a == "--");

    let (own, command) = match separator {
        Some(idx) => (&all[..idx], &all[idx + 1..]),
        None => (&all[..], &[][..]),
    };

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(own.iter().cloned());

    while let Some(arg) = parser.next().map_err(usage)? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Long("no-pty") => {
                result.no_pty = true;
            }
            Long("keep-ansi") => {
                result.keep_ansi = true;
            }
            Value(val) => {
                result.routes.push(into_string(val)?);
            }
            _ => return Err(usage(arg.unexpected())),
        }
    }

    if result.help || result.version {
        return Ok(result);
    }

    if separator.is_none() {
        return Err(TeemuxError::Usage("no -- separator found".into()));
    }

    result.command = command
        .iter()
        .cloned()
        .map(into_string)
        .collect::<Result<_>>()?;
    if result.command.is_empty() {
        return Err(TeemuxError::Usage("no command specified after --".into()));
    }

    Ok(result)
}

fn into_string(val: OsString) -> Result<String> {
    val.into_string()
        .map_err(|v| TeemuxError::Usage(format!("argument is not valid UTF-8: {:?}", v)))
}

fn usage(e: impl std::fmt::Display) -> TeemuxError {
    TeemuxError::Usage(e.to_string())
}

/// Print usage to stderr.
pub fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"teemux {version} - run a command, mirror its output, tee clean logs to files

USAGE:
    teemux [OPTIONS] [ROUTES...] -- command [args...]

Default behavior (no routes):
    Tees both stdout and stderr to teemux.log AND displays on terminal

ROUTES:
    1=FILE or stdout=FILE            tee stdout to FILE
    2=FILE or stderr=FILE            tee stderr to FILE
    2+1=FILE or stderr+stdout=FILE   tee both to the same FILE
    1 or stdout                      show stdout on terminal
    2 or stderr                      show stderr on terminal
    2+1 or stderr+stdout             show both on terminal

OPTIONS:
        --no-pty       Disable PTY mode
        --keep-ansi    Keep ANSI codes in files
    -h, --help         Print help
    -V, --version      Print version

ENVIRONMENT VARIABLES:
    TEEMUX_LOG    Default log file path (instead of teemux.log)
    RUST_LOG      Diagnostic log level

EXAMPLES:
    teemux -- python script.py
    teemux 2+1=output.log 2+1 -- python script.py
    teemux 2=err.log 1=out.log -- make
    teemux 2=err.log 2 -- ./program
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("teemux {}", env!("CARGO_PKG_VERSION"));
}

//! Child process execution.
//!
//! Spawns the child (under a PTY or plain pipes), pumps its output
//! streams into the router, forwards signals, and reports the exit
//! code to propagate.

mod command;
mod executor;

pub use command::{exit_code_from_pty, exit_code_from_std, ChildCommand};
pub use executor::run;

//! # teemux
//!
//! Run a command, keep its progress bars animating on screen, and tee
//! its output into clean, line-oriented log files.
//!
//! Child output is raw terminal traffic: color escapes, spinner
//! glyphs, and carriage-return redraws, fragmented into arbitrary read
//! chunks. teemux mirrors those bytes untouched to the interactive
//! terminal while, in parallel, reassembling logical lines, resolving
//! redraw semantics, stripping control sequences, and dropping
//! transient progress readouts before anything reaches a file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use teemux::{Router, StreamKind, StreamSet};
//!
//! fn main() -> teemux::Result<()> {
//!     let router = Arc::new(Router::new());
//!     router.add_file(std::path::Path::new("build.log"), StreamSet::BOTH, true)?;
//!     router.add_stdout_terminal();
//!
//!     // Feed chunks as they arrive from the child...
//!     router.dispatch(StreamKind::Stdout, b"\x1b[32mcompiling\x1b[0m\n");
//!
//!     // ...and always finalize, whatever the exit path.
//!     router.close();
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod pty;
pub mod router;

// Re-export commonly used types
pub use config::{RoutePlan, RouteSpec, RouteTarget};
pub use error::{Result, TeemuxError};
pub use execution::ChildCommand;
pub use output::{clean_line, is_progress_line, strip_sequences, LineAssembler};
pub use pty::{PtySession, PtySize};
pub use router::{FileSink, Router, StreamKind, StreamSet};

//! Output normalization pipeline.
//!
//! This module provides the pure/stateful building blocks the router's
//! file sinks run every chunk through:
//! - line reassembly across arbitrary chunk boundaries
//! - control-sequence stripping
//! - transient progress-line detection
//!
//! # Example
//!
//! ```
//! use teemux::output::{clean_line, is_progress_line, LineAssembler};
//!
//! let mut asm = LineAssembler::new();
//! let lines = asm.push_owned(b"\x1b[32mok\x1b[0m\n2.5s Run tests\r");
//! assert_eq!(clean_line(&lines[0]), b"ok");
//! assert!(is_progress_line(b"2.5s Run tests"));
//! ```

mod lines;
mod progress;
mod strip;

pub use lines::LineAssembler;
pub use progress::is_progress_line;
pub use strip::{clean_line, strip_sequences};

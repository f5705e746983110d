//! Logical-line reassembly over a fragmented byte stream.
//!
//! Child output arrives in arbitrarily-sized read chunks that can split
//! a line, a word, or even a multi-byte character. [`LineAssembler`]
//! accumulates bytes across chunks and emits finalized lines:
//!
//! - LF finalizes the current line;
//! - CR immediately followed by LF is a single terminator (no spurious
//!   empty line for Windows-style endings);
//! - a bare CR *discards* the accumulated line instead of finalizing
//!   it, modeling a progress bar that redraws in place.
//!
//! A CR that ends a chunk is held until the next byte (or the final
//! flush) decides whether it was CRLF or a bare CR. This makes the
//! emitted line sequence independent of how the input was chunked,
//! down to one byte per call.

/// Incremental line reassembler.
///
/// Cost is linear in total bytes pushed, regardless of chunk count.
#[derive(Debug, Default)]
pub struct LineAssembler {
    /// Bytes accumulated since the last terminator.
    current: Vec<u8>,
    /// A CR arrived as the last byte of the previous chunk and is
    /// waiting for the next byte to resolve CRLF vs. bare CR.
    pending_cr: bool,
}

impl LineAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, appending finalized raw lines to `lines`.
    pub fn push(&mut self, chunk: &[u8], lines: &mut Vec<Vec<u8>>) {
        for &b in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    // CRLF: one terminator, one line.
                    lines.push(std::mem::take(&mut self.current));
                    continue;
                }
                // Bare CR: the in-flight line was a redraw, drop it.
                self.current.clear();
            }
            match b {
                b'\n' => lines.push(std::mem::take(&mut self.current)),
                b'\r' => self.pending_cr = true,
                _ => self.current.push(b),
            }
        }
    }

    /// Feed one chunk, returning the finalized lines.
    pub fn push_owned(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        self.push(chunk, &mut lines);
        lines
    }

    /// Drain the unterminated tail at end of stream.
    ///
    /// A held CR resolves as a bare CR (discarding the tail, the same
    /// outcome a redraw would have produced). Returns `None` when no
    /// tail content remains.
    pub fn take_tail(&mut self) -> Option<Vec<u8>> {
        if self.pending_cr {
            self.pending_cr = false;
            self.current.clear();
        }
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }

    /// Whether any unterminated content is buffered.
    pub fn has_pending(&self) -> bool {
        !self.current.is_empty() || self.pending_cr
    }
}

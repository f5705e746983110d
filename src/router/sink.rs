//! Per-file destination pipeline.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::TeemuxError;
use crate::output::{clean_line, is_progress_line, LineAssembler};
use crate::Result;

/// A destination file with its own reassembly/sanitization pipeline.
///
/// Each sink owns its line-assembly state, so a sink registered for
/// both streams interleaves their lines by arrival order. Write errors
/// after creation are logged and swallowed: a bad destination must not
/// stop the child or the other destinations.
pub struct FileSink {
    path: PathBuf,
    file: File,
    sanitize: bool,
    assembler: LineAssembler,
    /// Most recently seen line, including suppressed progress lines.
    last_line: Vec<u8>,
    closed: bool,
}

impl FileSink {
    /// Create (truncate) the destination file.
    ///
    /// Creation failure is the one fatal sink error; it aborts setup
    /// before the child is spawned.
    pub fn create(path: &Path, sanitize: bool) -> Result<Self> {
        let file = File::create(path).map_err(|source| TeemuxError::Destination {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            sanitize,
            assembler: LineAssembler::new(),
            last_line: Vec::new(),
            closed: false,
        })
    }

    /// Path this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feed a chunk of raw child output.
    ///
    /// Always accepts the full chunk; back-pressure is never propagated
    /// to the reader.
    pub fn ingest(&mut self, chunk: &[u8]) -> usize {
        if self.closed {
            return chunk.len();
        }
        let mut lines = Vec::new();
        self.assembler.push(chunk, &mut lines);
        for line in lines {
            self.write_line(&line);
        }
        chunk.len()
    }

    /// Drain any unterminated tail as a best-effort final line, then
    /// force the file to durable storage.
    pub fn flush(&mut self) {
        if let Some(tail) = self.assembler.take_tail() {
            self.write_line(&tail);
        }
        if let Err(e) = self.file.sync_all() {
            warn!(path = %self.path.display(), "sink sync failed: {}", e);
        }
    }

    /// Flush and release the sink. Safe to call more than once; only
    /// the first call does work.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.flush();
        self.closed = true;
        debug!(path = %self.path.display(), "sink closed");
    }

    /// Whether the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The most recent completed line, including suppressed progress
    /// lines. Repeated redraws of the same readout only update this
    /// memory; they never reach the file.
    pub fn last_line(&self) -> &[u8] {
        &self.last_line
    }

    fn write_line(&mut self, line: &[u8]) {
        if self.sanitize {
            let cleaned = clean_line(line);
            if cleaned.is_empty() {
                return;
            }
            if is_progress_line(&cleaned) {
                // Remember the redraw, but never persist it.
                self.last_line = cleaned;
                return;
            }
            self.write_raw(&cleaned);
            self.last_line = cleaned;
        } else {
            // Raw mode still resolves CR semantics upstream; the line
            // itself is written untouched.
            self.write_raw(line);
            self.last_line = line.to_vec();
        }
    }

    fn write_raw(&mut self, line: &[u8]) {
        if let Err(e) = self
            .file
            .write_all(line)
            .and_then(|()| self.file.write_all(b"\n"))
        {
            warn!(path = %self.path.display(), "sink write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_sanitized_lines_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, true).unwrap();

        sink.ingest(b"\x1b[31mHELLO\x1b[0m\nplain\n");
        sink.close();

        assert_eq!(read(&path), "HELLO\nplain\n");
    }

    #[test]
    fn test_progress_lines_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, true).unwrap();

        sink.ingest(b"2.5s Run tests\n");
        assert_eq!(sink.last_line(), b"2.5s Run tests");
        sink.ingest(b"real output\n");
        sink.close();

        assert_eq!(read(&path), "real output\n");
        assert_eq!(sink.last_line(), b"real output");
    }

    #[test]
    fn test_blank_after_strip_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, true).unwrap();

        sink.ingest(b"   \n\x1b[2K\nkept\n");
        sink.close();

        assert_eq!(read(&path), "kept\n");
    }

    #[test]
    fn test_raw_mode_keeps_ansi_but_resolves_cr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, false).unwrap();

        sink.ingest(b"\x1b[31mred\x1b[0m\n10%\r20%\rdone\n");
        sink.close();

        assert_eq!(read(&path), "\x1b[31mred\x1b[0m\ndone\n");
    }

    #[test]
    fn test_tail_flushed_once_on_double_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, true).unwrap();

        sink.ingest(b"complete\nunterminated tail");
        sink.close();
        sink.close();

        assert_eq!(read(&path), "complete\nunterminated tail\n");
        assert!(sink.is_closed());
    }

    #[test]
    fn test_ingest_after_close_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, true).unwrap();

        sink.ingest(b"before\n");
        sink.close();
        assert_eq!(sink.ingest(b"after\n"), 6);

        assert_eq!(read(&path), "before\n");
    }

    #[test]
    fn test_ingest_accepts_full_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::create(&path, true).unwrap();

        assert_eq!(sink.ingest(b"abc"), 3);
        assert_eq!(sink.ingest(b""), 0);
    }

    #[test]
    fn test_create_failure_is_fatal() {
        let err = FileSink::create(Path::new("/definitely/not/a/dir/x.log"), true);
        assert!(matches!(err, Err(TeemuxError::Destination { .. })));
    }
}

//! Fan-out of child output streams to terminals and files.
//!
//! A [`Router`] owns every configured destination and delivers each
//! chunk of child stdout/stderr to all of them in registration order.
//! Destinations come in exactly two shapes: a terminal mirror that
//! passes bytes through untouched (so progress bars keep animating)
//! and a [`FileSink`] that runs the normalization pipeline and writes
//! durable lines.
//!
//! One mutex serializes dispatch across *both* streams, so every chunk
//! is delivered whole to every destination before the next chunk of
//! either stream is processed. That trades throughput for
//! deterministic, non-torn writes per chunk.

mod sink;

pub use sink::FileSink;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, trace, warn};

use crate::Result;

/// Which child descriptor a chunk came from.
///
/// The two streams are never merged implicitly; they only meet in a
/// destination that was explicitly registered for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Child standard output.
    Stdout,
    /// Child standard error.
    Stderr,
}

/// Selection of streams a destination receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSet {
    pub stdout: bool,
    pub stderr: bool,
}

impl StreamSet {
    /// Only child stdout.
    pub const STDOUT: Self = Self {
        stdout: true,
        stderr: false,
    };
    /// Only child stderr.
    pub const STDERR: Self = Self {
        stdout: false,
        stderr: true,
    };
    /// Both streams, interleaved by arrival order.
    pub const BOTH: Self = Self {
        stdout: true,
        stderr: true,
    };

    /// Whether the set includes the given stream.
    pub fn contains(&self, stream: StreamKind) -> bool {
        match stream {
            StreamKind::Stdout => self.stdout,
            StreamKind::Stderr => self.stderr,
        }
    }

    /// Union of two sets.
    pub fn union(self, other: Self) -> Self {
        Self {
            stdout: self.stdout || other.stdout,
            stderr: self.stderr || other.stderr,
        }
    }
}

/// A registered destination: raw terminal passthrough or file sink.
enum Route {
    Terminal(usize),
    Sink(usize),
}

struct Inner {
    sinks: Vec<FileSink>,
    sink_by_path: HashMap<PathBuf, usize>,
    mirrors: Vec<Box<dyn Write + Send>>,
    stdout_routes: Vec<Route>,
    stderr_routes: Vec<Route>,
    closed: bool,
}

/// Thread-safe output fan-out.
///
/// Registration happens once at startup; after that the router is
/// shared between the stream-reader tasks, which only call
/// [`Router::dispatch`]. Teardown calls [`Router::close`], which
/// finalizes every sink exactly once and is itself idempotent.
pub struct Router {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                sinks: Vec::new(),
                sink_by_path: HashMap::new(),
                mirrors: Vec::new(),
                stdout_routes: Vec::new(),
                stderr_routes: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Register a file destination for the given streams.
    ///
    /// Registration is idempotent per path: a second registration
    /// reuses the existing sink (one handle, no duplicated lines) and
    /// only extends which streams feed it.
    pub fn add_file(&self, path: &Path, streams: StreamSet, sanitize: bool) -> Result<()> {
        let mut inner = self.lock();

        let idx = match inner.sink_by_path.get(path) {
            Some(&idx) => idx,
            None => {
                let sink = FileSink::create(path, sanitize)?;
                let idx = inner.sinks.len();
                inner.sinks.push(sink);
                inner.sink_by_path.insert(path.to_path_buf(), idx);
                idx
            }
        };

        if streams.stdout && !has_sink_route(&inner.stdout_routes, idx) {
            inner.stdout_routes.push(Route::Sink(idx));
        }
        if streams.stderr && !has_sink_route(&inner.stderr_routes, idx) {
            inner.stderr_routes.push(Route::Sink(idx));
        }

        debug!(path = %path.display(), ?streams, sanitize, "file destination registered");
        Ok(())
    }

    /// Register a raw terminal mirror for one stream.
    pub fn add_terminal(&self, stream: StreamKind, writer: Box<dyn Write + Send>) {
        let mut inner = self.lock();
        let idx = inner.mirrors.len();
        inner.mirrors.push(writer);
        match stream {
            StreamKind::Stdout => inner.stdout_routes.push(Route::Terminal(idx)),
            StreamKind::Stderr => inner.stderr_routes.push(Route::Terminal(idx)),
        }
    }

    /// Mirror child stdout to this process's stdout.
    pub fn add_stdout_terminal(&self) {
        self.add_terminal(StreamKind::Stdout, Box::new(std::io::stdout()));
    }

    /// Mirror child stderr to this process's stderr.
    pub fn add_stderr_terminal(&self) {
        self.add_terminal(StreamKind::Stderr, Box::new(std::io::stderr()));
    }

    /// Deliver one chunk to every destination registered for `stream`.
    ///
    /// Holds the router lock for the whole fan-out; destinations
    /// receive chunks in registration order and chunks are never torn.
    /// Write failures on individual destinations are logged and do not
    /// affect the others.
    pub fn dispatch(&self, stream: StreamKind, chunk: &[u8]) {
        let mut guard = self.lock();
        if guard.closed || chunk.is_empty() {
            return;
        }
        trace!(?stream, len = chunk.len(), "dispatch");

        let Inner {
            sinks,
            mirrors,
            stdout_routes,
            stderr_routes,
            ..
        } = &mut *guard;
        let routes = match stream {
            StreamKind::Stdout => &*stdout_routes,
            StreamKind::Stderr => &*stderr_routes,
        };
        for route in routes {
            match route {
                Route::Terminal(idx) => {
                    let mirror = &mut mirrors[*idx];
                    // Flush per chunk so CR-driven redraws animate.
                    if let Err(e) = mirror.write_all(chunk).and_then(|()| mirror.flush()) {
                        warn!("terminal mirror write failed: {}", e);
                    }
                }
                Route::Sink(idx) => {
                    sinks[*idx].ingest(chunk);
                }
            }
        }
    }

    /// Finalize every sink (flush tail, sync, release).
    ///
    /// Idempotent: only the first call does work. Must run on every
    /// exit path, including error returns from the child wait.
    pub fn close(&self) {
        let inner = &mut *self.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        for sink in &mut inner.sinks {
            sink.close();
        }
        debug!("router closed");
    }

    /// Number of distinct file sinks.
    pub fn sink_count(&self) -> usize {
        self.lock().sinks.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a reader task panicked mid-dispatch;
        // the sinks are still best-effort usable for teardown.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn has_sink_route(routes: &[Route], idx: usize) -> bool {
    routes
        .iter()
        .any(|r| matches!(r, Route::Sink(i) if *i == idx))
}

//! Child execution and stream pumping.
//!
//! One blocking reader task per child stream performs fixed-size reads
//! and hands whole chunks to the [`Router`]; a signal task forwards
//! one interrupt to the child; in PTY mode a resize task relays
//! SIGWINCH geometry. The child's exit status is only collected after
//! every reader has observed end-of-stream, so buffered output is
//! fully drained before the final exit code is computed.

use std::io::Read;
use std::process::Stdio;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::command::{exit_code_from_pty, exit_code_from_std, ChildCommand};
use crate::error::TeemuxError;
use crate::pty::{current_window_size, stdout_is_terminal, PtySession, RawModeGuard};
use crate::router::{Router, StreamKind};
use crate::Result;

/// Fixed read-buffer size for stream pumping.
const READ_BUFFER_SIZE: usize = 32 * 1024;

/// Run the child and pump its output through the router.
///
/// Uses a PTY when requested and stdout is an interactive terminal;
/// falls back to plain pipes otherwise. Returns the exit code to
/// propagate. The caller owns router teardown.
pub async fn run(command: &ChildCommand, router: Arc<Router>, use_pty: bool) -> Result<i32> {
    if use_pty && stdout_is_terminal() {
        run_with_pty(command, router).await
    } else {
        run_with_pipes(command, router).await
    }
}

/// Run the child under a pseudo-terminal.
///
/// The PTY merges the child's streams, so everything is dispatched as
/// stdout. Local stdin is forwarded raw; SIGWINCH resizes the child's
/// terminal best-effort.
async fn run_with_pty(command: &ChildCommand, router: Arc<Router>) -> Result<i32> {
    let size = current_window_size().unwrap_or_default();
    let session = Arc::new(PtySession::spawn(&command.argv(), size)?);
    let reader = session.take_reader()?;
    let mut writer = session.take_writer()?;
    let pid = session.process_id();
    info!(command = %command, pid, "child spawned under PTY");

    let raw_guard = RawModeGuard::enable();

    // Forward local stdin to the child. A detached OS thread: it
    // blocks on stdin reads and terminates with the process.
    std::thread::spawn(move || {
        let _ = std::io::copy(&mut std::io::stdin(), &mut writer);
    });

    let winch_task = spawn_resize_relay(Arc::clone(&session));
    let signal_task = spawn_signal_forwarder(pid);

    let pump = {
        let router = Arc::clone(&router);
        tokio::task::spawn_blocking(move || pump_stream(reader, &router, StreamKind::Stdout))
    };
    pump.await.map_err(join_error)?;

    let status = {
        let session = Arc::clone(&session);
        tokio::task::spawn_blocking(move || session.wait())
            .await
            .map_err(join_error)??
    };

    if let Some(task) = winch_task {
        task.abort();
    }
    if let Some(task) = signal_task {
        task.abort();
    }
    drop(raw_guard);

    Ok(exit_code_from_pty(&status))
}

/// Run the child with piped stdout/stderr and inherited stdin.
async fn run_with_pipes(command: &ChildCommand, router: Arc<Router>) -> Result<i32> {
    let mut child = std::process::Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TeemuxError::Spawn(format!("{}: {}", command.program, e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| TeemuxError::Spawn("child stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| TeemuxError::Spawn("child stderr not captured".into()))?;
    info!(command = %command, pid = child.id(), "child spawned with pipes");

    let signal_task = spawn_signal_forwarder(Some(child.id()));

    let out_pump = {
        let router = Arc::clone(&router);
        tokio::task::spawn_blocking(move || pump_stream(stdout, &router, StreamKind::Stdout))
    };
    let err_pump = {
        let router = Arc::clone(&router);
        tokio::task::spawn_blocking(move || pump_stream(stderr, &router, StreamKind::Stderr))
    };
    let (out_res, err_res) = tokio::join!(out_pump, err_pump);
    out_res.map_err(join_error)?;
    err_res.map_err(join_error)?;

    // Both readers saw EOF; all output is drained. Now reap.
    let status = tokio::task::spawn_blocking(move || child.wait())
        .await
        .map_err(join_error)??;

    if let Some(task) = signal_task {
        task.abort();
    }

    Ok(exit_code_from_std(status))
}

/// Blocking read loop: fixed-size reads, chunks delivered in arrival
/// order. Returns on EOF, on EIO (PTY closed), or on an unrecoverable
/// read error.
fn pump_stream<R: Read>(mut reader: R, router: &Router, stream: StreamKind) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!(?stream, "reader: EOF");
                break;
            }
            Ok(n) => router.dispatch(stream, &buf[..n]),
            Err(e) => {
                // EIO on Unix means the PTY slave side was closed.
                #[cfg(unix)]
                if e.raw_os_error() == Some(libc::EIO) {
                    debug!(?stream, "reader: PTY closed (EIO)");
                    break;
                }
                if e.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    debug!(?stream, "reader: broken pipe");
                } else {
                    error!(?stream, "reader error: {}", e);
                }
                break;
            }
        }
    }
}

/// Relay SIGWINCH to the child's PTY geometry. Best-effort: signals
/// arriving faster than the relay can resize are coalesced by the OS.
#[cfg(unix)]
fn spawn_resize_relay(session: Arc<PtySession>) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut winch = match signal(SignalKind::window_change()) {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot listen for window-change signals: {}", e);
            return None;
        }
    };
    Some(tokio::spawn(async move {
        while winch.recv().await.is_some() {
            if let Some(size) = current_window_size() {
                if let Err(e) = session.resize(size) {
                    debug!("PTY resize failed: {}", e);
                }
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_resize_relay(_session: Arc<PtySession>) -> Option<JoinHandle<()>> {
    None
}

/// Forward the first SIGINT/SIGTERM delivered to us to the child as an
/// interrupt, then stop listening. No forced kill follows; the child
/// decides how to wind down.
#[cfg(unix)]
fn spawn_signal_forwarder(pid: Option<u32>) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let pid = pid?;
    let mut int = signal(SignalKind::interrupt()).ok()?;
    let mut term = signal(SignalKind::terminate()).ok()?;
    Some(tokio::spawn(async move {
        tokio::select! {
            _ = int.recv() => {}
            _ = term.recv() => {}
        }
        debug!(pid, "forwarding interrupt to child");
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGINT);
        }
    }))
}

#[cfg(not(unix))]
fn spawn_signal_forwarder(_pid: Option<u32>) -> Option<JoinHandle<()>> {
    None
}

fn join_error(e: tokio::task::JoinError) -> TeemuxError {
    TeemuxError::Io(std::io::Error::other(e))
}

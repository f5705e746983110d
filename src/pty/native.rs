//! Native PTY session using portable-pty.

use std::io::{Read, Write};
use std::sync::Mutex;

use portable_pty::{native_pty_system, CommandBuilder, PtySize as NativePtySize};

use super::PtySize;
use crate::error::TeemuxError;
use crate::Result;

/// A child process running under a pseudo-terminal.
///
/// Shared between the reader pump, the resize relay, and the waiter,
/// so the master and child handles sit behind their own locks. The
/// lock scopes never overlap a blocking read: readers hold a cloned
/// descriptor, not the master lock.
pub struct PtySession {
    master: Mutex<Box<dyn portable_pty::MasterPty + Send>>,
    child: Mutex<Box<dyn portable_pty::Child + Send + Sync>>,
}

impl PtySession {
    /// Spawn `argv` under a new PTY of the given size.
    ///
    /// The child inherits the parent environment and working
    /// directory; argv is executed directly, not through a shell.
    pub fn spawn(argv: &[String], size: PtySize) -> Result<Self> {
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| TeemuxError::Spawn("empty command".into()))?;

        let pair = native_pty_system()
            .openpty(native_size(size))
            .map_err(|e| TeemuxError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(rest);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| TeemuxError::Spawn(e.to_string()))?;

        // The slave side is only needed for the spawn; the child keeps
        // its own descriptors.
        drop(pair.slave);

        Ok(Self {
            master: Mutex::new(pair.master),
            child: Mutex::new(child),
        })
    }

    /// Clone a reader for the PTY output stream.
    pub fn take_reader(&self) -> Result<Box<dyn Read + Send>> {
        self.lock_master()
            .try_clone_reader()
            .map_err(|e| TeemuxError::Pty(e.to_string()))
    }

    /// Take the writer feeding the child's input (once per session).
    pub fn take_writer(&self) -> Result<Box<dyn Write + Send>> {
        self.lock_master()
            .take_writer()
            .map_err(|e| TeemuxError::Pty(e.to_string()))
    }

    /// Resize the PTY to match the controlling terminal.
    pub fn resize(&self, size: PtySize) -> Result<()> {
        self.lock_master()
            .resize(native_size(size))
            .map_err(|e| TeemuxError::Pty(e.to_string()))
    }

    /// OS process ID of the child, when still known.
    pub fn process_id(&self) -> Option<u32> {
        self.lock_child().process_id()
    }

    /// Wait for the child to exit and return its status. Blocking;
    /// callers run this on a blocking task.
    pub fn wait(&self) -> std::io::Result<portable_pty::ExitStatus> {
        self.lock_child().wait()
    }

    fn lock_master(&self) -> std::sync::MutexGuard<'_, Box<dyn portable_pty::MasterPty + Send>> {
        self.master.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_child(&self) -> std::sync::MutexGuard<'_, Box<dyn portable_pty::Child + Send + Sync>> {
        self.child.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn native_size(size: PtySize) -> NativePtySize {
    NativePtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_empty_argv_rejected() {
        let err = PtySession::spawn(&[], PtySize::default());
        assert!(matches!(err, Err(TeemuxError::Spawn(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_spawn_and_wait() {
        let argv = vec!["/bin/sh".to_string(), "-c".to_string(), "exit 7".to_string()];
        let session = PtySession::spawn(&argv, PtySize::default()).unwrap();
        assert!(session.process_id().is_some());

        let status = session.wait().unwrap();
        assert_eq!(status.exit_code(), 7);
    }

    #[test]
    #[cfg(unix)]
    fn test_reader_sees_output() {
        let argv = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "printf PTY_PROBE_OK".to_string(),
        ];
        let session = PtySession::spawn(&argv, PtySize::default()).unwrap();
        let mut reader = session.take_reader().unwrap();

        let mut output = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    output.extend_from_slice(&buf[..n]);
                    if output.windows(12).any(|w| w == b"PTY_PROBE_OK") {
                        break;
                    }
                }
                // EIO means the child side closed; expected at EOF.
                Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                Err(_) => break,
            }
        }
        let _ = session.wait();

        assert!(String::from_utf8_lossy(&output).contains("PTY_PROBE_OK"));
    }

    #[test]
    #[cfg(unix)]
    fn test_resize() {
        let argv = vec!["/bin/sh".to_string(), "-c".to_string(), "sleep 0".to_string()];
        let session = PtySession::spawn(&argv, PtySize::default()).unwrap();
        assert!(session.resize(PtySize::new(40, 120)).is_ok());
        let _ = session.wait();
    }
}

//! Child command representation and exit-status mapping.

use crate::error::TeemuxError;
use crate::Result;

/// The command to run, taken verbatim from the argv after `--`.
///
/// Executed directly (no shell interpretation) with inherited
/// environment and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl ChildCommand {
    /// Build from a full argv. Errors when the argv is empty.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TeemuxError::Usage("no command specified after --".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// The full argv, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl std::fmt::Display for ChildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Map a std process exit status to the code teemux should exit with.
///
/// Signal deaths follow the shell convention of `128 + signal`.
pub fn exit_code_from_std(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

/// Map a PTY child exit status to the code teemux should exit with.
pub fn exit_code_from_pty(status: &portable_pty::ExitStatus) -> i32 {
    status.exit_code() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_argv() {
        let cmd = ChildCommand::from_argv(&argv(&["make", "-j", "4"])).unwrap();
        assert_eq!(cmd.program, "make");
        assert_eq!(cmd.args, argv(&["-j", "4"]));
        assert_eq!(cmd.argv(), argv(&["make", "-j", "4"]));
    }

    #[test]
    fn test_empty_argv_is_usage_error() {
        let err = ChildCommand::from_argv(&[]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_display() {
        let cmd = ChildCommand::from_argv(&argv(&["python", "script.py"])).unwrap();
        assert_eq!(cmd.to_string(), "python script.py");
    }

    #[test]
    #[cfg(unix)]
    fn test_exit_code_from_std() {
        let status = std::process::Command::new("/bin/sh")
            .args(["-c", "exit 3"])
            .status()
            .unwrap();
        assert_eq!(exit_code_from_std(status), 3);
    }
}

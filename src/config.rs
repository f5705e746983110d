//! Route planning.
//!
//! Translates the raw CLI routing specs into a [`RoutePlan`]: which
//! destinations exist, which streams feed them, whether files are
//! sanitized, and how the child should be run. Built with the
//! following priority: explicit routing specs, then the `TEEMUX_LOG`
//! environment variable for the default log path, then built-in
//! defaults.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::Args;
use crate::error::TeemuxError;
use crate::execution::ChildCommand;
use crate::router::{Router, StreamSet};
use crate::Result;

/// Default combined log file when no routes are given.
pub const DEFAULT_LOG_FILE: &str = "teemux.log";

/// Environment variable overriding [`DEFAULT_LOG_FILE`].
pub const LOG_FILE_ENV: &str = "TEEMUX_LOG";

/// Where a route delivers its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Raw passthrough to this process's terminal.
    Terminal,
    /// Sanitizing (or raw) line-oriented file sink.
    File(PathBuf),
}

/// One destination and the streams that feed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub streams: StreamSet,
    pub target: RouteTarget,
}

/// Everything needed to set up the router and run the child.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    /// Destinations in registration order.
    pub routes: Vec<RouteSpec>,
    /// Strip control sequences in file destinations.
    pub sanitize: bool,
    /// Allocate a PTY when stdout is a terminal.
    pub use_pty: bool,
    /// The child command.
    pub command: ChildCommand,
}

impl RoutePlan {
    /// Build a plan from parsed arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        let command = ChildCommand::from_argv(&args.command)?;
        let sanitize = !args.keep_ansi;
        let use_pty = !args.no_pty;

        let routes = if args.routes.is_empty() {
            default_routes()
        } else {
            args.routes
                .iter()
                .map(|spec| parse_route_spec(spec))
                .collect::<Result<_>>()?
        };

        Ok(Self {
            routes,
            sanitize,
            use_pty,
            command,
        })
    }

    /// Open every destination and register it with a fresh router.
    ///
    /// Destination-creation failure aborts here, before the child is
    /// spawned.
    pub fn build_router(&self) -> Result<Arc<Router>> {
        let router = Router::new();
        for route in &self.routes {
            match &route.target {
                RouteTarget::File(path) => {
                    router.add_file(path, route.streams, self.sanitize)?;
                }
                RouteTarget::Terminal => {
                    if route.streams.stdout {
                        router.add_stdout_terminal();
                    }
                    if route.streams.stderr {
                        router.add_stderr_terminal();
                    }
                }
            }
        }
        Ok(Arc::new(router))
    }
}

/// No routes given: combined log file plus both terminal mirrors.
fn default_routes() -> Vec<RouteSpec> {
    let path = std::env::var_os(LOG_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    vec![
        RouteSpec {
            streams: StreamSet::BOTH,
            target: RouteTarget::File(path),
        },
        RouteSpec {
            streams: StreamSet::BOTH,
            target: RouteTarget::Terminal,
        },
    ]
}

/// Parse one routing spec: `STREAMS[=FILE]`.
fn parse_route_spec(spec: &str) -> Result<RouteSpec> {
    let (streams, target) = match spec.split_once('=') {
        Some((streams, path)) if !path.is_empty() => {
            (streams, RouteTarget::File(PathBuf::from(path)))
        }
        Some((_, _)) => {
            return Err(TeemuxError::Usage(format!(
                "route '{spec}' is missing a file path"
            )))
        }
        None => (spec, RouteTarget::Terminal),
    };

    Ok(RouteSpec {
        streams: parse_stream_set(streams, spec)?,
        target,
    })
}

/// Parse the stream selector: `+`-joined tokens from
/// {`1`, `stdout`, `2`, `stderr`}.
fn parse_stream_set(streams: &str, spec: &str) -> Result<StreamSet> {
    let mut set = StreamSet {
        stdout: false,
        stderr: false,
    };
    for token in streams.split('+') {
        let part = match token {
            "1" | "stdout" => StreamSet::STDOUT,
            "2" | "stderr" => StreamSet::STDERR,
            _ => {
                return Err(TeemuxError::Usage(format!(
                    "unknown stream '{token}' in route '{spec}'"
                )))
            }
        };
        set = set.union(part);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(routes: &[&str]) -> Args {
        Args {
            routes: routes.iter().map(|s| s.to_string()).collect(),
            command: vec!["echo".into(), "hi".into()],
            ..Args::default()
        }
    }

    #[test]
    fn test_file_route_specs() {
        let spec = parse_route_spec("1=out.log").unwrap();
        assert_eq!(spec.streams, StreamSet::STDOUT);
        assert_eq!(spec.target, RouteTarget::File(PathBuf::from("out.log")));

        let spec = parse_route_spec("stderr=err.log").unwrap();
        assert_eq!(spec.streams, StreamSet::STDERR);

        let spec = parse_route_spec("2+1=all.log").unwrap();
        assert_eq!(spec.streams, StreamSet::BOTH);

        let spec = parse_route_spec("stdout+stderr=all.log").unwrap();
        assert_eq!(spec.streams, StreamSet::BOTH);
    }

    #[test]
    fn test_terminal_route_specs() {
        let spec = parse_route_spec("2").unwrap();
        assert_eq!(spec.streams, StreamSet::STDERR);
        assert_eq!(spec.target, RouteTarget::Terminal);

        let spec = parse_route_spec("1+2").unwrap();
        assert_eq!(spec.streams, StreamSet::BOTH);
    }

    #[test]
    fn test_bad_specs() {
        assert!(parse_route_spec("3=x.log").unwrap_err().is_usage());
        assert!(parse_route_spec("out=x.log").unwrap_err().is_usage());
        assert!(parse_route_spec("1=").unwrap_err().is_usage());
        assert!(parse_route_spec("").unwrap_err().is_usage());
    }

    #[test]
    fn test_plan_defaults() {
        let plan = RoutePlan::from_args(&base_args(&[])).unwrap();
        assert!(plan.sanitize);
        assert!(plan.use_pty);
        assert_eq!(plan.routes.len(), 2);
        assert_eq!(plan.routes[0].streams, StreamSet::BOTH);
        assert!(matches!(plan.routes[0].target, RouteTarget::File(_)));
        assert_eq!(plan.routes[1].target, RouteTarget::Terminal);
    }

    #[test]
    fn test_plan_flags() {
        let mut args = base_args(&["1=out.log"]);
        args.keep_ansi = true;
        args.no_pty = true;
        let plan = RoutePlan::from_args(&args).unwrap();
        assert!(!plan.sanitize);
        assert!(!plan.use_pty);
        assert_eq!(plan.routes.len(), 1);
    }

    #[test]
    fn test_plan_requires_command() {
        let mut args = base_args(&[]);
        args.command.clear();
        assert!(RoutePlan::from_args(&args).unwrap_err().is_usage());
    }

    #[test]
    fn test_build_router_opens_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.log");
        let args = base_args(&[&format!("1={}", out.display())]);

        let plan = RoutePlan::from_args(&args).unwrap();
        let router = plan.build_router().unwrap();
        assert_eq!(router.sink_count(), 1);
        assert!(out.exists());
        router.close();
    }

    #[test]
    fn test_build_router_bad_destination() {
        let args = base_args(&["1=/definitely/not/a/dir/x.log"]);
        let plan = RoutePlan::from_args(&args).unwrap();
        let err = plan.build_router().unwrap_err();
        assert!(matches!(err, TeemuxError::Destination { .. }));
    }
}

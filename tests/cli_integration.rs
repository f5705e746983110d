//! CLI integration tests.
//!
//! These tests verify argument parsing, route planning, and the
//! pipe-mode run loop end-to-end with a real child process.

use std::ffi::OsString;
use std::sync::Arc;

use teemux::cli::parse_args_from;
use teemux::{RoutePlan, RouteTarget, StreamSet};

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("teemux")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn plan(argv: &[&str]) -> RoutePlan {
    let parsed = parse_args_from(args(argv)).unwrap();
    RoutePlan::from_args(&parsed).unwrap()
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_minimal_invocation() {
    let result = parse_args_from(args(&["--", "true"])).unwrap();
    assert!(result.routes.is_empty());
    assert_eq!(result.command, vec!["true"]);
}

#[test]
fn test_cli_flags_before_separator_only() {
    let result =
        parse_args_from(args(&["--no-pty", "--keep-ansi", "--", "ls", "--color=always"])).unwrap();
    assert!(result.no_pty);
    assert!(result.keep_ansi);
    assert_eq!(result.command, vec!["ls", "--color=always"]);
}

#[test]
fn test_cli_missing_separator_is_error() {
    assert!(parse_args_from(args(&["ls"])).is_err());
    assert!(parse_args_from(args(&[])).is_err());
}

#[test]
fn test_cli_version_short_circuits() {
    let result = parse_args_from(args(&["--version"])).unwrap();
    assert!(result.version);
}

// ============================================================================
// Route Planning Tests
// ============================================================================

#[test]
fn test_plan_default_is_combined_log_plus_terminal() {
    let plan = plan(&["--", "true"]);
    assert!(plan.sanitize);
    assert_eq!(plan.routes.len(), 2);
    assert_eq!(plan.routes[0].streams, StreamSet::BOTH);
    assert!(matches!(plan.routes[0].target, RouteTarget::File(_)));
    assert_eq!(plan.routes[1].target, RouteTarget::Terminal);
}

#[test]
fn test_plan_numeric_and_named_specs_agree() {
    let numeric = plan(&["2+1=all.log", "--", "true"]);
    let named = plan(&["stderr+stdout=all.log", "--", "true"]);
    assert_eq!(numeric.routes, named.routes);
    assert_eq!(numeric.routes[0].streams, StreamSet::BOTH);
}

#[test]
fn test_plan_separate_files() {
    let plan = plan(&["1=out.log", "2=err.log", "--", "make"]);
    assert_eq!(plan.routes.len(), 2);
    assert_eq!(plan.routes[0].streams, StreamSet::STDOUT);
    assert_eq!(plan.routes[1].streams, StreamSet::STDERR);
    assert_eq!(plan.command.program, "make");
}

#[test]
fn test_plan_keep_ansi_disables_sanitize() {
    let plan = plan(&["--keep-ansi", "1=out.log", "--", "true"]);
    assert!(!plan.sanitize);
}

#[test]
fn test_plan_rejects_unknown_stream() {
    let parsed = parse_args_from(args(&["3=x.log", "--", "true"])).unwrap();
    assert!(RoutePlan::from_args(&parsed).is_err());
}

// ============================================================================
// End-to-End (pipe mode)
// ============================================================================

#[tokio::test]
#[cfg(unix)]
async fn test_run_writes_sanitized_log() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("run.log");

    let parsed = parse_args_from(args(&[
        &format!("1={}", out.display()),
        "--no-pty",
        "--",
        "/bin/sh",
        "-c",
        "printf '\\033[32mgreen\\033[0m\\nspin\\rdone\\n'",
    ]))
    .unwrap();
    let plan = RoutePlan::from_args(&parsed).unwrap();
    let router = plan.build_router().unwrap();

    let code = teemux::execution::run(&plan.command, Arc::clone(&router), plan.use_pty)
        .await
        .unwrap();
    router.close();

    assert_eq!(code, 0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "green\ndone\n");
}

#[tokio::test]
#[cfg(unix)]
async fn test_run_propagates_failure_exit_code() {
    let parsed = parse_args_from(args(&["--no-pty", "--", "/bin/sh", "-c", "exit 9"])).unwrap();
    let plan = RoutePlan::from_args(&parsed).unwrap();
    // No file routes: dispatches go nowhere, which is fine here.
    let router = Arc::new(teemux::Router::new());

    let code = teemux::execution::run(&plan.command, Arc::clone(&router), plan.use_pty)
        .await
        .unwrap();
    router.close();

    assert_eq!(code, 9);
}

//! teemux binary entry point.

use std::sync::Arc;

use teemux::{cli, execution, logging, RoutePlan, TeemuxError};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => fail_setup(&e),
    };

    if args.version {
        cli::print_version();
        return;
    }
    if args.help {
        cli::print_usage();
        return;
    }

    logging::init();

    let plan = match RoutePlan::from_args(&args) {
        Ok(plan) => plan,
        Err(e) => fail_setup(&e),
    };

    // Destinations open before the child spawns; a bad path aborts here.
    let router = match plan.build_router() {
        Ok(router) => router,
        Err(e) => fail_setup(&e),
    };

    let result = execution::run(&plan.command, Arc::clone(&router), plan.use_pty).await;

    // Every exit path finalizes the sinks exactly once.
    router.close();

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Report a setup error with a usage reminder and exit non-zero.
fn fail_setup(e: &TeemuxError) -> ! {
    eprintln!("Error: {}", e);
    cli::print_usage();
    std::process::exit(1);
}

//! Xcode repack CLI
//!
//! Entry point for the `xcode-repack` build-phase tool.

use std::process;

use clap::{CommandFactory, Parser};
use repack_tools::SystemRunner;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use xcode_repack::cli::{normalize_legacy_flags, Cli};
use xcode_repack::{BuildEnvironment, Diagnostics, Pipeline, RepackConfig, RepackError};

const LOG_ENV: &str = "REPACK_LOG";

fn main() {
    let args = normalize_legacy_flags(std::env::args_os());
    if args.len() <= 1 {
        print_usage();
        process::exit(0);
    }
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        tracing::debug!(kind = e.kind().description(), code = e.exit_code(), "run failed");
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), RepackError> {
    let action = cli.action();
    let config = RepackConfig::resolve(&BuildEnvironment::from_env(), action, &cli.overrides())?;

    let runner = SystemRunner;
    let mut diagnostics = Diagnostics::new();
    let report = Pipeline::new(&config, &runner).execute(action, &mut diagnostics)?;

    if let Some(path) = &cli.report {
        if let Err(e) = report.write_to_file(path) {
            eprintln!("Warn: Failed to write report {}: {}", path.display(), e);
        }
    }

    Ok(())
}

fn print_usage() {
    let mut command = Cli::command();
    if let Err(e) = command.print_help() {
        eprintln!("Error: {}", e);
    }
    println!();
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

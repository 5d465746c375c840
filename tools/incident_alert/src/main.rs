mod cli;
mod commands;
mod logging;
mod progress;

use clap::Parser;
use incident_alert_core::error::CoreError;

fn main() {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = commands::run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

/// 2 for input the user can fix, 3 for network trouble, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Validation(_)) | Some(CoreError::InvalidInput(_)) => 2,
        Some(CoreError::Network(_))
        | Some(CoreError::FallbackExhausted { .. })
        | Some(CoreError::PolicyBlocked(_)) => 3,
        _ => 1,
    }
}

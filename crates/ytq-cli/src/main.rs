use ytq_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    if let logging::LogTarget::Stderr { reason } = logging::init() {
        tracing::warn!("file logging unavailable: {}", reason);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("ytq error: {:#}", err);
        std::process::exit(1);
    }
}

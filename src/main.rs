use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use cdp_pilot::SessionConfig;
use cdp_pilot::cli::{Cli, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SessionConfig::from(cli);
    match cdp_pilot::run(config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

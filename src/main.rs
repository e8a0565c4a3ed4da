use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use socialbot::{logging, Config, MockApiClient, RestClient, Result, RunSummary, Simulation};

mod app_config;

use app_config::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    use clap::Parser;

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("socialbot: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("socialbot: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli, config).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            error!(
                failed = summary.failed(),
                sessions = summary.sessions(),
                "Run finished with aborted sessions"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

async fn run(cli: &Cli, config: Config) -> Result<RunSummary> {
    if cli.dry_run {
        info!("Dry run against the in-memory API");
        Simulation::new(config, Arc::new(MockApiClient::new())).run().await
    } else {
        let client = RestClient::new(&config.api)?;
        info!(base_url = client.base_url(), "Using HTTP API");
        Simulation::new(config, Arc::new(client)).run().await
    }
}

mod config;
mod telemetry;

use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(about = "Serves similar products resolved from the product catalog")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the HTTP service
    Run(ConfigArgs),
    /// Check that a config file parses and is valid
    Validate(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, default_value = "config.yaml")]
    config_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Validate(args) => match Config::from_file(&args.config_path) {
            Ok(_) => {
                println!("{} is valid", args.config_path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {e}", args.config_path.display());
                ExitCode::FAILURE
            }
        },
        CliCommand::Run(args) => {
            let config = match Config::from_file(&args.config_path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{}: {e}", args.config_path.display());
                    return ExitCode::FAILURE;
                }
            };
            run(config)
        }
    }
}

fn run(config: Config) -> ExitCode {
    // Sentry must be initialized before the runtime starts
    let _sentry = telemetry::init_logging(config.common.logging.as_ref());

    if let Some(metrics) = &config.common.metrics
        && let Err(e) = telemetry::init_metrics(metrics)
    {
        tracing::error!("Failed to initialize metrics: {e}");
        return ExitCode::FAILURE;
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(similar_products::run(config.service, shutdown_signal())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Service error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

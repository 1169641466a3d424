use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

mod cli;
mod config;
mod inspect;
mod util;
mod web;

use crate::config::{AppConfig, CliArgs, Command};
use crate::util::logging::init_tracing;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match &args.command {
        Command::Generate(generate_args) => {
            if let Err(e) = cli::run_generate(generate_args, &config) {
                error!("Query generation failed: {}", e);
                return Err(e.into());
            }
        }
        Command::Serve { .. } => {
            let app_state = Arc::new(AppState::new(config.clone())?);

            info!(
                "Starting inspection query server on {}:{}",
                config.web.host, config.web.port
            );
            match web::run_server(config.web, app_state).await {
                Ok(_) => info!("Server stopped gracefully"),
                Err(e) => {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

//! Main entry point for the application.
//!
//! This module loads environment variables, parses configuration, initializes
//! logging, opens the database and serves the HTTP API until shutdown.

use bookshelf::api::server::launch_server;
use bookshelf::cli::Cli;
use bookshelf::db::Database;
use bookshelf::utils;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Main entry point that initializes and runs the application.
///
/// # Initialization steps:
/// 1. Load environment variables from `.env`
/// 2. Parse CLI arguments
/// 3. Initialize logging system
/// 4. Open the database and apply migrations
/// 5. Serve the API
#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    utils::init_logging(&cli.logging_level, cli.log_file);

    if let Err(e) = dotenv {
        warn!("Failed to load .env file: {}", e);
    }

    let database = match Database::new(&cli.database_url) {
        Ok(database) => database,
        Err(e) => {
            error!("Failed to open database {}: {}", cli.database_url, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting API server on port {}", cli.port);
    if let Err(e) = launch_server(database, cli.listen_addr()).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

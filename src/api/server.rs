use crate::api::routes;
use crate::db::Database;
use crate::errors::Error;
use std::net::SocketAddr;
use tracing::{error, info};

/// Starts and runs the HTTP server using Axum web framework
///
/// Runs until the process receives Ctrl-C, then drains in-flight requests.
///
/// # Arguments
/// * `database` - Connection pool handed to every handler
/// * `addr` - Address to listen on for incoming HTTP connections
///
/// # Returns
/// * `Result<(), Error>` - Ok after a clean shutdown, Error if binding or serving fails
pub async fn launch_server(database: Database, addr: SocketAddr) -> Result<(), Error> {
    let app = routes::app(database);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

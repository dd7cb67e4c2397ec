use std::process::ExitCode;

use task_tracker_rs::{ServerConfig, TaskServer};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = ServerConfig::from_env();
    let server = match TaskServer::new(config) {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, "failed to open task store");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = server.start().await {
        error!(error = %err, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

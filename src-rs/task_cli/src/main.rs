use std::process::ExitCode;

use clap::Parser;
use task_tracker_cli::cli::CLIConfig;
use task_tracker_cli::render;
use task_tracker_cli::repl::REPL;
use task_tracker_cli::{HTTPClient, TaskBoard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = CLIConfig::parse();
    let client = match HTTPClient::new(&config.base_url, config.timeout()) {
        Ok(client) => client,
        Err(err) => {
            render::error(&err.to_string());
            return ExitCode::FAILURE;
        }
    };
    let mut repl = REPL::stdin(config, TaskBoard::new(client));
    repl.run();
    ExitCode::SUCCESS
}

use std::time::Duration;

use clap::Parser;

use crate::board::DEFAULT_POLL_INTERVAL;

/// Terminal client for the task tracker API.
#[derive(Clone, Debug, Parser)]
#[command(name = "task-cli", version)]
pub struct CLIConfig {
    /// Base URL of the task tracker server
    #[arg(long = "base", env = "TASK_TRACKER_URL", default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Seconds between background refreshes of the task list
    #[arg(long, env = "TASK_TRACKER_POLL_SECS", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub poll_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl CLIConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

use std::path::PathBuf;

use crate::helpers::{env_opt, env_parse};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub data_file: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            data_file: None,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reads `PORT`, `TASK_TRACKER_DATA` and `TASK_TRACKER_MAX_UPLOAD_BYTES`.
    /// Unset or invalid values keep the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT", defaults.port),
            data_file: env_opt("TASK_TRACKER_DATA").map(PathBuf::from),
            max_upload_bytes: env_parse("TASK_TRACKER_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

pub mod board;
pub mod cli;
pub mod client;
pub mod error;
pub mod models;
pub mod render;
pub mod repl;
pub mod status;

pub use board::{PollHandle, TaskBoard, DEFAULT_POLL_INTERVAL};
pub use client::HTTPClient;
pub use error::ClientError;
pub use models::{TaskForm, TaskInfo, TaskStatus};
pub use status::{derive_status, DerivedStatus};

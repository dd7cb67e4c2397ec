pub mod config;
pub mod error;
pub mod helpers;

#[path = "task/lib.rs"]
pub mod task;
#[path = "api/lib.rs"]
pub mod api;

pub use api::{build_router, AppState, TaskServer};
pub use config::ServerConfig;
pub use error::{ServerError, TaskError, TaskResult};
pub use task::{Task, TaskService, TaskStatus, TaskStore, TaskSummary};

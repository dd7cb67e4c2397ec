pub mod service;
pub mod store;
pub mod types;

pub use service::TaskService;
pub use store::TaskStore;
pub use types::{
    parse_deadline, FileInfo, LinkedFile, NewTask, Task, TaskPatch, TaskStatus, TaskSummary,
    UpdateRequest,
};

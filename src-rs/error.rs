use thiserror::Error;

/// Failure taxonomy shared by the store, the service and the HTTP layer.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Unknown task id, or a task without a linked file (404).
    #[error("{0}")]
    NotFound(String),

    /// Unexpected persistence failure (500).
    #[error("store error: {0}")]
    Store(String),
}

impl TaskError {
    pub fn task_not_found() -> Self {
        TaskError::NotFound("Task not found".to_string())
    }

    pub fn file_not_found() -> Self {
        TaskError::NotFound("File not found".to_string())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            TaskError::Validation(_) => 400,
            TaskError::NotFound(_) => 404,
            TaskError::Store(_) => 500,
        }
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        TaskError::Store(err.to_string())
    }
}

pub type TaskResult<T> = Result<T, TaskError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(String),

    #[error("server error: {0}")]
    Serve(String),

    #[error(transparent)]
    Store(#[from] TaskError),
}

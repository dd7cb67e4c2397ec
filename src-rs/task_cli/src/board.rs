use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::client::HTTPClient;
use crate::error::ClientError;
use crate::models::{Download, TaskForm, TaskInfo};
use crate::status::{derive_for, DerivedStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Client-side view of the task collection. The list is always replaced
/// wholesale by the server's answer, after every mutation and on each poll.
#[derive(Clone)]
pub struct TaskBoard {
    client: HTTPClient,
    tasks: Arc<Mutex<Vec<TaskInfo>>>,
}

impl TaskBoard {
    pub fn new(client: HTTPClient) -> Self {
        Self {
            client,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn tasks(&self) -> Vec<TaskInfo> {
        match self.tasks.lock() {
            Ok(tasks) => tasks.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Tasks paired with their derived label at `now`.
    pub fn rows(&self, now: DateTime<Utc>) -> Vec<(TaskInfo, DerivedStatus)> {
        self.tasks()
            .into_iter()
            .map(|task| {
                let status = derive_for(&task, now);
                (task, status)
            })
            .collect()
    }

    /// Looks a task up by 1-based row number or by id.
    pub fn resolve(&self, key: &str) -> Option<TaskInfo> {
        let tasks = self.tasks();
        if let Ok(row) = key.parse::<usize>() {
            if row >= 1 && row <= tasks.len() {
                return Some(tasks[row - 1].clone());
            }
        }
        tasks.into_iter().find(|task| task.id == key)
    }

    pub fn refresh(&self) -> Result<usize, ClientError> {
        let fresh = self.client.list_tasks().map_err(|err| {
            warn!(error = %err, "failed to fetch tasks");
            err
        })?;
        let count = fresh.len();
        match self.tasks.lock() {
            Ok(mut tasks) => *tasks = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        debug!(count, "task list refreshed");
        Ok(count)
    }

    pub fn create(&self, form: &TaskForm) -> Result<TaskInfo, ClientError> {
        require_complete(form)?;
        let task = self.client.create_task(form).map_err(|err| {
            warn!(error = %err, "failed to save task");
            err
        })?;
        self.refresh_after_mutation();
        Ok(task)
    }

    /// Sends the form's fields as a flat JSON object. Files are not sent on
    /// edit.
    pub fn edit(&self, id: &str, form: &TaskForm) -> Result<TaskInfo, ClientError> {
        require_complete(form)?;
        let task = self
            .client
            .update_task(id, &form.to_fields())
            .map_err(|err| {
                warn!(id, error = %err, "failed to save task");
                err
            })?;
        self.refresh_after_mutation();
        Ok(task)
    }

    pub fn mark_done(&self, id: &str) -> Result<TaskInfo, ClientError> {
        let task = self.client.mark_done(id).map_err(|err| {
            warn!(id, error = %err, "failed to update status");
            err
        })?;
        self.refresh_after_mutation();
        Ok(task)
    }

    pub fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete_task(id).map_err(|err| {
            warn!(id, error = %err, "failed to delete task");
            err
        })?;
        self.refresh_after_mutation();
        Ok(())
    }

    pub fn download(&self, id: &str) -> Result<Download, ClientError> {
        self.client.download_file(id).map_err(|err| {
            warn!(id, error = %err, "failed to download file");
            err
        })
    }

    /// Re-fetches on a fixed interval until the returned handle is dropped.
    pub fn start_polling(&self, interval: Duration) -> PollHandle {
        let (stop, stopped) = mpsc::channel::<()>();
        let board = self.clone();
        let thread = thread::spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let _ = board.refresh();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        PollHandle {
            stop: Some(stop),
            thread: Some(thread),
        }
    }

    fn refresh_after_mutation(&self) {
        // The mutation already succeeded; a failed re-fetch is only logged.
        let _ = self.refresh();
    }
}

fn require_complete(form: &TaskForm) -> Result<(), ClientError> {
    let missing = form.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Invalid(format!(
            "{} required",
            missing.join(", ")
        )))
    }
}

/// Cancels the poll timer and joins its thread when dropped.
pub struct PollHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stops polling and waits for an in-flight refresh to finish.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

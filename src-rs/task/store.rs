use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, error, info};

use super::types::{Task, TaskPatch, TaskSummary};
use crate::error::{TaskError, TaskResult};

/// Ordered task collection. Listing follows insertion order. When a data
/// file is configured every mutation is written through before it returns.
pub struct TaskStore {
    path: Option<PathBuf>,
    tasks: RwLock<Vec<Task>>,
}

impl TaskStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// Opens a file-backed store, loading existing documents if the file is
    /// present.
    pub fn open(path: PathBuf) -> TaskResult<Self> {
        let tasks = if path.exists() {
            Self::load_from_disk(&path)?
        } else {
            Vec::new()
        };
        info!(path = %path.display(), count = tasks.len(), "task store opened");
        Ok(Self {
            path: Some(path),
            tasks: RwLock::new(tasks),
        })
    }

    pub fn insert(&self, task: Task) -> TaskResult<String> {
        let mut tasks = self.write()?;
        let id = task.id.clone();
        tasks.push(task);
        if let Err(err) = self.save_if_needed(&tasks) {
            tasks.pop();
            return Err(err);
        }
        debug!(id = %id, "task inserted");
        Ok(id)
    }

    pub fn find_all(&self) -> TaskResult<Vec<TaskSummary>> {
        let tasks = self.read()?;
        Ok(tasks.iter().map(Task::summary).collect())
    }

    pub fn find_by_id(&self, id: &str) -> TaskResult<Task> {
        let tasks = self.read()?;
        tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(TaskError::task_not_found)
    }

    pub fn update(&self, id: &str, patch: &TaskPatch) -> TaskResult<Task> {
        let mut tasks = self.write()?;
        let idx = position(&tasks, id)?;
        let previous = tasks[idx].clone();
        if !patch.apply(&mut tasks[idx]) {
            return Ok(previous);
        }
        tasks[idx].updated_at = Utc::now();
        if let Err(err) = self.save_if_needed(&tasks) {
            tasks[idx] = previous;
            return Err(err);
        }
        debug!(id = %id, "task updated");
        Ok(tasks[idx].clone())
    }

    pub fn delete(&self, id: &str) -> TaskResult<()> {
        let mut tasks = self.write()?;
        let idx = position(&tasks, id)?;
        let removed = tasks.remove(idx);
        if let Err(err) = self.save_if_needed(&tasks) {
            tasks.insert(idx, removed);
            return Err(err);
        }
        debug!(id = %id, "task deleted");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().map(|tasks| tasks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> TaskResult<RwLockReadGuard<'_, Vec<Task>>> {
        self.tasks
            .read()
            .map_err(|_| TaskError::Store("task store lock poisoned".to_string()))
    }

    fn write(&self) -> TaskResult<RwLockWriteGuard<'_, Vec<Task>>> {
        self.tasks
            .write()
            .map_err(|_| TaskError::Store("task store lock poisoned".to_string()))
    }

    fn save_if_needed(&self, tasks: &[Task]) -> TaskResult<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };
        let serialized = serde_json::to_string_pretty(tasks)?;
        let tmp = path.with_extension("tmp");
        let written = fs::write(&tmp, serialized).and_then(|_| fs::rename(&tmp, path));
        if let Err(err) = written {
            error!(path = %path.display(), error = %err, "failed to persist tasks");
            return Err(err.into());
        }
        Ok(())
    }

    pub fn load_from_disk(path: &Path) -> TaskResult<Vec<Task>> {
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str::<Vec<Task>>(&data)?)
    }
}

fn position(tasks: &[Task], id: &str) -> TaskResult<usize> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or_else(TaskError::task_not_found)
}

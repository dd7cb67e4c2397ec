use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::store::TaskStore;
use super::types::{
    parse_deadline, LinkedFile, NewTask, Task, TaskPatch, TaskStatus, TaskSummary, UpdateRequest,
};
use crate::error::{TaskError, TaskResult};

/// Business rules over the store: required fields on create, truthy-only
/// patching on update, and file lookup for downloads.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn create(&self, input: NewTask) -> TaskResult<Task> {
        let title = truthy(input.title);
        let description = truthy(input.description);
        let deadline = truthy(input.deadline);

        let missing: Vec<&str> = [
            ("title", title.is_none()),
            ("description", description.is_none()),
            ("deadline", deadline.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            let verb = if missing.len() == 1 { "is" } else { "are" };
            return Err(TaskError::Validation(format!(
                "{} {} required",
                missing.join(", "),
                verb
            )));
        }

        let deadline = parse_deadline(&deadline.unwrap_or_default())?;
        let now = Utc::now();
        let task = Task {
            id: next_id(),
            title: title.unwrap_or_default(),
            description: description.unwrap_or_default(),
            deadline,
            status: TaskStatus::Pending,
            linked_file: input.linked_file,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(task.clone())?;
        info!(
            id = %task.id,
            has_file = task.linked_file.is_some(),
            "task created"
        );
        Ok(task)
    }

    pub fn list(&self) -> TaskResult<Vec<TaskSummary>> {
        self.store.find_all()
    }

    pub fn update(&self, id: &str, req: UpdateRequest) -> TaskResult<Task> {
        let current = self.store.find_by_id(id)?;
        let patch = build_patch(req)?;
        if patch.is_empty() {
            return Ok(current);
        }
        let task = self.store.update(id, &patch)?;
        info!(id = %id, status = %task.status, "task updated");
        Ok(task)
    }

    pub fn delete(&self, id: &str) -> TaskResult<()> {
        self.store.delete(id)?;
        info!(id = %id, "task deleted");
        Ok(())
    }

    pub fn fetch_file(&self, id: &str) -> TaskResult<LinkedFile> {
        let task = self.store.find_by_id(id).map_err(|err| match err {
            TaskError::NotFound(_) => TaskError::file_not_found(),
            other => other,
        })?;
        task.linked_file.ok_or_else(TaskError::file_not_found)
    }
}

/// Converts the raw request into a patch. Absent and empty values are
/// skipped, so a field can never be cleared through this path.
pub fn build_patch(req: UpdateRequest) -> TaskResult<TaskPatch> {
    let status = match truthy(req.status) {
        Some(raw) => Some(raw.parse::<TaskStatus>()?),
        None => None,
    };
    let deadline = match truthy(req.deadline) {
        Some(raw) => Some(parse_deadline(&raw)?),
        None => None,
    };
    Ok(TaskPatch {
        title: truthy(req.title),
        description: truthy(req.description),
        status,
        deadline,
    })
}

fn truthy(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn next_id() -> String {
    Uuid::new_v4().simple().to_string()
}

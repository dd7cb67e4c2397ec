use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "PENDING" => Ok(TaskStatus::Pending),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(TaskError::Validation(format!(
                "`{}` is not a valid status (expected PENDING or DONE)",
                other
            ))),
        }
    }
}

/// Attachment stored inline with its task. Bytes are base64 encoded when the
/// store is written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedFile {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub content_type: String,
    pub original_name: String,
}

impl LinkedFile {
    pub fn info(&self) -> FileInfo {
        FileInfo {
            content_type: self.content_type.clone(),
            original_name: self.original_name.clone(),
            size: self.data.len(),
        }
    }
}

/// File metadata without the bytes, used in every JSON view of a task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub content_type: String,
    pub original_name: String,
    pub size: usize,
}

/// Persisted task document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    pub linked_file: Option<LinkedFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            deadline: self.deadline,
            status: self.status,
            linked_file: self.linked_file.as_ref().map(LinkedFile::info),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Wire view of a task: same fields, file bytes replaced by metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    pub linked_file: Option<FileInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create input as it arrives from the HTTP layer. Empty strings count as
/// missing.
#[derive(Clone, Debug, Default)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub linked_file: Option<LinkedFile>,
}

/// Update input. Only truthy (present and non-empty) fields are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<String>,
}

/// Parsed patch handed to the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
    }

    /// Writes the patch into `task`, returning whether any field changed.
    pub fn apply(&self, task: &mut Task) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title {
            changed |= task.title != *title;
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            changed |= task.description != *description;
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            changed |= task.status != status;
            task.status = status;
        }
        if let Some(deadline) = self.deadline {
            changed |= task.deadline != deadline;
            task.deadline = deadline;
        }
        changed
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, TaskError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(TaskError::Validation(format!(
        "`{}` is not a valid deadline",
        raw
    )))
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

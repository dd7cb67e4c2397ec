use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub content_type: String,
    pub original_name: String,
    #[serde(default)]
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(default)]
    pub linked_file: Option<FileInfo>,
}

/// Fields of the add/edit form. `deadline` is a `YYYY-MM-DD` date.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub file: Option<PathBuf>,
}

impl TaskForm {
    /// Pre-fills the edit form from an existing task. No file input.
    pub fn from_task(task: &TaskInfo) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline.format("%Y-%m-%d").to_string(),
            file: None,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push("title");
        }
        if self.description.is_empty() {
            missing.push("description");
        }
        if self.deadline.is_empty() {
            missing.push("deadline");
        }
        missing
    }

    /// Flat key/value body sent on edit. File data is never part of it.
    pub fn to_fields(&self) -> BTreeMap<&'static str, String> {
        let mut fields = BTreeMap::new();
        fields.insert("title", self.title.clone());
        fields.insert("description", self.description.clone());
        fields.insert("deadline", self.deadline.clone());
        fields
    }
}

#[derive(Clone, Debug)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

impl Download {
    /// Where the file lands when no target is given: the bare file name in
    /// the working directory, or `download.pdf` if nothing usable is left.
    pub fn local_name(&self) -> PathBuf {
        Path::new(&self.filename)
            .file_name()
            .filter(|name| !name.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("download.pdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task() -> TaskInfo {
        TaskInfo {
            id: "t1".to_string(),
            title: "Write report".to_string(),
            description: "Quarterly".to_string(),
            deadline: Utc.with_ymd_and_hms(2099, 3, 4, 15, 0, 0).unwrap(),
            status: TaskStatus::Pending,
            linked_file: None,
        }
    }

    #[test]
    fn edit_form_prefills_date_only_deadline() {
        let form = TaskForm::from_task(&task());
        assert_eq!(form.deadline, "2099-03-04");
        assert_eq!(form.title, "Write report");
        assert!(form.file.is_none());
    }

    #[test]
    fn edit_fields_exclude_file() {
        let mut form = TaskForm::from_task(&task());
        form.file = Some(PathBuf::from("/tmp/ignored.pdf"));
        let fields = form.to_fields();
        assert_eq!(fields.len(), 3);
        assert!(!fields.contains_key("linkedFile"));
    }

    #[test]
    fn missing_fields_are_reported_in_form_order() {
        let form = TaskForm {
            title: "x".to_string(),
            ..TaskForm::default()
        };
        assert_eq!(form.missing_fields(), vec!["description", "deadline"]);
    }

    #[test]
    fn download_lands_in_working_directory() {
        let named = |filename: &str| Download {
            bytes: Vec::new(),
            content_type: "application/pdf".to_string(),
            filename: filename.to_string(),
        };
        assert_eq!(named("plan v2.pdf").local_name(), PathBuf::from("plan v2.pdf"));
        assert_eq!(named("/tmp/evil.txt").local_name(), PathBuf::from("evil.txt"));
        assert_eq!(named("../../x.sh").local_name(), PathBuf::from("x.sh"));
        assert_eq!(named("..").local_name(), PathBuf::from("download.pdf"));
        assert_eq!(named("").local_name(), PathBuf::from("download.pdf"));
    }

    #[test]
    fn task_info_reads_server_json() {
        let raw = r#"{"_id":"abc","title":"A","description":"B","deadline":"2099-01-01T00:00:00Z",
            "status":"DONE","linkedFile":{"contentType":"text/plain","originalName":"n.txt","size":3},
            "createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}"#;
        let info: TaskInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.status, TaskStatus::Done);
        assert_eq!(info.linked_file.unwrap().original_name, "n.txt");
    }
}

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::{TaskInfo, TaskStatus};

/// Presentation label computed from stored status and the deadline. Never
/// sent back to the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivedStatus {
    InProgress,
    Failed,
    Completed,
    Achieved,
}

impl DerivedStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DerivedStatus::InProgress => "In Progress",
            DerivedStatus::Failed => "Failed",
            DerivedStatus::Completed => "Completed",
            DerivedStatus::Achieved => "Achieved",
        }
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn derive_status(status: TaskStatus, deadline: DateTime<Utc>, now: DateTime<Utc>) -> DerivedStatus {
    let is_past = now > deadline;
    match (status, is_past) {
        (TaskStatus::Done, true) => DerivedStatus::Achieved,
        (TaskStatus::Done, false) => DerivedStatus::Completed,
        (TaskStatus::Pending, true) => DerivedStatus::Failed,
        (TaskStatus::Pending, false) => DerivedStatus::InProgress,
    }
}

pub fn derive_for(task: &TaskInfo, now: DateTime<Utc>) -> DerivedStatus {
    derive_status(task.status, task.deadline, now)
}

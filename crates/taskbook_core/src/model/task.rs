use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Persisted as the human-readable strings `"Done"` / `"Not done"` /
/// `"Doing right now"`; renaming a variant changes the file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "Done")]
    Done,
    #[serde(rename = "Not done")]
    NotDone,
    #[serde(rename = "Doing right now")]
    Doing,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::NotDone
    }
}

impl TaskState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Done => "Done",
            Self::NotDone => "Not done",
            Self::Doing => "Doing right now",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub state: TaskState,
    #[serde(default)]
    pub deadline: Option<String>,
}

impl Task {
    /// Deadline parsed as a calendar date; `None` for tasks without one
    /// and for unparseable values, which can appear in hand-edited or
    /// legacy files. Entry points validate the format before storing.
    pub fn deadline_date(&self) -> Option<Date> {
        parse_date(self.deadline.as_deref()?)
    }

    /// A task is overdue once its deadline lies before `today`, unless it
    /// is already done. Undated tasks are never overdue.
    pub fn is_overdue(&self, today: Date) -> bool {
        if self.state == TaskState::Done {
            return false;
        }
        match self.deadline_date() {
            Some(deadline) => deadline < today,
            None => false,
        }
    }
}

fn parse_date(raw: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), &format).ok()
}

/// Validates a deadline entered through create/update.
pub fn parse_deadline(raw: &str) -> Result<Date, AppError> {
    parse_date(raw)
        .ok_or_else(|| AppError::invalid_input("deadline must be an ISO date (YYYY-MM-DD)"))
}

/// Generates an id that is unique within `existing`. Ids are timestamp
/// based; the bump loop covers back-to-back calls within one clock tick.
pub fn next_task_id(existing: &[Task]) -> String {
    let mut stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
    loop {
        let id = format!("task-{stamp}");
        if !existing.iter().any(|task| task.id == id) {
            return id;
        }
        stamp += 1;
    }
}

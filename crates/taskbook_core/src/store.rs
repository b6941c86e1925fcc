//! The in-memory task list and its mutating operations. Every mutation is
//! validated first, applied to memory, then written back to disk, so the
//! file always reflects the last successful call.

use crate::error::AppError;
use crate::model::{Task, TaskState, next_task_id, parse_deadline};
use crate::storage::json_store;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime, UtcOffset};

/// A task list bound to the file it was loaded from.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

/// Result of opening a store. A damaged file degrades to an empty list
/// instead of failing; the cause is carried here for a warning line.
#[derive(Debug)]
pub struct StoreOpen {
    pub store: TaskStore,
    pub warning: Option<AppError>,
}

/// Fields for a task that does not exist yet. Unset fields take their
/// defaults: `Not done` for the state, nothing for summary and deadline.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub summary: Option<String>,
    pub state: Option<TaskState>,
    pub deadline: Option<String>,
}

/// A partial update. Only the fields that are set change the task;
/// `clear_*` removes an optional field entirely.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub clear_summary: bool,
    pub state: Option<TaskState>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && !self.clear_summary
            && self.state.is_none()
            && self.deadline.is_none()
            && !self.clear_deadline
    }
}

impl TaskStore {
    /// Open the store at its default location (honoring
    /// `TASKBOOK_STORE_PATH`).
    pub fn open() -> Result<StoreOpen, AppError> {
        let path = json_store::store_path()?;
        Ok(Self::open_at(path))
    }

    pub fn open_at(path: impl Into<PathBuf>) -> StoreOpen {
        let path = path.into();
        let load = json_store::load_tasks_with_fallback(&path);
        StoreOpen {
            store: TaskStore {
                path,
                tasks: load.tasks,
            },
            warning: load.error,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// View of the tasks in one state, in list order. Does not touch the
    /// list itself; use [`TaskStore::retain_state`] for the destructive
    /// variant.
    pub fn filtered(&self, state: TaskState) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.state == state)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate and append a task, then persist. Returns the stored task
    /// with its assigned id.
    pub fn create(&mut self, new: NewTask) -> Result<Task, AppError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_input("title cannot be empty"));
        }
        let deadline = match &new.deadline {
            Some(raw) => {
                parse_deadline(raw)?;
                Some(raw.trim().to_string())
            }
            None => None,
        };

        let task = Task {
            id: next_task_id(&self.tasks),
            title: title.to_string(),
            summary: new.summary.as_deref().and_then(trimmed_or_none),
            state: new.state.unwrap_or_default(),
            deadline,
        };
        let created = task.clone();
        self.tasks.push(task);
        self.save()?;
        Ok(created)
    }

    /// Apply a patch to the task with the given id, then persist. The
    /// patch is validated as a whole before anything changes.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
        if patch.is_empty() {
            return Err(AppError::invalid_input("nothing to update"));
        }
        if patch.summary.is_some() && patch.clear_summary {
            return Err(AppError::invalid_input(
                "cannot set and clear the summary at once",
            ));
        }
        if patch.deadline.is_some() && patch.clear_deadline {
            return Err(AppError::invalid_input(
                "cannot set and clear the deadline at once",
            ));
        }
        let title = match &patch.title {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(AppError::invalid_input("title cannot be empty"));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        let deadline = match &patch.deadline {
            Some(raw) => {
                parse_deadline(raw)?;
                Some(raw.trim().to_string())
            }
            None => None,
        };

        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::invalid_input(format!("no task with id {id}")))?;

        let task = &mut self.tasks[index];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(summary) = &patch.summary {
            task.summary = trimmed_or_none(summary);
        }
        if patch.clear_summary {
            task.summary = None;
        }
        if let Some(state) = patch.state {
            task.state = state;
        }
        if let Some(deadline) = deadline {
            task.deadline = Some(deadline);
        }
        if patch.clear_deadline {
            task.deadline = None;
        }

        let updated = self.tasks[index].clone();
        self.save()?;
        Ok(updated)
    }

    /// Remove the task with the given id, then persist. Returns the
    /// removed task.
    pub fn delete(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::invalid_input(format!("no task with id {id}")))?;
        let removed = self.tasks.remove(index);
        self.save()?;
        Ok(removed)
    }

    /// Move tasks in the given state to the front, keeping relative order
    /// within both groups. Sorting an already sorted list changes nothing.
    pub fn sort_by_state(&mut self, state: TaskState) -> Result<(), AppError> {
        self.tasks.sort_by_key(|task| task.state != state);
        self.save()
    }

    /// Order tasks by deadline, earliest first. Tasks without a readable
    /// deadline keep their relative order at the end of the list.
    pub fn sort_by_deadline(&mut self) -> Result<(), AppError> {
        self.tasks.sort_by_key(|task| {
            let date = task.deadline_date();
            (date.is_none(), date)
        });
        self.save()
    }

    /// Drop every task not in the given state, then persist. Returns how
    /// many tasks were removed.
    pub fn retain_state(&mut self, state: TaskState) -> Result<usize, AppError> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.state == state);
        let removed = before - self.tasks.len();
        self.save()?;
        Ok(removed)
    }

    fn save(&self) -> Result<(), AppError> {
        json_store::save_tasks(&self.path, &self.tasks)
    }
}

/// Today's date in the local timezone, falling back to UTC when the
/// offset cannot be determined.
pub fn local_today() -> Date {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

fn trimmed_or_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

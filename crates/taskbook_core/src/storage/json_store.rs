use crate::error::AppError;
use crate::model::{Task, TaskState, next_task_id};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

/// The unversioned browser layout this store descends from: a bare JSON
/// array without ids, empty strings standing in for unset fields.
#[derive(Debug, Deserialize)]
struct LegacyTask {
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    state: TaskState,
    #[serde(default)]
    deadline: String,
}

#[derive(Debug, Clone)]
pub struct TasksLoad {
    pub tasks: Vec<Task>,
    pub error: Option<AppError>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var("TASKBOOK_STORE_PATH")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::storage("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskbook")
            .join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::storage("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskbook")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content =
        std::fs::read_to_string(path).map_err(|err| AppError::storage(err.to_string()))?;

    match serde_json::from_str::<StoredTasks>(&content) {
        Ok(stored) => {
            if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
                return Err(AppError::corrupted(format!(
                    "schema_version {} is not supported by this build",
                    stored.schema_version
                )));
            }
            validate_ids(&stored.tasks)?;
            Ok(stored.tasks)
        }
        Err(envelope_err) => match serde_json::from_str::<Vec<LegacyTask>>(&content) {
            Ok(legacy) => Ok(migrate_legacy(legacy)),
            Err(_) => Err(AppError::corrupted(format!(
                "invalid task store: {envelope_err}"
            ))),
        },
    }
}

/// Load that never fails: an unreadable or malformed store degrades to an
/// empty list, with the cause returned for the caller to surface.
pub fn load_tasks_with_fallback(path: &Path) -> TasksLoad {
    match load_tasks(path) {
        Ok(tasks) => TasksLoad { tasks, error: None },
        Err(err) => TasksLoad {
            tasks: Vec::new(),
            error: Some(err),
        },
    }
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::storage(err.to_string()))?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: tasks.to_vec(),
    };
    let content =
        serde_json::to_string_pretty(&stored).map_err(|err| AppError::corrupted(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::storage(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|err| AppError::storage(err.to_string()))?;
    }

    Ok(())
}

fn validate_ids(tasks: &[Task]) -> Result<(), AppError> {
    for (index, task) in tasks.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(AppError::corrupted("task id cannot be empty"));
        }
        if tasks[..index].iter().any(|other| other.id == task.id) {
            return Err(AppError::corrupted(format!(
                "duplicate task id {}",
                task.id
            )));
        }
    }
    Ok(())
}

fn migrate_legacy(legacy: Vec<LegacyTask>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(legacy.len());
    for entry in legacy {
        let id = next_task_id(&tasks);
        tasks.push(Task {
            id,
            title: entry.title,
            summary: none_if_blank(&entry.summary),
            state: entry.state,
            deadline: none_if_blank(&entry.deadline),
        });
    }
    tasks
}

fn none_if_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_VERSION, load_tasks, load_tasks_with_fallback, save_tasks};
    use crate::model::{Task, TaskState};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskbook-{nanos}-{file_name}"))
    }

    fn demo_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: "demo".to_string(),
            summary: Some("a short note".to_string()),
            state: TaskState::NotDone,
            deadline: Some("2024-01-01".to_string()),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("tasks.json");
        let tasks = vec![demo_task("task-1"), demo_task("task-2")];

        save_tasks(&path, &tasks).unwrap();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn missing_file_loads_empty() {
        let path = temp_path("missing.json");
        let loaded = load_tasks(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn migrates_legacy_browser_array() {
        let path = temp_path("legacy.json");
        let content = serde_json::json!([
            {
                "title": "Write report",
                "summary": "",
                "state": "Not done",
                "deadline": "2024-01-01"
            },
            {
                "title": "Ship it",
                "summary": "after review",
                "state": "Doing right now",
                "deadline": ""
            }
        ]);
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].id.starts_with("task-"));
        assert_ne!(loaded[0].id, loaded[1].id);
        assert_eq!(loaded[0].title, "Write report");
        assert_eq!(loaded[0].summary, None);
        assert_eq!(loaded[0].deadline, Some("2024-01-01".to_string()));
        assert_eq!(loaded[1].state, TaskState::Doing);
        assert_eq!(loaded[1].summary, Some("after review".to_string()));
        assert_eq!(loaded[1].deadline, None);
    }

    #[test]
    fn rejects_schema_version_from_the_future() {
        let path = temp_path("future.json");
        let content = format!(
            "{{\n  \"schema_version\": {},\n  \"tasks\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, content).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "corrupted_data");
    }

    #[test]
    fn rejects_duplicate_task_ids() {
        let path = temp_path("duplicate.json");
        let content = serde_json::json!({
            "schema_version": 1,
            "tasks": [
                { "id": "task-1", "title": "first", "state": "Done" },
                { "id": "task-1", "title": "second", "state": "Not done" }
            ]
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "corrupted_data");
    }

    #[test]
    fn rejects_blank_task_id() {
        let path = temp_path("blank-id.json");
        let content = serde_json::json!({
            "schema_version": 1,
            "tasks": [
                { "id": "  ", "title": "first", "state": "Done" }
            ]
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let err = load_tasks(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "corrupted_data");
    }

    #[test]
    fn fallback_degrades_garbage_to_empty_list() {
        let path = temp_path("garbage.json");
        fs::write(&path, "{ not json ").unwrap();

        let load = load_tasks_with_fallback(&path);
        fs::remove_file(&path).ok();

        assert!(load.tasks.is_empty());
        assert_eq!(load.error.unwrap().code(), "corrupted_data");
    }

    #[test]
    fn fallback_keeps_missing_file_silent() {
        let path = temp_path("fallback-missing.json");
        let load = load_tasks_with_fallback(&path);

        assert!(load.tasks.is_empty());
        assert!(load.error.is_none());
    }

    #[test]
    fn optional_fields_round_trip_as_null() {
        let path = temp_path("nulls.json");
        let task = Task {
            id: "task-1".to_string(),
            title: "bare".to_string(),
            summary: None,
            state: TaskState::Done,
            deadline: None,
        };

        save_tasks(&path, std::slice::from_ref(&task)).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let loaded = load_tasks(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(raw["tasks"][0]["summary"].is_null());
        assert!(raw["tasks"][0]["deadline"].is_null());
        assert_eq!(loaded[0], task);
    }
}

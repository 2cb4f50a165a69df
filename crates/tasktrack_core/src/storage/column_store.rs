use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.bin";

/// On-disk layout: one typed column per task field, bincode-encoded.
/// Timestamps are unix seconds; the deadline column is nullable.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredColumns {
    schema_version: u32,
    ids: Vec<u64>,
    titles: Vec<String>,
    priorities: Vec<u8>,
    statuses: Vec<u8>,
    deadlines: Vec<Option<i64>>,
    created: Vec<i64>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var("TASKTRACK_STORE_PATH")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::storage("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("tasktrack")
            .join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::storage("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("tasktrack")
            .join(STORE_FILE_NAME))
    }
}

fn status_code(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::New => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Done => 2,
        TaskStatus::Abandoned => 3,
    }
}

fn status_from_code(code: u8) -> Result<TaskStatus, AppError> {
    match code {
        0 => Ok(TaskStatus::New),
        1 => Ok(TaskStatus::InProgress),
        2 => Ok(TaskStatus::Done),
        3 => Ok(TaskStatus::Abandoned),
        other => Err(AppError::storage(format!("unknown status code {other}"))),
    }
}

fn timestamp(value: i64) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::from_unix_timestamp(value)
        .map_err(|_| AppError::storage(format!("timestamp {value} out of range")))
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let bytes = std::fs::read(path).map_err(|err| AppError::storage(err.to_string()))?;
    let stored: StoredColumns =
        bincode::deserialize(&bytes).map_err(|err| AppError::storage(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::storage("schema_version mismatch"));
    }

    let rows = stored.ids.len();
    if stored.titles.len() != rows
        || stored.priorities.len() != rows
        || stored.statuses.len() != rows
        || stored.deadlines.len() != rows
        || stored.created.len() != rows
    {
        return Err(AppError::storage("column length mismatch"));
    }

    let mut tasks = Vec::with_capacity(rows);
    for row in 0..rows {
        let deadline = match stored.deadlines[row] {
            Some(value) => Some(timestamp(value)?),
            None => None,
        };
        tasks.push(Task {
            id: stored.ids[row],
            title: stored.titles[row].clone(),
            priority: stored.priorities[row],
            status: status_from_code(stored.statuses[row])?,
            deadline,
            created_at: timestamp(stored.created[row])?,
        });
    }

    Ok(tasks)
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::storage(err.to_string()))?;
    }

    let mut stored = StoredColumns {
        schema_version: SCHEMA_VERSION,
        ..StoredColumns::default()
    };
    for task in tasks {
        stored.ids.push(task.id);
        stored.titles.push(task.title.clone());
        stored.priorities.push(task.priority);
        stored.statuses.push(status_code(task.status));
        stored
            .deadlines
            .push(task.deadline.map(|deadline| deadline.unix_timestamp()));
        stored.created.push(task.created_at.unix_timestamp());
    }

    let bytes = bincode::serialize(&stored).map_err(|err| AppError::storage(err.to_string()))?;
    std::fs::write(path, bytes).map_err(|err| AppError::storage(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|err| AppError::storage(err.to_string()))?;
    }

    Ok(())
}

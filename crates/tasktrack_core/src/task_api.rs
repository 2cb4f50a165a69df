use crate::error::AppError;
use crate::model::{DeadlineFlag, PRIORITY_MAX, PRIORITY_MIN, Task, TaskStatus};
use crate::storage::column_store;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, UtcOffset};

/// A task paired with its display-time deadline flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task: Task,
    pub flag: Option<DeadlineFlag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityFilter {
    Exact(u8),
    AtLeast(u8),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<PriorityFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DeadlineAsc,
    PriorityDesc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityCount {
    pub priority: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub overdue: Vec<Task>,
}

pub fn add_task(
    title: &str,
    priority: u8,
    deadline: Option<OffsetDateTime>,
) -> Result<Task, AppError> {
    let path = column_store::store_path()?;
    add_task_with_path(&path, title, priority, deadline)
}

pub fn update_status(id: u64, status: TaskStatus) -> Result<Task, AppError> {
    let path = column_store::store_path()?;
    update_status_with_path(&path, id, status)
}

pub fn update_priority(id: u64, priority: u8) -> Result<Task, AppError> {
    let path = column_store::store_path()?;
    update_priority_with_path(&path, id, priority)
}

pub fn update_deadline(id: u64, deadline: Option<OffsetDateTime>) -> Result<Task, AppError> {
    let path = column_store::store_path()?;
    update_deadline_with_path(&path, id, deadline)
}

pub fn delete_task(id: u64) -> Result<Task, AppError> {
    let path = column_store::store_path()?;
    delete_task_with_path(&path, id)
}

pub fn get_task(id: u64) -> Result<Task, AppError> {
    let path = column_store::store_path()?;
    get_task_with_path(&path, id)
}

pub fn list_tasks(filter: ListFilter, sort: Option<SortKey>) -> Result<Vec<TaskView>, AppError> {
    let path = column_store::store_path()?;
    list_tasks_with_path(&path, filter, sort)
}

pub fn stats() -> Result<Statistics, AppError> {
    let path = column_store::store_path()?;
    stats_with_path(&path)
}

/// Parse a deadline given as RFC3339 or `YYYY-MM-DD` (midnight, local offset).
pub fn parse_deadline(raw: &str) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("deadline is required"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(truncate_to_seconds(parsed));
    }

    let format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(trimmed, format)
        .map_err(|_| AppError::validation("deadline must be RFC3339 or YYYY-MM-DD"))?;
    Ok(date.with_time(Time::MIDNIGHT).assume_offset(local_offset()))
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

// The store keeps whole-second timestamps; truncate on entry so a persisted
// and reloaded collection compares equal to the in-memory one.
fn truncate_to_seconds(value: OffsetDateTime) -> OffsetDateTime {
    value.replace_nanosecond(0).unwrap_or(value)
}

fn now_secs() -> OffsetDateTime {
    truncate_to_seconds(OffsetDateTime::now_utc())
}

fn validate_priority(priority: u8) -> Result<(), AppError> {
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        return Err(AppError::validation(format!(
            "priority must be between {PRIORITY_MIN} and {PRIORITY_MAX}"
        )));
    }
    Ok(())
}

fn task_not_found(id: u64) -> AppError {
    AppError::not_found(format!("no task with id {id}"))
}

fn add_task_with_path(
    path: &Path,
    title: &str,
    priority: u8,
    deadline: Option<OffsetDateTime>,
) -> Result<Task, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("title is required"));
    }
    validate_priority(priority)?;

    let mut tasks = column_store::load_tasks(path)?;
    let id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
    let task = Task {
        id,
        title: trimmed.to_string(),
        priority,
        status: TaskStatus::New,
        deadline: deadline.map(truncate_to_seconds),
        created_at: now_secs(),
    };

    tasks.push(task.clone());
    column_store::save_tasks(path, &tasks)?;

    Ok(task)
}

fn update_status_with_path(path: &Path, id: u64, status: TaskStatus) -> Result<Task, AppError> {
    let mut tasks = column_store::load_tasks(path)?;
    let mut updated_task = None;

    for task in &mut tasks {
        if task.id == id {
            task.status = status;
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| task_not_found(id))?;
    column_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

fn update_priority_with_path(path: &Path, id: u64, priority: u8) -> Result<Task, AppError> {
    validate_priority(priority)?;

    let mut tasks = column_store::load_tasks(path)?;
    let mut updated_task = None;

    for task in &mut tasks {
        if task.id == id {
            task.priority = priority;
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| task_not_found(id))?;
    column_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

fn update_deadline_with_path(
    path: &Path,
    id: u64,
    deadline: Option<OffsetDateTime>,
) -> Result<Task, AppError> {
    let deadline = deadline.map(truncate_to_seconds);
    let mut tasks = column_store::load_tasks(path)?;
    let mut updated_task = None;

    for task in &mut tasks {
        if task.id == id {
            task.deadline = deadline;
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| task_not_found(id))?;
    column_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

fn delete_task_with_path(path: &Path, id: u64) -> Result<Task, AppError> {
    let mut tasks = column_store::load_tasks(path)?;
    let index = tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or_else(|| task_not_found(id))?;

    let removed = tasks.remove(index);
    column_store::save_tasks(path, &tasks)?;

    Ok(removed)
}

fn get_task_with_path(path: &Path, id: u64) -> Result<Task, AppError> {
    let tasks = column_store::load_tasks(path)?;
    tasks
        .into_iter()
        .find(|task| task.id == id)
        .ok_or_else(|| task_not_found(id))
}

fn list_tasks_with_path(
    path: &Path,
    filter: ListFilter,
    sort: Option<SortKey>,
) -> Result<Vec<TaskView>, AppError> {
    let tasks = column_store::load_tasks(path)?;
    Ok(build_views(tasks, filter, sort, OffsetDateTime::now_utc()))
}

fn stats_with_path(path: &Path) -> Result<Statistics, AppError> {
    let tasks = column_store::load_tasks(path)?;
    Ok(build_stats(&tasks, OffsetDateTime::now_utc()))
}

fn matches_filter(task: &Task, filter: &ListFilter) -> bool {
    if let Some(status) = filter.status
        && task.status != status
    {
        return false;
    }

    match filter.priority {
        Some(PriorityFilter::Exact(priority)) => task.priority == priority,
        Some(PriorityFilter::AtLeast(priority)) => task.priority >= priority,
        None => true,
    }
}

fn build_views(
    tasks: Vec<Task>,
    filter: ListFilter,
    sort: Option<SortKey>,
    now: OffsetDateTime,
) -> Vec<TaskView> {
    let mut selected: Vec<Task> = tasks
        .into_iter()
        .filter(|task| matches_filter(task, &filter))
        .collect();

    match sort {
        // Tasks without a deadline sort last; ties keep stored order.
        Some(SortKey::DeadlineAsc) => {
            selected.sort_by_key(|task| (task.deadline.is_none(), task.deadline));
        }
        Some(SortKey::PriorityDesc) => {
            selected.sort_by_key(|task| std::cmp::Reverse(task.priority));
        }
        None => {}
    }

    selected
        .into_iter()
        .map(|task| {
            let flag = task.deadline_flag(now);
            TaskView { task, flag }
        })
        .collect()
}

fn build_stats(tasks: &[Task], now: OffsetDateTime) -> Statistics {
    let total = tasks.len();

    let mut by_status = Vec::new();
    if total > 0 {
        for status in TaskStatus::ALL {
            let count = tasks.iter().filter(|task| task.status == status).count();
            if count == 0 {
                continue;
            }
            // Rounded independently per status; the column may not sum to 100.
            let percentage = ((count * 100) as f64 / total as f64).round() as u32;
            by_status.push(StatusCount {
                status,
                count,
                percentage,
            });
        }
    }

    let mut by_priority = Vec::new();
    for priority in (PRIORITY_MIN..=PRIORITY_MAX).rev() {
        let count = tasks.iter().filter(|task| task.priority == priority).count();
        if count > 0 {
            by_priority.push(PriorityCount { priority, count });
        }
    }

    let overdue = tasks
        .iter()
        .filter(|task| task.deadline_flag(now) == Some(DeadlineFlag::Overdue))
        .cloned()
        .collect();

    Statistics {
        total,
        by_status,
        by_priority,
        overdue,
    }
}

mod task;

pub use task::{DeadlineFlag, PRIORITY_MAX, PRIORITY_MIN, SOON_WINDOW, Task, TaskStatus};

use time::{Duration, OffsetDateTime};

pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 5;

/// Window ahead of now in which an open task with a deadline counts as due soon.
pub const SOON_WINDOW: Duration = Duration::days(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
    Abandoned,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::New, Self::InProgress, Self::Done, Self::Abandoned];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Abandoned => "abandoned",
        }
    }

    /// Done and abandoned tasks are closed; deadlines no longer apply to them.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Done | Self::Abandoned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub priority: u8,
    pub status: TaskStatus,
    pub deadline: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Display-time urgency marker. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineFlag {
    Overdue,
    Soon,
}

impl DeadlineFlag {
    pub fn label(self) -> &'static str {
        match self {
            Self::Overdue => "OVERDUE",
            Self::Soon => "SOON",
        }
    }
}

impl Task {
    /// Classify this task's deadline against `now`.
    ///
    /// A deadline exactly at `now` is already due. The soon window closes
    /// `SOON_WINDOW` after `now`, inclusive. Closed tasks and tasks without
    /// a deadline carry no flag.
    pub fn deadline_flag(&self, now: OffsetDateTime) -> Option<DeadlineFlag> {
        if !self.status.is_open() {
            return None;
        }

        let deadline = self.deadline?;
        if deadline <= now {
            Some(DeadlineFlag::Overdue)
        } else if deadline <= now + SOON_WINDOW {
            Some(DeadlineFlag::Soon)
        } else {
            None
        }
    }
}

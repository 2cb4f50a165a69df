use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tasktrack", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasktrack add "Buy milk" --priority 2
    /// Example: tasktrack add "File taxes" --priority 5 --deadline 2026-04-15
    Add {
        title: Option<String>,
        /// Priority from 1 (lowest) to 5 (highest)
        #[arg(short = 'p', long)]
        priority: u8,
        /// Deadline as RFC3339 or YYYY-MM-DD (midnight)
        #[arg(short = 'd', long)]
        deadline: Option<String>,
    },
    /// List tasks with optional filters and sorting
    ///
    /// Example: tasktrack list --status new --sort deadline
    /// Example: tasktrack list --min-priority 4
    List {
        /// Keep only tasks with this status
        #[arg(long)]
        status: Option<String>,
        /// Keep only tasks with exactly this priority
        #[arg(long, conflicts_with = "min_priority")]
        priority: Option<u8>,
        /// Keep only tasks with at least this priority
        #[arg(long)]
        min_priority: Option<u8>,
        /// Sort order
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
    },
    /// Change a task's status
    ///
    /// Example: tasktrack update-status 1 in_progress
    UpdateStatus {
        id: u64,
        status: String,
    },
    /// Change a task's priority
    ///
    /// Example: tasktrack update-priority 1 5
    UpdatePriority {
        id: u64,
        priority: u8,
    },
    /// Set or clear a task's deadline
    ///
    /// Example: tasktrack update-deadline 1 2026-04-15
    /// Example: tasktrack update-deadline 1 --clear
    UpdateDeadline {
        id: u64,
        deadline: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Delete a task
    ///
    /// Example: tasktrack delete 1
    Delete {
        id: u64,
    },
    /// Show details of a task
    ///
    /// Example: tasktrack show 1
    Show {
        id: u64,
    },
    /// Show collection statistics
    ///
    /// Example: tasktrack stats
    Stats,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Earliest deadline first, tasks without a deadline last
    Deadline,
    /// Highest priority first
    Priority,
}

use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasktrack_cli::cli::{Cli, Command, SortOrder};
use tasktrack_core::error::AppError;
use tasktrack_core::model::{DeadlineFlag, Task, TaskStatus};
use tasktrack_core::task_api::{
    self, ListFilter, PriorityFilter, SortKey, Statistics, TaskView,
};
use time::OffsetDateTime;

#[derive(Tabled)]
struct TaskRow {
    id: u64,
    title: String,
    priority: u8,
    status: &'static str,
    deadline: String,
}

fn deadline_cell(task: &Task, flag: Option<DeadlineFlag>) -> String {
    match task.deadline {
        Some(deadline) => {
            let formatted = task_api::format_timestamp(deadline);
            match flag {
                Some(flag) => format!("{} [{}]", formatted, flag.label()),
                None => formatted,
            }
        }
        None => "-".to_string(),
    }
}

fn print_views_table(views: &[TaskView]) {
    if views.is_empty() {
        println!("No tasks found.");
        return;
    }

    let rows: Vec<TaskRow> = views
        .iter()
        .map(|view| TaskRow {
            id: view.task.id,
            title: view.task.title.clone(),
            priority: view.task.priority,
            status: view.task.status.label(),
            deadline: deadline_cell(&view.task, view.flag),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "priority": task.priority,
        "status": task.status.label(),
        "deadline": task.deadline.map(task_api::format_timestamp),
        "created_at": task_api::format_timestamp(task.created_at),
    })
}

fn print_views_json(views: &[TaskView]) {
    let payload: Vec<serde_json::Value> = views
        .iter()
        .map(|view| {
            let mut value = task_json(&view.task);
            value["flag"] = match view.flag {
                Some(flag) => serde_json::Value::String(flag.label().to_string()),
                None => serde_json::Value::Null,
            };
            value
        })
        .collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn print_task_json(task: &Task) {
    println!("{}", task_json(task));
}

fn print_task_details(task: &Task) {
    let flag = task.deadline_flag(OffsetDateTime::now_utc());
    println!("id:       {}", task.id);
    println!("title:    {}", task.title);
    println!("priority: {}", task.priority);
    println!("status:   {}", task.status.label());
    println!("deadline: {}", deadline_cell(task, flag));
    println!("created:  {}", task_api::format_timestamp(task.created_at));
}

fn print_stats_plain(stats: &Statistics) {
    if stats.total == 0 {
        println!("No tasks.");
        return;
    }

    println!("--- Statistics ---");
    println!("Total tasks: {}", stats.total);
    println!("By status:");
    for entry in &stats.by_status {
        println!(
            "  {:<12} {} ({}%)",
            entry.status.label(),
            entry.count,
            entry.percentage
        );
    }
    println!("By priority:");
    for entry in &stats.by_priority {
        println!("  priority {}   {}", entry.priority, entry.count);
    }
    if !stats.overdue.is_empty() {
        println!("Overdue tasks: {}", stats.overdue.len());
        for task in &stats.overdue {
            println!("  - {}", task.title);
        }
    }
}

fn print_stats_json(stats: &Statistics) {
    let by_status: Vec<serde_json::Value> = stats
        .by_status
        .iter()
        .map(|entry| {
            serde_json::json!({
                "status": entry.status.label(),
                "count": entry.count,
                "percentage": entry.percentage,
            })
        })
        .collect();
    let by_priority: Vec<serde_json::Value> = stats
        .by_priority
        .iter()
        .map(|entry| {
            serde_json::json!({
                "priority": entry.priority,
                "count": entry.count,
            })
        })
        .collect();
    let overdue: Vec<serde_json::Value> = stats.overdue.iter().map(task_json).collect();

    println!(
        "{}",
        serde_json::json!({
            "total": stats.total,
            "by_status": by_status,
            "by_priority": by_priority,
            "overdue": overdue,
        })
    );
}

fn parse_status(raw: &str) -> Result<TaskStatus, AppError> {
    TaskStatus::parse(raw).ok_or_else(|| {
        AppError::validation(format!(
            "unknown status '{}', expected one of: new, in_progress, done, abandoned",
            raw.trim()
        ))
    })
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::validation(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::validation("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Add {
            title,
            priority,
            deadline,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::validation("title is required")),
            };
            let deadline = match deadline {
                Some(raw) => Some(task_api::parse_deadline(&raw)?),
                None => None,
            };

            let task = task_api::add_task(&title, priority, deadline)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!(
                    "Added task: {} (id {}, priority {})",
                    task.title, task.id, task.priority
                );
            }
        }
        Command::List {
            status,
            priority,
            min_priority,
            sort,
        } => {
            let status = match status {
                Some(raw) => Some(parse_status(&raw)?),
                None => None,
            };
            let priority = match (priority, min_priority) {
                (Some(value), _) => Some(PriorityFilter::Exact(value)),
                (None, Some(value)) => Some(PriorityFilter::AtLeast(value)),
                (None, None) => None,
            };
            let sort = sort.map(|order| match order {
                SortOrder::Deadline => SortKey::DeadlineAsc,
                SortOrder::Priority => SortKey::PriorityDesc,
            });

            let views = task_api::list_tasks(ListFilter { status, priority }, sort)?;
            if cli.json {
                print_views_json(&views);
            } else {
                print_views_table(&views);
            }
        }
        Command::UpdateStatus { id, status } => {
            let status = parse_status(&status)?;
            let task = task_api::update_status(id, status)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!(
                    "Updated task {}: status is now {}",
                    task.id,
                    task.status.label()
                );
            }
        }
        Command::UpdatePriority { id, priority } => {
            let task = task_api::update_priority(id, priority)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!(
                    "Updated task {}: priority is now {}",
                    task.id, task.priority
                );
            }
        }
        Command::UpdateDeadline {
            id,
            deadline,
            clear,
        } => {
            let deadline = if clear {
                if deadline.is_some() {
                    return Err(AppError::validation(
                        "cannot combine a deadline with --clear",
                    ));
                }
                None
            } else {
                let raw =
                    deadline.ok_or_else(|| AppError::validation("deadline is required"))?;
                Some(task_api::parse_deadline(&raw)?)
            };

            let task = task_api::update_deadline(id, deadline)?;
            if cli.json {
                print_task_json(&task);
            } else {
                match task.deadline {
                    Some(value) => println!(
                        "Updated task {}: deadline is now {}",
                        task.id,
                        task_api::format_timestamp(value)
                    ),
                    None => println!("Updated task {}: deadline cleared", task.id),
                }
            }
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Deleted task: {} (id {})", task.title, task.id);
            }
        }
        Command::Show { id } => {
            let task = task_api::get_task(id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                print_task_details(&task);
            }
        }
        Command::Stats => {
            let stats = task_api::stats()?;
            if cli.json {
                print_stats_json(&stats);
            } else {
                print_stats_plain(&stats);
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::storage(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasktrack".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if err.use_stderr() {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                std::process::exit(1);
            }
            // --help and --version render to stdout and exit zero.
            err.exit()
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

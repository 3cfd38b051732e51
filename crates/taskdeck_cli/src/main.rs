mod cli;

use clap::Parser;
use cli::{Cli, Command};
use tabled::{Table, Tabled};
use taskdeck_core::config::{self, Palette};
use taskdeck_core::error::AppError;
use taskdeck_core::model::{Deadline, Task, TaskPayload};
use taskdeck_core::tracker::{MutationOutcome, Tracker};
use taskdeck_core::view::{self, Query, SortKey, SortOrder};
use tracing_subscriber::EnvFilter;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "No")]
    no: u32,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Assigned To")]
    assigned_to: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

fn deadline_color(palette: &Palette, deadline: Deadline) -> &'static str {
    match deadline {
        Deadline::Done | Deadline::OnTime(_) => palette.ok,
        Deadline::DueToday | Deadline::NearDeadline(_) => palette.warn,
        Deadline::Overdue(_) => palette.danger,
    }
}

fn status_cell(palette: &Palette, task: &Task) -> String {
    let deadline = task.deadline();
    palette.wrap(deadline_color(palette, deadline), &deadline.label())
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "no": task.no,
        "task": task.task,
        "platform": task.platform,
        "format": task.format,
        "assignedTo": task.assigned_to,
        "dueDate": task.due_date,
        "dateLeft": task.date_left,
        "inProgress": task.in_progress,
        "reference": task.reference,
        "result": task.result,
        "notes": task.notes,
        "status": task.deadline().label(),
    })
}

fn print_tasks_table(tasks: &[Task], palette: &Palette) {
    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            no: task.no,
            task: task.task.clone(),
            platform: task.platform.clone(),
            format: task.format.clone(),
            assigned_to: task.assigned_to.clone(),
            due: or_dash(&task.due_date).to_string(),
            status: status_cell(palette, task),
            progress: task.in_progress.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn print_tasks_json(tasks: &[Task]) {
    let payload: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn print_task_detail(task: &Task, palette: &Palette) {
    println!("Task #{}", task.no);
    println!("  Task:        {}", or_dash(&task.task));
    println!("  Platform:    {}", or_dash(&task.platform));
    println!("  Format:      {}", or_dash(&task.format));
    println!("  Assigned To: {}", or_dash(&task.assigned_to));
    println!("  Due:         {}", or_dash(&task.due_date));
    println!("  Status:      {}", status_cell(palette, task));
    println!("  Progress:    {}", or_dash(&task.in_progress));
    println!("  Reference:   {}", or_dash(&task.reference));
    println!("  Result:      {}", or_dash(&task.result));
    println!("  Notes:       {}", or_dash(&task.notes));
}

fn build_query(
    search: Option<String>,
    platform: Option<String>,
    format: Option<String>,
    assigned_to: Option<String>,
    progress: Option<String>,
    sort: Option<String>,
    order: Option<String>,
) -> Result<Query, AppError> {
    let sort_by = match sort.as_deref() {
        Some(raw) => SortKey::parse(raw)
            .ok_or_else(|| AppError::invalid_input(format!("unknown sort key '{raw}'")))?,
        None => SortKey::default(),
    };
    let order = match order.as_deref() {
        Some(raw) => SortOrder::parse(raw)
            .ok_or_else(|| AppError::invalid_input(format!("unknown sort order '{raw}'")))?,
        None => SortOrder::default(),
    };

    Ok(Query {
        search: search.unwrap_or_default(),
        platform: platform.unwrap_or_default(),
        format: format.unwrap_or_default(),
        assigned_to: assigned_to.unwrap_or_default(),
        progress: progress.unwrap_or_default(),
        sort_by,
        order,
    })
}

fn report_mutation(summary: &str, outcome: &MutationOutcome, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "message": summary,
                "tasks": outcome.tasks.len(),
            })
        );
    } else {
        println!("{summary}");
    }

    if let Some(err) = outcome.reload_error.as_ref() {
        eprintln!("WARNING: saved, but the refresh failed: {err}");
    }
}

fn load_tasks(tracker: &Tracker, refresh: bool) -> Result<Option<Vec<Task>>, AppError> {
    Ok(tracker.load(refresh)?.into_tasks())
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        eprintln!("WARNING: {err}");
    }
    let palette = config::palette_for_theme(loaded.config.theme.as_deref());
    let tracker = Tracker::from_config(&loaded.config)?;

    match cli.command {
        Command::List {
            search,
            platform,
            format,
            assigned_to,
            progress,
            sort,
            order,
            refresh,
        } => {
            let query = build_query(search, platform, format, assigned_to, progress, sort, order)?;
            let Some(tasks) = load_tasks(&tracker, refresh)? else {
                println!("A refresh is already in progress; try again shortly.");
                return Ok(());
            };

            let tasks = view::compute_view(&tasks, &query);
            if cli.json {
                print_tasks_json(&tasks);
            } else if tasks.is_empty() {
                if query.has_filters() {
                    println!("No tasks match the current filters.");
                } else {
                    println!("No tasks.");
                }
            } else {
                print_tasks_table(&tasks, &palette);
            }
        }
        Command::Show { no } => {
            let task = tracker.get_task(no)?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                print_task_detail(&task, &palette);
            }
        }
        Command::Add {
            task,
            platform,
            format,
            assigned_to,
            due,
            progress,
            reference,
            result,
            notes,
        } => {
            let payload = TaskPayload {
                task: task.unwrap_or_default(),
                platform,
                format,
                assigned_to,
                due_date: due,
                in_progress: progress,
                reference,
                result,
                notes,
            };

            let outcome = tracker.add_task(&payload)?;
            report_mutation(&format!("Added task: {}", payload.task), &outcome, cli.json);
        }
        Command::Edit {
            no,
            task,
            platform,
            format,
            assigned_to,
            due,
            progress,
            reference,
            result,
            notes,
        } => {
            let current = tracker.get_task(no)?;
            let mut payload = TaskPayload::from(&current);
            if let Some(value) = task {
                payload.task = value;
            }
            if let Some(value) = platform {
                payload.platform = value;
            }
            if let Some(value) = format {
                payload.format = value;
            }
            if let Some(value) = assigned_to {
                payload.assigned_to = value;
            }
            if let Some(value) = due {
                payload.due_date = value;
            }
            if let Some(value) = progress {
                payload.in_progress = value;
            }
            if let Some(value) = reference {
                payload.reference = value;
            }
            if let Some(value) = result {
                payload.result = value;
            }
            if let Some(value) = notes {
                payload.notes = value;
            }

            let outcome = tracker.edit_task(no, &payload)?;
            report_mutation(&format!("Updated task {no}"), &outcome, cli.json);
        }
        Command::Delete { no } => {
            let outcome = tracker.remove_task(no)?;
            report_mutation(&format!("Deleted task {no}"), &outcome, cli.json);
        }
        Command::Stats { refresh } => {
            let Some(tasks) = load_tasks(&tracker, refresh)? else {
                println!("A refresh is already in progress; try again shortly.");
                return Ok(());
            };

            let stats = view::summarize(&tasks);
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total": stats.total,
                        "onTime": stats.on_time,
                        "nearDeadline": stats.near_deadline,
                        "overdue": stats.overdue,
                    })
                );
            } else {
                println!("Total:         {}", stats.total);
                println!(
                    "On time:       {}",
                    palette.wrap(palette.ok, &stats.on_time.to_string())
                );
                println!(
                    "Near deadline: {}",
                    palette.wrap(palette.warn, &stats.near_deadline.to_string())
                );
                println!(
                    "Overdue:       {}",
                    palette.wrap(palette.danger, &stats.overdue.to_string())
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

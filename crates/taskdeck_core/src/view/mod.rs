use crate::model::{Deadline, Task, parse_due_date};
use std::cmp::Ordering;
use time::Date;
use time::macros::date;

// Rows without a parseable due date sort before every real date.
const DUE_DATE_EPOCH: Date = date!(1900 - 01 - 01);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    No,
    Task,
    DueDate,
    InProgress,
    Platform,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        // camelCase wire spellings normalize with no separator
        match canonical_key(raw).as_str() {
            "no" => Some(Self::No),
            "task" => Some(Self::Task),
            "due" | "duedate" | "due_date" => Some(Self::DueDate),
            "inprogress" | "in_progress" | "progress" | "status" => Some(Self::InProgress),
            "platform" => Some(Self::Platform),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_key(raw).as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }
}

fn canonical_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

/// Search/filter/sort parameters for one derived view. Empty strings mean
/// "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub platform: String,
    pub format: String,
    pub assigned_to: String,
    pub progress: String,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

impl Query {
    /// Whether any search or filter is active. An empty view with active
    /// filters means "no match", not "no tasks".
    pub fn has_filters(&self) -> bool {
        [
            &self.search,
            &self.platform,
            &self.format,
            &self.assigned_to,
            &self.progress,
        ]
        .iter()
        .any(|value| !value.trim().is_empty())
    }
}

/// Derives the ordered view for a query. Pure: the input collection is never
/// mutated, and an empty result is returned as-is.
pub fn compute_view(tasks: &[Task], query: &Query) -> Vec<Task> {
    let mut view: Vec<Task> = tasks
        .iter()
        .filter(|task| matches_query(task, query))
        .cloned()
        .collect();

    view.sort_by(|a, b| {
        let ordering = compare_by(a, b, query.sort_by);
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    view
}

fn matches_query(task: &Task, query: &Query) -> bool {
    let search = query.search.trim().to_lowercase();
    if !search.is_empty() && !searchable_text(task).contains(&search) {
        return false;
    }

    for (field, filter) in [
        (&task.platform, &query.platform),
        (&task.format, &query.format),
        (&task.assigned_to, &query.assigned_to),
    ] {
        if !filter.trim().is_empty() && !contains_ci(field, filter.trim()) {
            return false;
        }
    }

    let progress = query.progress.trim();
    if !progress.is_empty() && !task.in_progress.trim().eq_ignore_ascii_case(progress) {
        return false;
    }

    true
}

fn searchable_text(task: &Task) -> String {
    [
        &task.task,
        &task.platform,
        &task.format,
        &task.assigned_to,
        &task.in_progress,
        &task.reference,
        &task.result,
        &task.notes,
    ]
    .map(String::as_str)
    .join(" ")
    .to_lowercase()
}

fn contains_ci(field: &str, filter: &str) -> bool {
    field.to_lowercase().contains(&filter.to_lowercase())
}

fn compare_by(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::No => a.no.cmp(&b.no),
        SortKey::Task => a.task.to_lowercase().cmp(&b.task.to_lowercase()),
        SortKey::DueDate => due_date_key(a).cmp(&due_date_key(b)),
        SortKey::InProgress => a.in_progress.to_lowercase().cmp(&b.in_progress.to_lowercase()),
        SortKey::Platform => a.platform.to_lowercase().cmp(&b.platform.to_lowercase()),
    }
}

fn due_date_key(task: &Task) -> Date {
    parse_due_date(&task.due_date).unwrap_or(DUE_DATE_EPOCH)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub on_time: usize,
    pub near_deadline: usize,
    pub overdue: usize,
}

/// Deadline counts for a collection. "Done" counts as on-time whatever its
/// `date_left` says.
pub fn summarize(tasks: &[Task]) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };

    for task in tasks {
        match task.deadline() {
            Deadline::Done => stats.on_time += 1,
            Deadline::Overdue(_) => stats.overdue += 1,
            Deadline::DueToday | Deadline::NearDeadline(_) => {
                stats.on_time += 1;
                stats.near_deadline += 1;
            }
            Deadline::OnTime(_) => stats.on_time += 1,
        }
    }

    stats
}

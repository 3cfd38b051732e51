use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

/// Tasks due within this many days count as near-deadline.
pub const NEAR_DEADLINE_DAYS: i64 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    #[serde(deserialize_with = "de_loose_u32")]
    pub no: u32,
    pub task: String,
    pub platform: String,
    pub format: String,
    pub assigned_to: String,
    pub due_date: String,
    #[serde(deserialize_with = "de_loose_i64")]
    pub date_left: i64,
    pub in_progress: String,
    pub reference: String,
    pub result: String,
    pub notes: String,
}

impl Task {
    /// Spreadsheet rows with no content in any identifying column are
    /// placeholders, not tasks.
    pub fn is_blank(&self) -> bool {
        [
            &self.task,
            &self.platform,
            &self.format,
            &self.assigned_to,
            &self.due_date,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }

    pub fn is_done(&self) -> bool {
        self.in_progress.trim().eq_ignore_ascii_case("done")
    }

    pub fn deadline(&self) -> Deadline {
        classify_deadline(self.date_left, &self.in_progress)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskPayload {
    pub task: String,
    pub platform: String,
    pub format: String,
    pub assigned_to: String,
    pub due_date: String,
    pub in_progress: String,
    pub reference: String,
    pub result: String,
    pub notes: String,
}

impl From<&Task> for TaskPayload {
    fn from(task: &Task) -> Self {
        Self {
            task: task.task.clone(),
            platform: task.platform.clone(),
            format: task.format.clone(),
            assigned_to: task.assigned_to.clone(),
            due_date: task.due_date.clone(),
            in_progress: task.in_progress.clone(),
            reference: task.reference.clone(),
            result: task.result.clone(),
            notes: task.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Done,
    Overdue(i64),
    DueToday,
    NearDeadline(i64),
    OnTime(i64),
}

impl Deadline {
    pub fn label(&self) -> String {
        match self {
            Self::Done => "done".to_string(),
            Self::Overdue(days) => format!("{days}d overdue"),
            Self::DueToday => "due today".to_string(),
            Self::NearDeadline(days) | Self::OnTime(days) => format!("{days}d left"),
        }
    }
}

/// `date_left` is computed by the remote store; a terminal "Done" label
/// overrides it regardless of sign.
pub fn classify_deadline(date_left: i64, in_progress: &str) -> Deadline {
    if in_progress.trim().eq_ignore_ascii_case("done") {
        return Deadline::Done;
    }

    if date_left < 0 {
        Deadline::Overdue(-date_left)
    } else if date_left == 0 {
        Deadline::DueToday
    } else if date_left <= NEAR_DEADLINE_DAYS {
        Deadline::NearDeadline(date_left)
    } else {
        Deadline::OnTime(date_left)
    }
}

/// Accepts a plain calendar date, with or without a trailing time component
/// (the spreadsheet backend emits both).
pub fn parse_due_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    let date_part: String = trimmed.chars().take(10).collect();
    Date::parse(&date_part, format_description!("[year]-[month]-[day]")).ok()
}

fn de_loose_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(loose_int(&value)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0))
}

fn de_loose_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(loose_int(&value).unwrap_or(0))
}

// Spreadsheet cells arrive as numbers or numeric strings depending on the
// column formatting.
fn loose_int(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

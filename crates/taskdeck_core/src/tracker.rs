use crate::cache::{LoadOutcome, TaskCache, cache_path};
use crate::config::Config;
use crate::error::{AppError, FieldError};
use crate::gateway::{HttpGateway, TaskGateway};
use crate::model::{Task, TaskPayload, parse_due_date};
use serde_json::Value;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    Success,
    Rejected(String),
    Ambiguous,
}

/// How a mutation response is read. The remote store is loose about success
/// shapes: an `error` field rejects, any of `message` / `success` / `id`
/// confirms, and anything else counts as success by default.
pub fn classify_response(raw: &Value) -> ResponseKind {
    if let Some(err) = raw.get("error") {
        let message = match err {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        return ResponseKind::Rejected(message);
    }

    let confirmed = ["message", "success", "id"]
        .iter()
        .any(|key| raw.get(*key).is_some_and(|value| !value.is_null()));
    if confirmed {
        ResponseKind::Success
    } else {
        ResponseKind::Ambiguous
    }
}

pub fn local_today() -> Date {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset).date()
}

/// Field-level checks applied before any network call. `platform` and
/// `format` may stay empty; the due date is compared at day granularity.
pub fn validate_payload(payload: &TaskPayload, today: Date) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let required = [
        ("task", payload.task.as_str()),
        ("assignedTo", payload.assigned_to.as_str()),
        ("dueDate", payload.due_date.as_str()),
        ("inProgress", payload.in_progress.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(FieldError::new(field, format!("{field} is required")));
        }
    }

    if !payload.due_date.trim().is_empty() {
        match parse_due_date(&payload.due_date) {
            Some(due) if due < today => {
                errors.push(FieldError::new("dueDate", "due date cannot be in the past"));
            }
            Some(_) => {}
            None => errors.push(FieldError::new(
                "dueDate",
                "due date must be a calendar date (YYYY-MM-DD)",
            )),
        }
    }

    errors
}

#[derive(Debug)]
pub struct MutationOutcome {
    /// The working set after the forced reload; empty when the reload failed.
    pub tasks: Vec<Task>,
    /// The response carried no success marker and was accepted by default.
    pub ambiguous: bool,
    /// The mutation went through but the follow-up reload did not.
    pub reload_error: Option<AppError>,
}

/// Owns the gateway and the cache; every task operation goes through here.
pub struct Tracker {
    gateway: Box<dyn TaskGateway>,
    cache: TaskCache,
}

impl Tracker {
    pub fn new(gateway: Box<dyn TaskGateway>, cache: TaskCache) -> Self {
        Self { gateway, cache }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let base_url = config
            .api_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input("api_base_url is not configured"))?;

        let gateway = HttpGateway::new(base_url, config.request_timeout())?;
        let cache = TaskCache::with_store(config.cache_ttl_ms, cache_path()?);
        Ok(Self::new(Box::new(gateway), cache))
    }

    pub fn load(&self, force: bool) -> Result<LoadOutcome, AppError> {
        self.cache.load(self.gateway.as_ref(), force)
    }

    pub fn get_task(&self, no: u32) -> Result<Task, AppError> {
        self.gateway.get(no)
    }

    pub fn add_task(&self, payload: &TaskPayload) -> Result<MutationOutcome, AppError> {
        self.check(payload)?;
        let raw = self.gateway.create(payload)?;
        self.finish(raw)
    }

    pub fn edit_task(&self, no: u32, payload: &TaskPayload) -> Result<MutationOutcome, AppError> {
        self.check(payload)?;
        let raw = self.gateway.update(no, payload)?;
        self.finish(raw)
    }

    pub fn remove_task(&self, no: u32) -> Result<MutationOutcome, AppError> {
        let raw = self.gateway.delete(no)?;
        self.finish(raw)
    }

    fn check(&self, payload: &TaskPayload) -> Result<(), AppError> {
        let errors = validate_payload(payload, local_today());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(errors))
        }
    }

    fn finish(&self, raw: Value) -> Result<MutationOutcome, AppError> {
        match classify_response(&raw) {
            ResponseKind::Rejected(message) => Err(AppError::mutation_rejected(message)),
            kind => {
                let ambiguous = kind == ResponseKind::Ambiguous;
                if ambiguous {
                    warn!("mutation response carried no success marker, assuming success");
                }
                self.cache.invalidate();
                match self.load(true) {
                    Ok(outcome) => Ok(MutationOutcome {
                        tasks: outcome.into_tasks().unwrap_or_default(),
                        ambiguous,
                        reload_error: None,
                    }),
                    Err(err) => Ok(MutationOutcome {
                        tasks: Vec::new(),
                        ambiguous,
                        reload_error: Some(err),
                    }),
                }
            }
        }
    }
}

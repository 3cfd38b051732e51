use super::{PendingCalls, TaskGateway, next_token};
use crate::error::AppError;
use crate::model::{Task, TaskPayload};
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;

/// Gateway to the spreadsheet web-app endpoint. Every verb is one GET with an
/// `action` parameter, a unique correlation token, and a `_ts` cache-buster;
/// the endpoint answers with JSON.
#[derive(Debug)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::blocking::Client,
    pending: PendingCalls,
}

impl HttpGateway {
    /// A hung remote call blocks its caller until `timeout` elapses; `None`
    /// disables the guard entirely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, AppError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("base url is required"));
        }

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| AppError::transport(err.to_string()))?;

        Ok(Self {
            base_url: trimmed.to_string(),
            client,
            pending: PendingCalls::default(),
        })
    }

    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    fn call(&self, action: &str, params: &[(&str, String)]) -> Result<Value, AppError> {
        let token = next_token();
        let _guard = self.pending.track(&token);

        let ts = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string();
        let mut query: Vec<(&str, &str)> = vec![("action", action), ("token", &token), ("_ts", &ts)];
        for (key, value) in params {
            query.push((*key, value.as_str()));
        }

        debug!(action, token = %token, "calling remote task store");
        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .map_err(|err| AppError::transport(format!("{action}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transport(format!(
                "{action} failed with status {status}"
            )));
        }

        response
            .json::<Value>()
            .map_err(|err| AppError::transport(format!("{action} returned an undecodable body: {err}")))
    }

    fn encode(payload: &TaskPayload) -> Result<String, AppError> {
        serde_json::to_string(payload).map_err(|err| AppError::invalid_data(err.to_string()))
    }
}

fn remote_error(value: &Value) -> Option<String> {
    value.get("error").map(|err| match err {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    })
}

impl TaskGateway for HttpGateway {
    fn list(&self) -> Result<Vec<Task>, AppError> {
        let value = self.call("getTasks", &[])?;
        if let Some(message) = remote_error(&value) {
            return Err(AppError::load_failed(message));
        }
        serde_json::from_value(value)
            .map_err(|err| AppError::invalid_data(format!("task list: {err}")))
    }

    fn get(&self, no: u32) -> Result<Task, AppError> {
        let value = self.call("getTask", &[("id", no.to_string())])?;
        if let Some(message) = remote_error(&value) {
            return Err(AppError::load_failed(message));
        }
        serde_json::from_value(value)
            .map_err(|err| AppError::invalid_data(format!("task record: {err}")))
    }

    fn create(&self, payload: &TaskPayload) -> Result<Value, AppError> {
        let data = Self::encode(payload)?;
        self.call("createTask", &[("data", data)])
    }

    fn update(&self, no: u32, payload: &TaskPayload) -> Result<Value, AppError> {
        let data = Self::encode(payload)?;
        self.call("updateTask", &[("id", no.to_string()), ("data", data)])
    }

    fn delete(&self, no: u32) -> Result<Value, AppError> {
        self.call("deleteTask", &[("id", no.to_string())])
    }
}

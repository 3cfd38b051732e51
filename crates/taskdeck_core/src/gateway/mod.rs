use crate::error::AppError;
use crate::model::{Task, TaskPayload};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

mod http;
pub use http::HttpGateway;

/// One call per verb against the remote task store. Read verbs return typed
/// records; mutation verbs return the raw response for the orchestrator to
/// classify.
pub trait TaskGateway: Send + Sync {
    fn list(&self) -> Result<Vec<Task>, AppError>;
    fn get(&self, no: u32) -> Result<Task, AppError>;
    fn create(&self, payload: &TaskPayload) -> Result<Value, AppError>;
    fn update(&self, no: u32, payload: &TaskPayload) -> Result<Value, AppError>;
    fn delete(&self, no: u32) -> Result<Value, AppError>;
}

pub fn next_token() -> String {
    format!("cb_{}", uuid::Uuid::new_v4().simple())
}

/// Correlation tokens for calls currently in flight. A token is registered
/// when the call is issued and released when the guard drops, on the success
/// and failure paths alike.
#[derive(Debug, Default)]
pub struct PendingCalls {
    tokens: Mutex<HashSet<String>>,
}

impl PendingCalls {
    pub fn track(&self, token: &str) -> CallGuard<'_> {
        self.lock().insert(token.to_string());
        CallGuard {
            pending: self,
            token: token.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // a poisoned set only means a call died mid-flight; the tokens are
        // still consistent
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct CallGuard<'a> {
    pending: &'a PendingCalls,
    token: String,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.token);
    }
}

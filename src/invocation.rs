//! Invocation Context
//!
//! The payload an external usage tracker attaches to each command run. Only
//! the shape is built here; delivery, buffering and user identification
//! belong to the tracker.
//!
//! One invocation produces a `start` context and later either an `end` or an
//! `invalid` context. All of them share the same `invocation_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connection::Connection;
use crate::credentials::AdapterCredentials;
use crate::registry::AdapterPlugin;

/// Environment variable naming where the command runs (CI, scheduler, ...)
pub const INVOCATION_ENV_VAR: &str = "ADAPTERHUB_INVOCATION_ENV";

const DEFAULT_ENVIRONMENT: &str = "manual";

/// Anything that can name the adapter it belongs to
pub trait AdapterTyped {
    fn adapter_type(&self) -> &str;
}

impl AdapterTyped for Connection {
    fn adapter_type(&self) -> &str {
        self.conn_type()
    }
}

impl AdapterTyped for AdapterCredentials {
    fn adapter_type(&self) -> &str {
        self.type_name()
    }
}

impl AdapterTyped for AdapterPlugin {
    fn adapter_type(&self) -> &str {
        self.name()
    }
}

/// Adapter label for a tracking event; `None` when there is nothing to label
#[must_use]
pub fn adapter_type(source: Option<&dyn AdapterTyped>) -> Option<String> {
    source.map(|s| s.adapter_type().to_string())
}

/// Invocation environment label, `manual` when unset or empty
#[must_use]
pub fn invocation_environment() -> String {
    environment_or_default(std::env::var(INVOCATION_ENV_VAR).ok())
}

fn environment_or_default(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Phase of the invocation an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    Start,
    End,
    Invalid,
}

/// Invocation event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub command: String,
    pub version: String,
    pub run_type: String,
    pub adapter_type: Option<String>,
    pub environment: String,
    pub progress: Progress,
    pub result_type: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl InvocationContext {
    /// Context for the beginning of a command
    #[must_use]
    pub fn start(command: impl Into<String>, source: Option<&dyn AdapterTyped>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            command: command.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_type: "regular".to_string(),
            adapter_type: adapter_type(source),
            environment: invocation_environment(),
            progress: Progress::Start,
            result_type: None,
            started_at: Utc::now(),
        }
    }

    /// Context for a command that ran to completion
    #[must_use]
    pub fn end(&self, result_type: impl Into<String>) -> Self {
        self.finished(Progress::End, result_type.into())
    }

    /// Context for a command rejected before it could run
    #[must_use]
    pub fn invalid(&self, result_type: impl Into<String>) -> Self {
        self.finished(Progress::Invalid, result_type.into())
    }

    fn finished(&self, progress: Progress, result_type: String) -> Self {
        Self { progress, result_type: Some(result_type), ..self.clone() }
    }
}

//! JSON Output Envelope Types
//!
//! Every `adapterhub` command prints exactly one envelope on stdout.
//!
//! # Output Contract
//! - Success: `{"ok": true, "adapter": "...", "command": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "adapter": "...", "command": "...", "error": {"code": "...", "message": "...", "context": [...]}}`
//!
//! `data` never carries credential values outside a variant's display
//! allow-list, and error messages never carry credential values at all.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AdapterError;
use crate::invocation::InvocationContext;

/// Success envelope for command results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Adapter the command ran against (empty when not adapter-specific)
    pub adapter: String,

    /// Command that was executed (debug, plugins)
    pub command: String,

    pub data: T,

    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(adapter: impl Into<String>, command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, adapter: adapter.into(), command: command.into(), data, meta }
    }
}

/// Error envelope for command failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    pub adapter: String,

    pub command: String,

    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    pub fn from_error(
        adapter: impl Into<String>,
        command: impl Into<String>,
        err: &AdapterError,
    ) -> Self {
        Self { ok: false, adapter: adapter.into(), command: command.into(), error: err.into() }
    }
}

/// Error body: stable code, message, and the names a caller can act on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "VALIDATION_ERROR", "DEPENDENCY_CYCLE")
    pub code: String,

    pub message: String,

    /// Offending field names, the cycle path, or the adapter and its missing
    /// dependency
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl From<&AdapterError> for ErrorInfo {
    fn from(err: &AdapterError) -> Self {
        let context = match err {
            AdapterError::Validation { fields, .. } => fields.clone(),
            AdapterError::DependencyCycle { cycle } => cycle.clone(),
            AdapterError::UnknownDependency { adapter, dependency } => {
                vec![adapter.clone(), dependency.clone()]
            }
            AdapterError::Conflict { name } | AdapterError::NotFound { name } => vec![name.clone()],
            _ => Vec::new(),
        };

        Self { code: err.error_code().to_string(), message: err.message(), context }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    pub invocation_id: Uuid,

    /// Where the command ran (`manual`, `ci`, ...)
    pub environment: String,
}

impl Metadata {
    #[must_use]
    pub fn for_invocation(invocation: &InvocationContext, execution_ms: u64) -> Self {
        Self {
            execution_ms,
            invocation_id: invocation.invocation_id,
            environment: invocation.environment.clone(),
        }
    }
}

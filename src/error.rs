//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Adapterhub.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - `Schema`: Identifier syntax or type-discriminator mismatch
//! - `Validation`: Missing or malformed credential fields
//! - `Config`: Unreadable project descriptor or raw configuration
//! - `Conflict`: Duplicate adapter registration
//! - `DependencyCycle` / `UnknownDependency`: Registry resolution failures
//! - `NotFound`: Lookup of an adapter that was never registered
//! - `State`: Illegal connection lifecycle transition
//! - `ConnectionFailed`: Native handle acquisition or release failed
//! - `InvalidInput`: Malformed CLI-level input
//!
//! Nothing in this crate retries. Every error carries the adapter name, field
//! names, or cycle path needed to act on it, and never a secret value.

use thiserror::Error;

/// Main error type for Adapterhub operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Identifier or type discriminator rejected
    #[error("Schema error: {0}")]
    Schema(String),

    /// Credential fields missing or of the wrong shape
    #[error("Validation failed for '{adapter}' credentials: {detail}")]
    Validation {
        adapter: String,
        /// Offending field names
        fields: Vec<String>,
        detail: String,
    },

    /// Configuration error (descriptor not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Adapter name registered twice
    #[error("Adapter '{name}' is already registered")]
    Conflict { name: String },

    /// Dependency graph is not acyclic
    #[error("Dependency cycle detected: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    /// Dependency on an adapter that was never registered
    #[error("Adapter '{adapter}' depends on unregistered adapter '{dependency}'")]
    UnknownDependency { adapter: String, dependency: String },

    /// Adapter lookup failed
    #[error("Adapter '{name}' is not registered")]
    NotFound { name: String },

    /// Illegal connection state transition
    #[error("Cannot {operation} a connection in state '{state}'")]
    State { state: String, operation: String },

    /// Native handle acquisition or release failed
    #[error("Connection failed ({adapter}): {detail}")]
    ConnectionFailed { adapter: String, detail: String },

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AdapterError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Conflict { .. } => "CONFLICT",
            Self::DependencyCycle { .. } => "DEPENDENCY_CYCLE",
            Self::UnknownDependency { .. } => "UNKNOWN_DEPENDENCY",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::State { .. } => "STATE_ERROR",
            Self::ConnectionFailed { .. } => "CONNECTION_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Get human-readable error message
    ///
    /// Safe to include in JSON output: credential values are never formatted
    /// into any variant.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a validation error naming the offending fields
    pub fn validation(
        adapter: impl Into<String>,
        fields: Vec<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Validation { adapter: adapter.into(), fields, detail: detail.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a duplicate registration error
    pub fn conflict(name: impl Into<String>) -> Self {
        Self::Conflict { name: name.into() }
    }

    /// Create a not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an illegal transition error
    pub fn state(state: impl std::fmt::Display, operation: impl Into<String>) -> Self {
        Self::State { state: state.to_string(), operation: operation.into() }
    }

    /// Create a connection failed error
    pub fn connection_failed(adapter: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ConnectionFailed { adapter: adapter.into(), detail: detail.into() }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result type alias for Adapterhub operations
pub type Result<T> = std::result::Result<T, AdapterError>;

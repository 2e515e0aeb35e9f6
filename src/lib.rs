//! Adapterhub - Database Adapter Registry and Connection Lifecycle
//!
//! Adapterhub lets a host application support many interchangeable database
//! backends (adapters) through one contract. It records which adapters exist
//! and in which order they load, validates backend-specific credentials, and
//! tracks the lifecycle of per-session connections.
//!
//! # Core Principles
//! - Identifiers are checked at construction, never later
//! - Credentials are immutable; display goes through an explicit allow-list
//! - Connection transitions are explicit and terminal states are final
//! - The registry is built once and then shared read-only
//!
//! Wire I/O belongs to the [`Adapter`] implementations. This crate never
//! schedules, retries, or times out a native call.
//!
//! # Module Organization
//! - [`identifier`] - Adapter/connection type name syntax
//! - [`credentials`] - Credentials contract and built-in variants
//! - [`connection`] - Adapter trait and connection state machine
//! - [`engine`] - Built-in adapters (feature-gated)
//! - [`project`] - Project descriptor loading
//! - [`registry`] - Adapter plugin registry and load order
//! - [`config`] - Raw configuration ingestion
//! - [`invocation`] - Invocation context for usage tracking
//! - [`output`] - JSON output envelope types
//! - [`error`] - Error types and handling
//! - [`logging`] - Subscriber setup for the binary

pub mod config;
pub mod connection;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod invocation;
pub mod logging;
pub mod output;
pub mod project;
pub mod registry;

// Re-export commonly used types for convenience
pub use config::{apply_overrides, load_raw_config, parse_raw_config, RawConfig, StoredCredentials};
pub use connection::{Adapter, Connection, ConnectionState, Handle};
pub use credentials::{
    AdapterCredentials, Credentials, CredentialsKind, MySqlCredentials, PostgresCredentials,
    SqliteCredentials,
};
pub use engine::{builtin_adapter, builtin_adapters};
pub use error::{AdapterError, Result};
pub use identifier::{is_valid_identifier, Identifier};
pub use invocation::{adapter_type, AdapterTyped, InvocationContext, Progress};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use project::{FsProjectLoader, ProjectLoader};
pub use registry::{dependency_order, AdapterPlugin, AdapterRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        assert!(is_valid_identifier("postgres"));
        assert_eq!(CredentialsKind::Sqlite.as_str(), "sqlite");
        assert_eq!(ConnectionState::Init.as_str(), "init");
        assert!(AdapterRegistry::new().is_empty());
    }
}

//! Built-in Adapters
//!
//! Each built-in adapter implements [`Adapter`] for one credentials variant by
//! acquiring a native driver handle. Nothing else is done here: queries,
//! pooling, and retries belong to the code that uses the handle.
//!
//! # Engine Isolation
//! Each engine implementation is completely independent and gated behind its
//! own cargo feature.

use std::sync::Arc;

use crate::connection::Adapter;
use crate::credentials::{AdapterCredentials, CredentialsKind};
use crate::error::AdapterError;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

/// The built-in adapter for a credentials variant, if its engine is compiled in
#[must_use]
pub fn builtin_adapter(kind: CredentialsKind) -> Option<Arc<dyn Adapter>> {
    match kind {
        #[cfg(feature = "postgres")]
        CredentialsKind::Postgres => Some(Arc::new(postgres::PostgresAdapter)),
        #[cfg(feature = "mysql")]
        CredentialsKind::MySql => Some(Arc::new(mysql::MySqlAdapter)),
        #[cfg(feature = "sqlite")]
        CredentialsKind::Sqlite => Some(Arc::new(sqlite::SqliteAdapter)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// All compiled-in built-in adapters
#[must_use]
pub fn builtin_adapters() -> Vec<Arc<dyn Adapter>> {
    CredentialsKind::ALL.into_iter().filter_map(builtin_adapter).collect()
}

/// Error for credentials handed to the wrong engine
#[allow(dead_code)]
pub(crate) fn wrong_credentials(expected: CredentialsKind, got: &AdapterCredentials) -> AdapterError {
    AdapterError::schema(format!(
        "Expected {expected} credentials, got {}",
        got.type_name()
    ))
}

/// Error for a handle that was not produced by this engine
#[allow(dead_code)]
pub(crate) fn foreign_handle(engine: CredentialsKind) -> AdapterError {
    AdapterError::connection_failed(engine.as_str(), "handle was not produced by this adapter")
}

//! `SQLite` Adapter
//!
//! Opens a `rusqlite::Connection` for [`SqliteCredentials`].
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver, no async needed)
//! - `read_only` maps to `SQLITE_OPEN_READ_ONLY`; otherwise the file is
//!   created if missing
//! - `:memory:` opens a private in-memory database

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};

use crate::connection::{Adapter, Handle};
use crate::credentials::{AdapterCredentials, Credentials, CredentialsKind, SqliteCredentials};
use crate::engine::{foreign_handle, wrong_credentials};
use crate::error::{AdapterError, Result};

/// `SQLite` adapter implementation
///
/// The handle type is [`rusqlite::Connection`].
pub struct SqliteAdapter;

#[async_trait]
impl Adapter for SqliteAdapter {
    fn adapter_type(&self) -> &str {
        SqliteCredentials::TYPE
    }

    async fn acquire(&self, credentials: &AdapterCredentials) -> Result<Handle> {
        let AdapterCredentials::Sqlite(creds) = credentials else {
            return Err(wrong_credentials(CredentialsKind::Sqlite, credentials));
        };

        let conn = open_connection(&creds.path, creds.read_only)?;
        Ok(Box::new(conn))
    }

    async fn release(&self, handle: Handle) -> Result<()> {
        let conn = handle
            .downcast::<Connection>()
            .map_err(|_| foreign_handle(CredentialsKind::Sqlite))?;

        (*conn).close().map_err(|(_, e)| {
            AdapterError::connection_failed("sqlite", format!("Failed to close SQLite database: {e}"))
        })
    }
}

/// Open `SQLite` connection with appropriate flags
fn open_connection(path: &str, read_only: bool) -> Result<Connection> {
    let flags = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
    };

    Connection::open_with_flags(path, flags).map_err(|e| {
        AdapterError::connection_failed("sqlite", format!("Failed to open SQLite database: {e}"))
    })
}

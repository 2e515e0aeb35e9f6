//! `SQLite` credentials variant

use serde::{Deserialize, Serialize};

use super::Credentials;

/// Credentials for the built-in `sqlite` adapter
///
/// `SQLite` has no server, user, or password. `database` and `schema` are
/// logical names (normally `main`); `path` locates the file, or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteCredentials {
    pub database: String,

    pub schema: String,

    /// Database file path (alias: `file`)
    pub path: String,

    /// Open the file read-only
    #[serde(default)]
    pub read_only: bool,
}

impl Credentials for SqliteCredentials {
    const TYPE: &'static str = "sqlite";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("file", "path")];
    const REQUIRED_FIELDS: &'static [&'static str] = &["path"];
    const OPTIONAL_FIELDS: &'static [&'static str] = &["read_only"];
    const CONNECTION_KEYS: &'static [&'static str] = &["database", "schema", "path", "read_only"];

    fn database(&self) -> &str {
        &self.database
    }

    fn schema(&self) -> &str {
        &self.schema
    }
}

impl SqliteCredentials {
    /// Credentials for an in-memory database
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database: "main".to_string(),
            schema: "main".to_string(),
            path: ":memory:".to_string(),
            read_only: false,
        }
    }
}

//! `PostgreSQL` credentials variant

use serde::{Deserialize, Serialize};

use super::Credentials;

const fn default_port() -> u16 {
    5432
}

const fn default_connect_timeout() -> u32 {
    10
}

/// Credentials for the built-in `postgres` adapter
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresCredentials {
    /// Database name (alias: `dbname`)
    pub database: String,

    /// Default schema for relations created by the host
    pub schema: String,

    pub host: String,

    pub user: String,

    /// WARNING: Sensitive data, never part of `connection_info` or `Debug` output
    pub password: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,

    /// TCP keepalive idle time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalives_idle: Option<u32>,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<String>,
}

impl Credentials for PostgresCredentials {
    const TYPE: &'static str = "postgres";
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("dbname", "database"), ("pass", "password")];
    const REQUIRED_FIELDS: &'static [&'static str] = &["host", "user", "password"];
    const OPTIONAL_FIELDS: &'static [&'static str] =
        &["port", "search_path", "keepalives_idle", "connect_timeout", "sslmode"];
    const CONNECTION_KEYS: &'static [&'static str] =
        &["host", "port", "user", "database", "schema", "search_path", "keepalives_idle", "sslmode"];

    fn database(&self) -> &str {
        &self.database
    }

    fn schema(&self) -> &str {
        &self.schema
    }
}

impl std::fmt::Debug for PostgresCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCredentials")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("search_path", &self.search_path)
            .field("keepalives_idle", &self.keepalives_idle)
            .field("connect_timeout", &self.connect_timeout)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

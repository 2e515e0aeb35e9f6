//! `MySQL` credentials variant
//!
//! `MySQL` has no schema/database distinction; profiles conventionally set both
//! to the same value, and the adapter connects to `database`.

use serde::{Deserialize, Serialize};

use super::Credentials;

const fn default_port() -> u16 {
    3306
}

/// Credentials for the built-in `mysql` adapter
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MySqlCredentials {
    pub database: String,

    pub schema: String,

    pub host: String,

    /// Login user (alias: `username`)
    pub user: String,

    /// WARNING: Sensitive data, never part of `connection_info` or `Debug` output
    pub password: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
}

impl Credentials for MySqlCredentials {
    const TYPE: &'static str = "mysql";
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("username", "user"), ("pass", "password")];
    const REQUIRED_FIELDS: &'static [&'static str] = &["host", "user", "password"];
    const OPTIONAL_FIELDS: &'static [&'static str] = &["port", "charset"];
    const CONNECTION_KEYS: &'static [&'static str] =
        &["host", "port", "user", "database", "schema", "charset"];

    fn database(&self) -> &str {
        &self.database
    }

    fn schema(&self) -> &str {
        &self.schema
    }
}

impl std::fmt::Debug for MySqlCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlCredentials")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("charset", &self.charset)
            .finish()
    }
}

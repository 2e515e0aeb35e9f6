//! `PostgreSQL` Adapter
//!
//! Opens a `tokio_postgres::Client` for [`PostgresCredentials`].
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - The connection future is driven by a spawned task owned by the handle
//! - `search_path` is applied through the startup `options` parameter
//! - TLS is not negotiated here (`NoTls`); `sslmode=require` will therefore
//!   fail at connect time

use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, Config, NoTls};
use tracing::warn;

use crate::connection::{Adapter, Handle};
use crate::credentials::{AdapterCredentials, Credentials, CredentialsKind, PostgresCredentials};
use crate::engine::{foreign_handle, wrong_credentials};
use crate::error::{AdapterError, Result};

/// `PostgreSQL` adapter implementation
pub struct PostgresAdapter;

/// Native handle produced by [`PostgresAdapter`]
pub struct PostgresHandle {
    pub client: Client,
    driver: JoinHandle<()>,
}

#[async_trait]
impl Adapter for PostgresAdapter {
    fn adapter_type(&self) -> &str {
        PostgresCredentials::TYPE
    }

    async fn acquire(&self, credentials: &AdapterCredentials) -> Result<Handle> {
        let AdapterCredentials::Postgres(creds) = credentials else {
            return Err(wrong_credentials(CredentialsKind::Postgres, credentials));
        };

        let pg_config = build_pg_config(creds)?;

        let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
            AdapterError::connection_failed("postgres", format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Spawn connection handler
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection terminated with error");
            }
        });

        Ok(Box::new(PostgresHandle { client, driver }))
    }

    async fn release(&self, handle: Handle) -> Result<()> {
        let handle = handle
            .downcast::<PostgresHandle>()
            .map_err(|_| foreign_handle(CredentialsKind::Postgres))?;
        let PostgresHandle { client, driver } = *handle;

        // Dropping the client ends the connection future
        drop(client);
        driver.await.map_err(|e| {
            AdapterError::connection_failed("postgres", format!("Connection task failed: {e}"))
        })
    }
}

/// Build `PostgreSQL` connection config from credentials
fn build_pg_config(creds: &PostgresCredentials) -> Result<Config> {
    let mut pg_config = Config::new();
    pg_config
        .host(&creds.host)
        .port(creds.port)
        .user(&creds.user)
        .password(&creds.password)
        .dbname(&creds.database)
        .connect_timeout(Duration::from_secs(u64::from(creds.connect_timeout)));

    if let Some(idle) = creds.keepalives_idle {
        pg_config.keepalives_idle(Duration::from_secs(u64::from(idle)));
    }

    if let Some(search_path) = &creds.search_path {
        pg_config.options(&format!("-c search_path={}", escape_option_value(search_path)));
    }

    if let Some(mode) = &creds.sslmode {
        pg_config.ssl_mode(parse_ssl_mode(mode)?);
    }

    Ok(pg_config)
}

/// Escape a value for the startup `options` string
///
/// The server splits `options` on whitespace; a backslash keeps the next
/// character literal.
fn escape_option_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_ssl_mode(mode: &str) -> Result<SslMode> {
    match mode {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(AdapterError::validation(
            "postgres",
            vec!["sslmode".to_string()],
            format!("unsupported sslmode '{other}' (expected disable, prefer, or require)"),
        )),
    }
}

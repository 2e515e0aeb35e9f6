//! MySQL Adapter
//!
//! Opens a `mysql_async::Conn` for [`MySqlCredentials`] (MySQL and MariaDB).
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver, requires tokio runtime)
//! - `charset` is applied with `SET NAMES` right after connecting
//! - Release performs a graceful `COM_QUIT` via `disconnect`

use async_trait::async_trait;
use mysql_async::{Conn, OptsBuilder};

use crate::connection::{Adapter, Handle};
use crate::credentials::{AdapterCredentials, Credentials, CredentialsKind, MySqlCredentials};
use crate::engine::{foreign_handle, wrong_credentials};
use crate::error::{AdapterError, Result};
use crate::identifier::is_valid_identifier;

/// MySQL adapter implementation
///
/// The handle type is [`mysql_async::Conn`].
pub struct MySqlAdapter;

#[async_trait]
impl Adapter for MySqlAdapter {
    fn adapter_type(&self) -> &str {
        MySqlCredentials::TYPE
    }

    async fn acquire(&self, credentials: &AdapterCredentials) -> Result<Handle> {
        let AdapterCredentials::MySql(creds) = credentials else {
            return Err(wrong_credentials(CredentialsKind::MySql, credentials));
        };

        let conn = Conn::new(build_mysql_opts(creds)?).await.map_err(|e| {
            AdapterError::connection_failed("mysql", format!("Failed to connect to MySQL: {e}"))
        })?;

        Ok(Box::new(conn))
    }

    async fn release(&self, handle: Handle) -> Result<()> {
        let conn = handle
            .downcast::<Conn>()
            .map_err(|_| foreign_handle(CredentialsKind::MySql))?;

        (*conn).disconnect().await.map_err(|e| {
            AdapterError::connection_failed("mysql", format!("Failed to disconnect from MySQL: {e}"))
        })
    }
}

/// Build MySQL connection options from credentials
fn build_mysql_opts(creds: &MySqlCredentials) -> Result<OptsBuilder> {
    let opts = OptsBuilder::default()
        .ip_or_hostname(creds.host.clone())
        .tcp_port(creds.port)
        .user(Some(creds.user.clone()))
        .pass(Some(creds.password.clone()))
        .db_name(Some(creds.database.clone()));

    match &creds.charset {
        // Interpolated into SQL, so only a bare name is accepted
        Some(charset) if !is_valid_identifier(charset) => Err(AdapterError::validation(
            "mysql",
            vec!["charset".to_string()],
            "charset must be a bare character set name such as utf8mb4",
        )),
        Some(charset) => Ok(opts.init(vec![format!("SET NAMES {charset}")])),
        None => Ok(opts),
    }
}

//! Connection Lifecycle
//!
//! A [`Connection`] wraps validated credentials and, while OPEN, an opaque
//! native handle acquired through an [`Adapter`].
//!
//! ```text
//! INIT --open()--------> OPEN --close()------> CLOSED
//!   |       (acquire err)  |  \--mark_failed()-> FAIL
//!   \--mark_failed()-------+-------------------> FAIL
//! ```
//!
//! CLOSED and FAIL are terminal. A connection is never reopened; build a new
//! one instead.
//!
//! # Invariants
//! - `handle` is present only while the state is OPEN
//! - `transaction_open` is false whenever the state is not OPEN
//! - `credentials` and `handle` never appear in the serialized form
//!
//! A connection has a single owner. The host serializes calls on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::credentials::AdapterCredentials;
use crate::error::{AdapterError, Result};
use crate::identifier::Identifier;

/// Opaque native resource (driver session, socket, file handle)
pub type Handle = Box<dyn Any + Send>;

/// A backend implementation able to open and release native handles
///
/// Implementations own all wire I/O, blocking, and timeout policy. The
/// lifecycle only decides when a handle may be acquired or released.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Adapter type name; must match the credentials it accepts
    fn adapter_type(&self) -> &str;

    /// Acquire a native handle for the given credentials
    ///
    /// On error nothing may be left allocated.
    async fn acquire(&self, credentials: &AdapterCredentials) -> Result<Handle>;

    /// Release a handle previously returned by [`Adapter::acquire`]
    ///
    /// The handle is consumed whether or not release succeeds.
    async fn release(&self, handle: Handle) -> Result<()> {
        drop(handle);
        Ok(())
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Init,
    Open,
    Closed,
    Fail,
}

impl ConnectionState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Fail => "fail",
        }
    }

    /// CLOSED and FAIL accept no further transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Fail)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-session connection to the active backend
///
/// Serializes as `{"type", "name", "state", "transaction_open"}` only.
#[derive(Serialize)]
pub struct Connection {
    #[serde(rename = "type")]
    conn_type: Identifier,

    name: Option<String>,

    #[serde(skip)]
    credentials: AdapterCredentials,

    state: ConnectionState,

    transaction_open: bool,

    #[serde(skip)]
    handle: Option<Handle>,

    /// Adapter that produced `handle`; retained for release
    #[serde(skip)]
    adapter: Option<Arc<dyn Adapter>>,

    #[serde(skip)]
    failure: Option<String>,
}

impl Connection {
    /// Create a connection in state INIT
    ///
    /// `conn_type` must be a valid identifier equal to the credentials type.
    pub fn new(
        conn_type: impl Into<String>,
        name: Option<String>,
        credentials: AdapterCredentials,
    ) -> Result<Self> {
        let conn_type = Identifier::new(conn_type)?;
        if conn_type != credentials.type_name() {
            return Err(AdapterError::schema(format!(
                "connection type '{conn_type}' does not match credentials type '{}'",
                credentials.type_name()
            )));
        }

        Ok(Self {
            conn_type,
            name,
            credentials,
            state: ConnectionState::Init,
            transaction_open: false,
            handle: None,
            adapter: None,
            failure: None,
        })
    }

    #[must_use]
    pub fn conn_type(&self) -> &str {
        self.conn_type.as_str()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn credentials(&self) -> &AdapterCredentials {
        &self.credentials
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, ConnectionState::Open)
    }

    #[must_use]
    pub const fn transaction_open(&self) -> bool {
        self.transaction_open
    }

    /// Reason recorded when the connection entered FAIL
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The native handle, present only while OPEN
    #[must_use]
    pub fn handle(&self) -> Option<&(dyn Any + Send)> {
        self.handle.as_deref()
    }

    /// The native handle downcast to the driver's concrete type
    #[must_use]
    pub fn handle_as<T: Any>(&self) -> Option<&T> {
        self.handle.as_ref().and_then(|h| h.downcast_ref::<T>())
    }

    /// Mutable access to the native handle as the driver's concrete type
    pub fn handle_as_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.handle.as_mut().and_then(|h| h.downcast_mut::<T>())
    }

    /// INIT → OPEN, or INIT → FAIL when acquisition fails
    pub async fn open(&mut self, adapter: Arc<dyn Adapter>) -> Result<()> {
        self.expect_state(ConnectionState::Init, "open")?;

        if adapter.adapter_type() != self.conn_type.as_str() {
            return Err(AdapterError::schema(format!(
                "adapter '{}' cannot open a '{}' connection",
                adapter.adapter_type(),
                self.conn_type
            )));
        }

        match adapter.acquire(&self.credentials).await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.adapter = Some(adapter);
                self.state = ConnectionState::Open;
                debug!(adapter = %self.conn_type, name = ?self.name, "connection opened");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Fail;
                self.failure = Some(e.to_string());
                debug!(adapter = %self.conn_type, name = ?self.name, "connection failed to open");
                Err(e)
            }
        }
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.expect_state(ConnectionState::Open, "begin a transaction on")?;
        if self.transaction_open {
            return Err(AdapterError::state(
                self.state,
                "begin a transaction while one is already open on",
            ));
        }
        self.transaction_open = true;
        Ok(())
    }

    pub fn end_transaction(&mut self) -> Result<()> {
        self.expect_state(ConnectionState::Open, "end a transaction on")?;
        if !self.transaction_open {
            return Err(AdapterError::state(
                self.state,
                "end a transaction when none is open on",
            ));
        }
        self.transaction_open = false;
        Ok(())
    }

    /// OPEN → CLOSED, releasing the handle
    ///
    /// The connection is CLOSED even if the adapter reports a release error;
    /// that error is returned afterwards.
    pub async fn close(&mut self) -> Result<()> {
        self.expect_state(ConnectionState::Open, "close")?;

        self.state = ConnectionState::Closed;
        self.transaction_open = false;
        let handle = self.handle.take();
        let adapter = self.adapter.take();
        debug!(adapter = %self.conn_type, name = ?self.name, "connection closed");

        match (adapter, handle) {
            (Some(adapter), Some(handle)) => adapter.release(handle).await,
            _ => Ok(()),
        }
    }

    /// INIT/OPEN → FAIL, recording `reason`
    ///
    /// An open handle is released on a best-effort basis; a release error is
    /// logged and never replaces the recorded reason.
    pub async fn mark_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        if self.state.is_terminal() {
            return Err(AdapterError::state(self.state, "mark failed"));
        }

        let reason = reason.into();
        self.state = ConnectionState::Fail;
        self.transaction_open = false;
        self.failure = Some(reason.clone());
        let handle = self.handle.take();
        let adapter = self.adapter.take();

        if let (Some(adapter), Some(handle)) = (adapter, handle) {
            if let Err(e) = adapter.release(handle).await {
                warn!(adapter = %self.conn_type, error = %e, "failed to release handle of failed connection");
            }
        }

        debug!(adapter = %self.conn_type, name = ?self.name, reason = %reason, "connection marked failed");
        Ok(())
    }

    fn expect_state(&self, expected: ConnectionState, operation: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(AdapterError::state(self.state, operation))
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("type", &self.conn_type)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("transaction_open", &self.transaction_open)
            .field("handle", &self.handle.is_some())
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

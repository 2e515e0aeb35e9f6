//! Connection Lifecycle Tests
//!
//! Drives the state machine through a recording adapter:
//! - legal transitions and the handle/transaction invariants
//! - terminal states reject every operation
//! - handles are released exactly once on every exit path

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;

use adapterhub::{
    Adapter, AdapterCredentials, AdapterError, Connection, ConnectionState, Handle, Result,
    SqliteCredentials,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Handle type handed out by [`RecordingAdapter`]
#[derive(Debug, PartialEq)]
struct FakeSession(usize);

#[derive(Default)]
struct RecordingAdapter {
    acquired: AtomicUsize,
    released: AtomicUsize,
    fail_acquire: bool,
    fail_release: bool,
}

impl RecordingAdapter {
    fn failing_acquire() -> Self {
        Self { fail_acquire: true, ..Self::default() }
    }

    fn failing_release() -> Self {
        Self { fail_release: true, ..Self::default() }
    }

    fn counts(&self) -> (usize, usize) {
        (self.acquired.load(Ordering::SeqCst), self.released.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    fn adapter_type(&self) -> &str {
        "sqlite"
    }

    async fn acquire(&self, _credentials: &AdapterCredentials) -> Result<Handle> {
        if self.fail_acquire {
            return Err(AdapterError::connection_failed("sqlite", "database is locked"));
        }
        let id = self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession(id)))
    }

    async fn release(&self, handle: Handle) -> Result<()> {
        assert!(handle.downcast_ref::<FakeSession>().is_some());
        self.released.fetch_add(1, Ordering::SeqCst);
        if self.fail_release {
            return Err(AdapterError::connection_failed("sqlite", "release failed"));
        }
        Ok(())
    }
}

struct WrongTypeAdapter;

#[async_trait]
impl Adapter for WrongTypeAdapter {
    fn adapter_type(&self) -> &str {
        "postgres"
    }

    async fn acquire(&self, _credentials: &AdapterCredentials) -> Result<Handle> {
        Ok(Box::new(()))
    }
}

fn new_connection() -> Connection {
    Connection::new("sqlite", Some("session_1".into()), SqliteCredentials::in_memory().into())
        .unwrap()
}

async fn open_connection(adapter: &Arc<RecordingAdapter>) -> Connection {
    let mut conn = new_connection();
    conn.open(adapter.clone()).await.unwrap();
    conn
}

fn assert_state_error(result: Result<()>) {
    match result {
        Err(AdapterError::State { .. }) => {}
        other => panic!("expected state error, got {other:?}"),
    }
}

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_open_transaction_close() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut conn = open_connection(&adapter).await;

    assert_eq!(conn.state(), ConnectionState::Open);
    assert!(conn.is_open());
    assert_eq!(conn.handle_as::<FakeSession>(), Some(&FakeSession(0)));

    conn.begin_transaction().unwrap();
    assert!(conn.transaction_open());
    conn.end_transaction().unwrap();
    assert!(!conn.transaction_open());

    conn.begin_transaction().unwrap();
    conn.close().await.unwrap();

    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(!conn.transaction_open());
    assert!(conn.handle().is_none());
    assert_eq!(adapter.counts(), (1, 1));
}

#[tokio::test]
async fn test_serialized_form_tracks_state() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut conn = open_connection(&adapter).await;
    conn.begin_transaction().unwrap();

    assert_eq!(
        serde_json::to_value(&conn).unwrap(),
        json!({"type": "sqlite", "name": "session_1", "state": "open", "transaction_open": true})
    );
}

// ============================================================================
// Failure Paths
// ============================================================================

#[tokio::test]
async fn test_failed_open_moves_to_fail_without_handle() {
    let adapter = Arc::new(RecordingAdapter::failing_acquire());
    let mut conn = new_connection();

    let err = conn.open(adapter.clone()).await.unwrap_err();
    assert_eq!(err.error_code(), "CONNECTION_FAILED");
    assert_eq!(conn.state(), ConnectionState::Fail);
    assert!(conn.handle().is_none());
    assert!(conn.failure().unwrap().contains("database is locked"));
    assert_eq!(adapter.counts(), (0, 0));
}

#[tokio::test]
async fn test_mark_failed_from_init() {
    let mut conn = new_connection();
    conn.mark_failed("profile rejected").await.unwrap();

    assert_eq!(conn.state(), ConnectionState::Fail);
    assert_eq!(conn.failure(), Some("profile rejected"));
    assert!(conn.handle().is_none());
}

#[tokio::test]
async fn test_mark_failed_from_open_releases_handle() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut conn = open_connection(&adapter).await;
    conn.begin_transaction().unwrap();

    conn.mark_failed("server went away").await.unwrap();

    assert_eq!(conn.state(), ConnectionState::Fail);
    assert!(!conn.transaction_open());
    assert!(conn.handle().is_none());
    assert_eq!(adapter.counts(), (1, 1));
}

#[tokio::test]
async fn test_mark_failed_keeps_reason_when_release_fails() {
    let adapter = Arc::new(RecordingAdapter::failing_release());
    let mut conn = open_connection(&adapter).await;

    conn.mark_failed("server went away").await.unwrap();

    assert_eq!(conn.state(), ConnectionState::Fail);
    assert_eq!(conn.failure(), Some("server went away"));
    assert_eq!(adapter.counts(), (1, 1));
}

#[tokio::test]
async fn test_close_reports_release_error_but_still_closes() {
    let adapter = Arc::new(RecordingAdapter::failing_release());
    let mut conn = open_connection(&adapter).await;

    let err = conn.close().await.unwrap_err();
    assert_eq!(err.error_code(), "CONNECTION_FAILED");
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(conn.handle().is_none());
    assert_state_error(conn.close().await);
    assert_eq!(adapter.counts(), (1, 1));
}

#[tokio::test]
async fn test_adapter_type_mismatch_leaves_init() {
    let mut conn = new_connection();
    let err = conn.open(Arc::new(WrongTypeAdapter)).await.unwrap_err();

    assert_eq!(err.error_code(), "SCHEMA_ERROR");
    assert_eq!(conn.state(), ConnectionState::Init);
}

// ============================================================================
// Illegal Transitions
// ============================================================================

#[tokio::test]
async fn test_init_only_allows_open_and_mark_failed() {
    let mut conn = new_connection();
    assert_state_error(conn.begin_transaction());
    assert_state_error(conn.end_transaction());
    assert_state_error(conn.close().await);
    assert_eq!(conn.state(), ConnectionState::Init);
}

#[tokio::test]
async fn test_double_begin_is_state_error() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut conn = open_connection(&adapter).await;

    conn.begin_transaction().unwrap();
    assert_state_error(conn.begin_transaction());
    assert!(conn.transaction_open());
}

#[tokio::test]
async fn test_end_without_begin_is_state_error() {
    let adapter = Arc::new(RecordingAdapter::default());
    let mut conn = open_connection(&adapter).await;
    assert_state_error(conn.end_transaction());
}

#[tokio::test]
async fn test_terminal_states_reject_everything() {
    let adapter = Arc::new(RecordingAdapter::default());

    let mut closed = open_connection(&adapter).await;
    closed.close().await.unwrap();

    let mut failed = new_connection();
    failed.mark_failed("boom").await.unwrap();

    for conn in [&mut closed, &mut failed] {
        let terminal = conn.state();
        assert_state_error(conn.open(adapter.clone()).await);
        assert_state_error(conn.begin_transaction());
        assert_state_error(conn.end_transaction());
        assert_state_error(conn.close().await);
        assert_state_error(conn.mark_failed("again").await);
        assert_eq!(conn.state(), terminal);
    }

    assert_eq!(adapter.counts(), (1, 1));
}

// ============================================================================
// Built-in Engine
// ============================================================================

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_engine_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lifecycle.db");
    let raw = adapterhub::parse_raw_config(&format!(
        r#"{{"type": "sqlite", "database": "main", "schema": "main", "file": {}}}"#,
        serde_json::to_string(path.to_str().unwrap()).unwrap()
    ))
    .unwrap();
    let creds = adapterhub::CredentialsKind::Sqlite.from_raw_config(&raw).unwrap();
    let engine = adapterhub::builtin_adapter(adapterhub::CredentialsKind::Sqlite).unwrap();

    let mut conn = Connection::new("sqlite", None, creds).unwrap();
    conn.open(engine).await.unwrap();
    {
        let native = conn.handle_as_mut::<rusqlite::Connection>().unwrap();
        native.execute("CREATE TABLE t (id INTEGER)", []).unwrap();
    }
    conn.close().await.unwrap();

    assert!(path.exists());
    assert_eq!(conn.state(), ConnectionState::Closed);
}

//! Registry Integration Tests
//!
//! Exercises the registry end to end with real project descriptors on disk:
//! - Registration reads `adapter_project.json` from each include path
//! - Load order is dependency-first with name tie-breaks
//! - Cycles, unknown dependencies, and duplicates are reported with context
//! - A finished registry can be shared across threads

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use adapterhub::project::PROJECT_FILE;
use adapterhub::{
    Adapter, AdapterCredentials, AdapterError, AdapterRegistry, AdapterTyped, Connection,
    ConnectionState, CredentialsKind, Handle, Result,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct StubAdapter(&'static str);

#[async_trait]
impl Adapter for StubAdapter {
    fn adapter_type(&self) -> &str {
        self.0
    }

    async fn acquire(&self, _credentials: &AdapterCredentials) -> Result<Handle> {
        Ok(Box::new(()))
    }
}

/// Plugin directories with descriptors, kept alive for the test
struct PluginTree {
    root: TempDir,
}

impl PluginTree {
    fn new() -> Self {
        Self { root: TempDir::new().unwrap() }
    }

    fn add(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(PROJECT_FILE),
            format!(r#"{{"name": "adapterhub_{name}", "version": "0.1.0"}}"#),
        )
        .unwrap();
        dir
    }

    fn empty(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

fn register(
    registry: &mut AdapterRegistry,
    kind: CredentialsKind,
    path: &Path,
    deps: &[&str],
) -> Result<()> {
    registry.register(kind.as_str(), Arc::new(StubAdapter(kind.as_str())), kind, path, deps)
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_project_name_resolved_at_registration() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Postgres, &tree.add("postgres"), &[]).unwrap();

    let plugin = registry.get("postgres").unwrap();
    assert_eq!(plugin.project_name(), "adapterhub_postgres");
    assert_eq!(plugin.adapter_type(), "postgres");
}

#[test]
fn test_missing_descriptor_is_config_error() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();

    let err =
        register(&mut registry, CredentialsKind::Postgres, &tree.empty("postgres"), &[]).unwrap_err();
    assert_eq!(err.error_code(), "CONFIG_ERROR");
    assert!(registry.get("postgres").is_err());
}

#[test]
fn test_duplicate_registration_leaves_first_intact() {
    let tree = PluginTree::new();
    let first = tree.add("first");
    let second = tree.add("second");

    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Postgres, &first, &[]).unwrap();
    let err = register(&mut registry, CredentialsKind::Postgres, &second, &[]).unwrap_err();

    assert!(matches!(err, AdapterError::Conflict { ref name } if name == "postgres"));
    let plugin = registry.get("postgres").unwrap();
    assert_eq!(plugin.include_path(), first.as_path());
    assert_eq!(plugin.project_name(), "adapterhub_first");
}

#[test]
fn test_credentials_variant_of_another_adapter_is_rejected() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();

    let err = registry
        .register(
            "redshift",
            Arc::new(StubAdapter("redshift")),
            CredentialsKind::Postgres,
            tree.add("redshift"),
            &[],
        )
        .unwrap_err();

    assert_eq!(err.error_code(), "SCHEMA_ERROR");
    assert!(registry.is_empty());
}

#[test]
fn test_names_are_sorted() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    for kind in [CredentialsKind::Sqlite, CredentialsKind::Postgres, CredentialsKind::MySql] {
        register(&mut registry, kind, &tree.add(kind.as_str()), &[]).unwrap();
    }

    assert_eq!(registry.names(), vec!["mysql", "postgres", "sqlite"]);
    assert_eq!(registry.len(), 3);
}

// ============================================================================
// Load Order
// ============================================================================

#[test]
fn test_chain_resolves_dependencies_first() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Postgres, &tree.add("pg"), &["mysql"]).unwrap();
    register(&mut registry, CredentialsKind::Sqlite, &tree.add("lite"), &[]).unwrap();
    register(&mut registry, CredentialsKind::MySql, &tree.add("my"), &["sqlite"]).unwrap();

    assert_eq!(registry.resolve_load_order().unwrap(), vec!["sqlite", "mysql", "postgres"]);
}

#[test]
fn test_dependency_first_even_when_name_sorts_later() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Sqlite, &tree.add("lite"), &[]).unwrap();
    register(&mut registry, CredentialsKind::MySql, &tree.add("my"), &["sqlite"]).unwrap();
    register(&mut registry, CredentialsKind::Postgres, &tree.add("pg"), &[]).unwrap();

    assert_eq!(registry.resolve_load_order().unwrap(), vec!["postgres", "sqlite", "mysql"]);
}

#[test]
fn test_load_order_is_reproducible() {
    let tree = PluginTree::new();
    let registration_orders = [
        [CredentialsKind::Sqlite, CredentialsKind::MySql, CredentialsKind::Postgres],
        [CredentialsKind::Postgres, CredentialsKind::Sqlite, CredentialsKind::MySql],
        [CredentialsKind::MySql, CredentialsKind::Postgres, CredentialsKind::Sqlite],
    ];

    let orders: Vec<Vec<String>> = registration_orders
        .into_iter()
        .map(|kinds| {
            let mut registry = AdapterRegistry::new();
            for kind in kinds {
                register(&mut registry, kind, &tree.add(kind.as_str()), &[]).unwrap();
            }
            registry.resolve_load_order().unwrap()
        })
        .collect();

    assert_eq!(orders[0], vec!["mysql", "postgres", "sqlite"]);
    assert!(orders.iter().all(|order| order == &orders[0]));
}

#[test]
fn test_cycle_is_named() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Postgres, &tree.add("pg"), &["mysql"]).unwrap();
    register(&mut registry, CredentialsKind::MySql, &tree.add("my"), &["postgres"]).unwrap();

    match registry.resolve_load_order().unwrap_err() {
        AdapterError::DependencyCycle { cycle } => {
            assert_eq!(cycle, vec!["mysql", "postgres", "mysql"]);
        }
        other => panic!("expected dependency cycle, got {other:?}"),
    }
}

#[test]
fn test_unknown_dependency_names_both_adapters() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Sqlite, &tree.add("lite"), &["missing_adapter"])
        .unwrap();

    let err = registry.finish().unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_DEPENDENCY");
    assert!(err.message().contains("'sqlite'"));
    assert!(err.message().contains("'missing_adapter'"));
}

// ============================================================================
// Frozen Registry
// ============================================================================

#[test]
fn test_finished_registry_is_shared_across_threads() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Sqlite, &tree.add("lite"), &[]).unwrap();
    register(&mut registry, CredentialsKind::MySql, &tree.add("my"), &["sqlite"]).unwrap();
    let registry = registry.finish().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.resolve_load_order().unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["sqlite", "mysql"]);
    }
}

#[test]
fn test_credentials_for_registered_adapter() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Postgres, &tree.add("pg"), &[]).unwrap();

    let raw = adapterhub::parse_raw_config(
        r#"{"database": "dev", "schema": "public", "host": "h", "user": "u", "pass": "p"}"#,
    )
    .unwrap();
    let creds = registry.credentials_for("postgres", &raw).unwrap();
    assert_eq!(creds.kind(), CredentialsKind::Postgres);

    let err = registry.credentials_for("unknown", &raw).unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_every_registered_plugin_can_open_a_connection() {
    let tree = PluginTree::new();
    let mut registry = AdapterRegistry::new();
    register(&mut registry, CredentialsKind::Postgres, &tree.add("pg"), &[]).unwrap();
    let registry = registry.finish().unwrap();

    let plugin = registry.get("postgres").unwrap();
    let raw = adapterhub::parse_raw_config(
        r#"{"database": "dev", "schema": "public", "host": "h", "user": "u", "password": "p"}"#,
    )
    .unwrap();
    let creds = registry.credentials_for(plugin.name(), &raw).unwrap();

    let mut conn = Connection::new(plugin.name(), None, creds).unwrap();
    conn.open(plugin.adapter()).await.unwrap();
    assert_eq!(conn.state(), ConnectionState::Open);
    conn.close().await.unwrap();
}

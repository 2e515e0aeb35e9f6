//! Adapter Plugin Registry
//!
//! Records which adapters exist, the credentials variant each requires, and
//! which other adapters each must be loaded after.
//!
//! # Lifecycle
//! 1. Discovery: the host calls [`AdapterRegistry::register`] once per plugin
//! 2. [`AdapterRegistry::finish`] validates the dependency graph and freezes
//!    the registry behind an `Arc`
//! 3. The frozen registry is read-only and shared freely between threads
//!
//! # Load Order
//! [`AdapterRegistry::resolve_load_order`] is a topological sort
//! ([`dependency_order`]) over the `dependencies` edges. Among plugins that are ready at the same time the
//! lexicographically smallest name goes first, so the order is reproducible.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::RawConfig;
use crate::connection::Adapter;
use crate::credentials::{AdapterCredentials, CredentialsKind};
use crate::error::{AdapterError, Result};
use crate::identifier::Identifier;
use crate::project::{FsProjectLoader, ProjectLoader};

/// One registered backend
///
/// Immutable once registered.
pub struct AdapterPlugin {
    name: Identifier,
    adapter: Arc<dyn Adapter>,
    credentials: CredentialsKind,
    include_path: PathBuf,
    project_name: String,
    dependencies: Vec<Identifier>,
}

impl AdapterPlugin {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Shared reference to the adapter implementation
    #[must_use]
    pub fn adapter(&self) -> Arc<dyn Adapter> {
        Arc::clone(&self.adapter)
    }

    /// Credentials variant this adapter requires
    #[must_use]
    pub const fn credentials(&self) -> CredentialsKind {
        self.credentials
    }

    #[must_use]
    pub fn include_path(&self) -> &Path {
        &self.include_path
    }

    /// Project name read from the include path at registration
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    #[must_use]
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(Identifier::as_str)
    }
}

impl std::fmt::Debug for AdapterPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterPlugin")
            .field("name", &self.name)
            .field("adapter_type", &self.adapter.adapter_type())
            .field("credentials", &self.credentials)
            .field("include_path", &self.include_path)
            .field("project_name", &self.project_name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Registry of adapter plugins, keyed by adapter name
pub struct AdapterRegistry {
    plugins: BTreeMap<String, AdapterPlugin>,
    loader: Box<dyn ProjectLoader>,
}

impl AdapterRegistry {
    /// Registry reading project descriptors from disk
    #[must_use]
    pub fn new() -> Self {
        Self::with_loader(Box::new(FsProjectLoader))
    }

    /// Registry with a custom project-descriptor loader
    #[must_use]
    pub fn with_loader(loader: Box<dyn ProjectLoader>) -> Self {
        Self { plugins: BTreeMap::new(), loader }
    }

    /// Register an adapter under `name`
    ///
    /// # Errors
    /// - `Schema`: `name` or a dependency is not a valid identifier, or the
    ///   adapter or credentials variant reports a different type than `name`
    /// - `Conflict`: `name` is already registered (the first registration is kept)
    /// - `Config`: `include_path` has no loadable project descriptor
    pub fn register(
        &mut self,
        name: &str,
        adapter: Arc<dyn Adapter>,
        credentials: CredentialsKind,
        include_path: impl Into<PathBuf>,
        dependencies: &[&str],
    ) -> Result<()> {
        let name = Identifier::new(name)?;

        let dependencies = dependencies
            .iter()
            .map(|dep| Identifier::new(*dep))
            .collect::<Result<Vec<_>>>()?;

        if adapter.adapter_type() != name.as_str() {
            return Err(AdapterError::schema(format!(
                "adapter registered as '{name}' reports type '{}'",
                adapter.adapter_type()
            )));
        }

        if credentials.as_str() != name.as_str() {
            return Err(AdapterError::schema(format!(
                "adapter '{name}' cannot be registered with '{credentials}' credentials"
            )));
        }

        if self.plugins.contains_key(name.as_str()) {
            return Err(AdapterError::conflict(name.as_str()));
        }

        let include_path = include_path.into();
        let project_name = self.loader.project_name(&include_path)?;

        debug!(
            adapter = %name,
            project = %project_name,
            credentials = %credentials,
            dependencies = dependencies.len(),
            "adapter registered"
        );

        self.plugins.insert(
            name.as_str().to_string(),
            AdapterPlugin { name, adapter, credentials, include_path, project_name, dependencies },
        );
        Ok(())
    }

    /// Look up a registered adapter
    pub fn get(&self, name: &str) -> Result<&AdapterPlugin> {
        self.plugins.get(name).ok_or_else(|| AdapterError::not_found(name))
    }

    /// Registered adapter names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Build credentials of the variant registered under `name`
    pub fn credentials_for(&self, name: &str, raw: &RawConfig) -> Result<AdapterCredentials> {
        self.get(name)?.credentials.from_raw_config(raw)
    }

    /// Dependency-ordered adapter names
    ///
    /// See [`dependency_order`] for the errors.
    pub fn resolve_load_order(&self) -> Result<Vec<String>> {
        let graph: BTreeMap<&str, Vec<&str>> = self
            .plugins
            .values()
            .map(|plugin| (plugin.name(), plugin.dependencies().collect()))
            .collect();

        let order = dependency_order(&graph)?;
        debug!(order = ?order, "resolved adapter load order");
        Ok(order)
    }

    /// Validate the dependency graph and freeze the registry for sharing
    pub fn finish(self) -> Result<Arc<Self>> {
        self.resolve_load_order()?;
        Ok(Arc::new(self))
    }
}

/// Topological order of `graph` (node -> the nodes it depends on)
///
/// Among nodes that are ready at the same time the lexicographically smallest
/// goes first.
///
/// # Errors
/// - `UnknownDependency`: a node depends on a name missing from the graph
/// - `DependencyCycle`: the graph has a cycle; the error carries it as a
///   closed path (`a -> b -> a`)
pub fn dependency_order(graph: &BTreeMap<&str, Vec<&str>>) -> Result<Vec<String>> {
    for (name, deps) in graph {
        if let Some(missing) = deps.iter().find(|dep| !graph.contains_key(*dep)) {
            return Err(AdapterError::UnknownDependency {
                adapter: (*name).to_string(),
                dependency: (*missing).to_string(),
            });
        }
    }

    let mut pending: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, deps) in graph {
        pending.insert(*name, deps.len());
        for dep in deps {
            dependents.entry(*dep).or_default().push(*name);
        }
    }

    let mut ready: BTreeSet<&str> =
        pending.iter().filter(|(_, count)| **count == 0).map(|(name, _)| *name).collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() < graph.len() {
        let unresolved: BTreeSet<&str> = pending
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name)
            .collect();
        return Err(AdapterError::DependencyCycle { cycle: find_cycle(graph, &unresolved) });
    }

    Ok(order)
}

/// Walk dependency edges inside the unresolved set until a name repeats
///
/// Every unresolved node has at least one unresolved dependency, so the walk
/// always closes a cycle.
fn find_cycle(graph: &BTreeMap<&str, Vec<&str>>, unresolved: &BTreeSet<&str>) -> Vec<String> {
    let mut path: Vec<&str> = Vec::new();
    let mut current = unresolved.first().copied();

    while let Some(name) = current {
        if let Some(start) = path.iter().position(|seen| *seen == name) {
            let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
            cycle.push(name.to_string());
            return cycle;
        }
        path.push(name);
        current = graph
            .get(name)
            .and_then(|deps| deps.iter().copied().find(|dep| unresolved.contains(dep)));
    }

    path.into_iter().map(str::to_string).collect()
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

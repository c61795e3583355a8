//! Loadable registry.

use super::{
    Observer,
    entry::{ImportFuture, LoaderEntry},
    options::LoadableOptions,
};
use futures::future::join_all;
use parking_lot::RwLock;
use phragon_core::{Importer, LoadError};
use std::{collections::HashMap, fmt, sync::Arc};

/// Maps component names to loader entries.
///
/// Entries are created on first reference and live as long as the registry.
/// The registry is an ordinary value: create one at startup and hand it (or an
/// `Arc` of it) to whatever registers and renders components.
///
/// # Example
///
/// ```rust,ignore
/// let registry = LoadableRegistry::new();
/// let page = registry.component("page", || async { Ok(Page::default()) }, LoadableOptions::new());
///
/// let observer = page.observe();
/// let _mounted = observer.subscribe(|state| render(state));
/// ```
pub struct LoadableRegistry<M> {
    entries: RwLock<HashMap<String, Arc<LoaderEntry<M>>>>,
}

impl<M> LoadableRegistry<M>
where
    M: Clone + Send + Sync + 'static,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `name` with `importer`, or return the existing entry.
    ///
    /// The first importer registered under a name wins; later ones are
    /// dropped unused.
    pub fn register<I>(&self, name: impl Into<String>, importer: I) -> Arc<LoaderEntry<M>>
    where
        I: Importer<M>,
    {
        let name = name.into();
        if let Some(entry) = self.entries.read().get(&name) {
            return entry.clone();
        }

        self.entries
            .write()
            .entry(name)
            .or_insert_with_key(|name| {
                #[cfg(feature = "tracing")]
                tracing::debug!(loadable = %name, "registered loadable");
                LoaderEntry::new(name.clone(), Arc::new(importer))
            })
            .clone()
    }

    /// Register a component and return a handle its consumers observe.
    pub fn component<I>(
        &self,
        name: impl Into<String>,
        importer: I,
        options: LoadableOptions,
    ) -> Loadable<M>
    where
        I: Importer<M>,
    {
        Loadable {
            entry: self.register(name, importer),
            options,
        }
    }

    /// The entry registered under `name`.
    pub fn load(&self, name: &str) -> Option<Arc<LoaderEntry<M>>> {
        self.entries.read().get(name).cloned()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no entry is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Start every registered import and wait for all of them to settle.
    ///
    /// Results are returned by name, sorted.
    pub async fn preload_all(&self) -> Vec<(String, Result<M, LoadError>)> {
        let mut entries: Vec<_> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.name().cmp(b.name()));

        let results = join_all(entries.iter().map(|entry| entry.init())).await;
        entries
            .iter()
            .map(|entry| entry.name().to_string())
            .zip(results)
            .collect()
    }
}

impl<M> Default for LoadableRegistry<M>
where
    M: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for LoadableRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableRegistry")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

/// A registered component: one shared entry plus the options every consumer
/// of this handle uses.
pub struct Loadable<M> {
    entry: Arc<LoaderEntry<M>>,
    options: LoadableOptions,
}

impl<M> Loadable<M>
where
    M: Clone + Send + Sync + 'static,
{
    /// Create a consumer. Nothing happens until it is subscribed to.
    pub fn observe(&self) -> Observer<M> {
        Observer::new(self.entry.clone(), self.options)
    }

    /// Start the import without mounting a consumer.
    pub fn preload(&self) -> ImportFuture<M> {
        self.entry.init()
    }

    /// The shared entry.
    pub fn entry(&self) -> &Arc<LoaderEntry<M>> {
        &self.entry
    }

    /// The options consumers are created with.
    pub fn options(&self) -> LoadableOptions {
        self.options
    }
}

impl<M> Clone for Loadable<M> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry.clone(),
            options: self.options,
        }
    }
}

impl<M> fmt::Debug for Loadable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loadable")
            .field("entry", &self.entry)
            .field("options", &self.options)
            .finish()
    }
}

//! Loader entries: one shared, at-most-once-in-flight import.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use phragon_core::{DynImporter, LoadError};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// A pending or settled import, shareable between any number of waiters.
pub type ImportFuture<M> = Shared<BoxFuture<'static, Result<M, LoadError>>>;

/// Coarse status of a [`LoaderEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// No import has been started.
    Idle,
    /// An import is in flight.
    Loading,
    /// The import produced a module.
    Done,
    /// The import failed.
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryStatus::Idle => "idle",
            EntryStatus::Loading => "loading",
            EntryStatus::Done => "done",
            EntryStatus::Error => "error",
        })
    }
}

enum EntryState<M> {
    Idle,
    Loading(ImportFuture<M>),
    Done(M),
    Failed(LoadError),
}

impl<M> EntryState<M> {
    fn status(&self) -> EntryStatus {
        match self {
            EntryState::Idle => EntryStatus::Idle,
            EntryState::Loading(_) => EntryStatus::Loading,
            EntryState::Done(_) => EntryStatus::Done,
            EntryState::Failed(_) => EntryStatus::Error,
        }
    }
}

/// One lazily imported module, shared by every consumer of its name.
///
/// [`init`](Self::init) invokes the importer at most once per load cycle;
/// concurrent callers all get the same pending future. A failed entry stays
/// failed until [`reset`](Self::reset).
pub struct LoaderEntry<M> {
    name: String,
    importer: Arc<dyn DynImporter<M>>,
    state: Mutex<EntryState<M>>,
    subscribers: AtomicUsize,
    imports: AtomicUsize,
}

impl<M> LoaderEntry<M>
where
    M: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: String, importer: Arc<dyn DynImporter<M>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            importer,
            state: Mutex::new(EntryState::Idle),
            subscribers: AtomicUsize::new(0),
            imports: AtomicUsize::new(0),
        })
    }

    /// Start the import if none has been started, and return its future.
    ///
    /// Settled entries return an already resolved future. Inside a Tokio
    /// runtime the import is driven on its own task, so it completes even if
    /// every waiter goes away.
    pub fn init(self: &Arc<Self>) -> ImportFuture<M> {
        let mut state = self.state.lock();
        match &*state {
            EntryState::Loading(pending) => return pending.clone(),
            EntryState::Done(module) => return settled(Ok(module.clone())),
            EntryState::Failed(error) => return settled(Err(error.clone())),
            EntryState::Idle => {}
        }

        self.imports.fetch_add(1, Ordering::SeqCst);
        #[cfg(feature = "tracing")]
        tracing::debug!(loadable = %self.name, "import started");

        let importer = self.importer.clone();
        let entry = Arc::downgrade(self);
        let pending = async move {
            let result = importer.import_dyn().await.map_err(LoadError::import);
            if let Some(entry) = entry.upgrade() {
                entry.settle(&result);
            }
            result
        }
        .boxed()
        .shared();

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(pending.clone());
        }
        *state = EntryState::Loading(pending.clone());
        pending
    }

    fn settle(&self, result: &Result<M, LoadError>) {
        let mut state = self.state.lock();
        if !matches!(*state, EntryState::Loading(_)) {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(loadable = %self.name, ok = result.is_ok(), "import settled");

        *state = match result {
            Ok(module) => EntryState::Done(module.clone()),
            Err(error) => EntryState::Failed(error.clone()),
        };
    }

    /// The settled result, if any.
    pub fn result(&self) -> Option<Result<M, LoadError>> {
        match &*self.state.lock() {
            EntryState::Done(module) => Some(Ok(module.clone())),
            EntryState::Failed(error) => Some(Err(error.clone())),
            EntryState::Idle | EntryState::Loading(_) => None,
        }
    }
}

impl<M> LoaderEntry<M> {
    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clear a failed import so the next [`init`](Self::init) imports again.
    ///
    /// Returns whether anything was cleared; entries that are loading or done
    /// are left alone.
    pub fn reset(&self) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, EntryState::Failed(_)) {
            *state = EntryState::Idle;
            true
        } else {
            false
        }
    }

    /// Current status.
    pub fn status(&self) -> EntryStatus {
        self.state.lock().status()
    }

    /// Whether the import produced a module.
    pub fn is_done(&self) -> bool {
        self.status() == EntryStatus::Done
    }

    /// Whether an import is in flight.
    pub fn is_loading(&self) -> bool {
        self.status() == EntryStatus::Loading
    }

    /// Number of mounted consumers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }

    /// Number of times the importer has been invoked.
    pub fn import_count(&self) -> usize {
        self.imports.load(Ordering::SeqCst)
    }

    pub(crate) fn attach(&self) {
        self.subscribers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn detach(&self) {
        let _ = self
            .subscribers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

fn settled<M>(result: Result<M, LoadError>) -> ImportFuture<M>
where
    M: Clone + Send + Sync + 'static,
{
    futures::future::ready(result).boxed().shared()
}

impl<M> fmt::Debug for LoaderEntry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderEntry")
            .field("name", &self.name)
            .field("status", &self.state.lock().status())
            .field("subscribers", &self.subscribers.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

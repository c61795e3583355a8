//! Per-consumer loading state machine.
//!
//! ```text
//!            subscribe            import ok
//!   Idle ───────────────▶ Loading ─────────▶ Done
//!                            │  │
//!              import failed │  │ timeout fired
//!                            ▼  ▼
//!                        Error  TimedOut
//!                            │  │
//!                            └──┴── retry() ──▶ Loading (or Done)
//! ```
//!
//! Every consumer runs its own delay and timeout timers around the shared
//! [`LoaderEntry`]. Dropping the last [`Subscription`] unmounts the consumer:
//! its timers are cancelled and its state stops changing, while the import
//! itself keeps running for everyone else.

use super::{entry::LoaderEntry, options::LoadableOptions};
use parking_lot::{Mutex, ReentrantMutex};
use phragon_core::LoadError;
use std::{cell::Cell, fmt, sync::Arc, time::Duration};
use tokio::{runtime::Handle, task::JoinHandle};

/// Where a consumer is in its load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not mounted yet.
    Idle,
    /// Waiting for the import.
    Loading,
    /// The module is available.
    Done,
    /// The import failed.
    Error,
    /// The consumer gave up waiting.
    TimedOut,
}

/// Snapshot of one consumer's state.
#[derive(Debug, Clone)]
pub struct ObserverState<M> {
    /// Attempt counter; increases on every mount and retry.
    pub id: u64,
    /// Whether the delay has elapsed (or the load finished).
    pub past_delay: bool,
    /// The error shown to this consumer, if any.
    pub error: Option<LoadError>,
    /// The loaded module, if any.
    pub loaded: Option<M>,
    /// Whether this attempt still waits for the import.
    pub pending: bool,
}

impl<M> ObserverState<M> {
    fn new() -> Self {
        Self {
            id: 0,
            past_delay: false,
            error: None,
            loaded: None,
            pending: false,
        }
    }

    /// The phase this state represents.
    ///
    /// An error wins over a loaded module: a load that succeeds after the
    /// timeout fired still reports [`Phase::TimedOut`].
    pub fn phase(&self) -> Phase {
        match (&self.error, &self.loaded) {
            (Some(error), _) if error.is_timeout() => Phase::TimedOut,
            (Some(_), _) => Phase::Error,
            (None, Some(_)) => Phase::Done,
            (None, None) if self.pending => Phase::Loading,
            (None, None) => Phase::Idle,
        }
    }
}

/// What a UI binding renders for a consumer.
#[derive(Debug, Clone)]
pub enum LoadView<M> {
    /// Still loading; show an indicator only once `past_delay` is set.
    Loading {
        /// Whether the delay has elapsed.
        past_delay: bool,
    },
    /// The load failed or timed out.
    Failed {
        /// The error.
        error: LoadError,
        /// Whether the error is a timeout.
        timed_out: bool,
    },
    /// The module is ready.
    Ready(M),
}

type Listener<M> = Arc<dyn Fn(&ObserverState<M>) + Send + Sync>;

/// A state to deliver, tagged with the revision it was taken at.
struct Snapshot<M> {
    revision: u64,
    state: ObserverState<M>,
    listeners: Vec<Listener<M>>,
}

struct Inner<M> {
    state: ObserverState<M>,
    listeners: Vec<(u64, Listener<M>)>,
    next_listener: u64,
    timers: Vec<JoinHandle<()>>,
    waiter: Option<JoinHandle<()>>,
    mounted: bool,
    revision: u64,
}

impl<M> Inner<M> {
    fn cancel_timers(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_timers();
        if let Some(waiter) = self.waiter.take() {
            waiter.abort();
        }
    }

    fn snapshot(&mut self) -> Snapshot<M>
    where
        M: Clone,
    {
        self.revision += 1;
        Snapshot {
            revision: self.revision,
            state: self.state.clone(),
            listeners: self.listeners.iter().map(|(_, l)| l.clone()).collect(),
        }
    }
}

struct Core<M> {
    entry: Arc<LoaderEntry<M>>,
    options: LoadableOptions,
    inner: Mutex<Inner<M>>,
    /// Revision of the last delivered snapshot. Reentrant so a listener may
    /// call back into the observer.
    delivered: ReentrantMutex<Cell<u64>>,
}

/// One consumer of a loadable.
///
/// Created by [`Loadable::observe`](super::Loadable::observe). The first
/// [`subscribe`](Self::subscribe) mounts it and starts loading; dropping the
/// last subscription unmounts it.
pub struct Observer<M> {
    core: Arc<Core<M>>,
}

impl<M> Observer<M>
where
    M: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(entry: Arc<LoaderEntry<M>>, options: LoadableOptions) -> Self {
        Self {
            core: Arc::new(Core {
                entry,
                options,
                inner: Mutex::new(Inner {
                    state: ObserverState::new(),
                    listeners: Vec::new(),
                    next_listener: 0,
                    timers: Vec::new(),
                    waiter: None,
                    mounted: false,
                    revision: 0,
                }),
                delivered: ReentrantMutex::new(Cell::new(0)),
            }),
        }
    }

    /// Register a state-change callback.
    ///
    /// The first subscription mounts the consumer. The callback is invoked
    /// after every transition, starting with the one into `Loading` (or
    /// `Done` if the entry already loaded).
    ///
    /// Timers and the import run on the current Tokio runtime. Mounted
    /// outside a runtime, a consumer whose entry has not loaded stays in
    /// `Loading` until [`retry`](Self::retry) is called from inside one.
    pub fn subscribe<F>(&self, callback: F) -> Subscription<M>
    where
        F: Fn(&ObserverState<M>) + Send + Sync + 'static,
    {
        let (id, mount) = {
            let mut inner = self.core.inner.lock();
            let id = inner.next_listener;
            inner.next_listener += 1;
            inner.listeners.push((id, Arc::new(callback)));
            let mount = !inner.mounted;
            inner.mounted = true;
            (id, mount)
        };

        if mount {
            self.core.entry.attach();
            self.core.start();
        }

        Subscription {
            core: self.core.clone(),
            id: Some(id),
        }
    }

    /// Recover from an error.
    ///
    /// If the entry already loaded, the consumer goes straight to `Done`;
    /// otherwise the entry is reset and loading starts over. Does nothing on
    /// an unmounted consumer.
    pub fn retry(&self) {
        if !self.core.inner.lock().mounted {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(loadable = self.core.entry.name(), "retry");

        self.core.entry.reset();
        self.core.start();
    }

    /// The current state.
    pub fn state(&self) -> ObserverState<M> {
        self.core.inner.lock().state.clone()
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.core.inner.lock().state.phase()
    }

    /// Whether the consumer is mounted.
    pub fn is_mounted(&self) -> bool {
        self.core.inner.lock().mounted
    }

    /// The options this consumer runs with.
    pub fn options(&self) -> LoadableOptions {
        self.core.options
    }

    /// What to render for the current state.
    ///
    /// With `throwable` set, an error is returned as `Err` for an enclosing
    /// error handler instead of being rendered.
    pub fn view(&self) -> Result<LoadView<M>, LoadError> {
        let state = self.state();
        match (state.error, state.loaded) {
            (Some(error), _) if self.core.options.throwable => Err(error),
            (Some(error), _) => Ok(LoadView::Failed {
                timed_out: error.is_timeout(),
                error,
            }),
            (None, Some(module)) => Ok(LoadView::Ready(module)),
            (None, None) => Ok(LoadView::Loading {
                past_delay: state.past_delay,
            }),
        }
    }
}

impl<M> Core<M>
where
    M: Clone + Send + Sync + 'static,
{
    /// Begin a new attempt.
    fn start(self: &Arc<Self>) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if !inner.mounted {
                return;
            }
            inner.cancel_all();
            inner.state.id += 1;
            inner.state.error = None;
            let id = inner.state.id;

            if let Some(Ok(module)) = self.entry.result() {
                inner.state.loaded = Some(module);
                inner.state.past_delay = true;
                inner.state.pending = false;
            } else {
                inner.state.loaded = None;
                inner.state.pending = true;
                inner.state.past_delay = self.options.delay.is_zero();

                match Handle::try_current() {
                    Ok(runtime) => self.arm(&runtime, &mut inner, id),
                    Err(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            loadable = self.entry.name(),
                            "mounted outside a tokio runtime; load not started"
                        );
                    }
                }
            }
            inner.snapshot()
        };
        self.notify(snapshot);
    }

    /// Spawn the timers and the import waiter for attempt `id`.
    fn arm(self: &Arc<Self>, runtime: &Handle, inner: &mut Inner<M>, id: u64) {
        if !self.options.delay.is_zero() {
            let timer = self.spawn_timer(runtime, self.options.delay, id, Self::on_delay);
            inner.timers.push(timer);
        }
        if let Some(timeout) = self.options.timeout {
            let timer = self.spawn_timer(runtime, timeout, id, Self::on_timeout);
            inner.timers.push(timer);
        }

        let import = self.entry.init();
        let core = Arc::downgrade(self);
        inner.waiter = Some(runtime.spawn(async move {
            let result = import.await;
            if let Some(core) = core.upgrade() {
                core.on_settled(id, result);
            }
        }));
    }

    fn spawn_timer(
        self: &Arc<Self>,
        runtime: &Handle,
        after: Duration,
        id: u64,
        fire: fn(&Self, u64),
    ) -> JoinHandle<()> {
        let core = Arc::downgrade(self);
        runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(core) = core.upgrade() {
                fire(&core, id);
            }
        })
    }

    fn on_delay(&self, id: u64) {
        self.transition(id, |state| {
            if state.loaded.is_some() || state.past_delay {
                return false;
            }
            state.past_delay = true;
            true
        });
    }

    fn on_timeout(&self, id: u64) {
        let Some(timeout) = self.options.timeout else {
            return;
        };
        self.transition(id, |state| {
            if !state.pending {
                return false;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(loadable = self.entry.name(), ?timeout, "load timed out");
            state.error = Some(LoadError::Timeout(timeout));
            true
        });
    }

    fn on_settled(&self, id: u64, result: Result<M, LoadError>) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if !inner.mounted || inner.state.id != id {
                return;
            }
            inner.cancel_timers();
            inner.waiter = None;

            let state = &mut inner.state;
            state.pending = false;
            match result {
                Ok(module) => {
                    state.past_delay = true;
                    state.loaded = Some(module);
                    if !state.error.as_ref().is_some_and(LoadError::is_timeout) {
                        state.error = None;
                    }
                }
                Err(error) => {
                    if state.error.is_none() {
                        state.error = Some(error);
                    }
                }
            }
            inner.snapshot()
        };
        self.notify(snapshot);
    }

    /// Apply `change` to the current attempt, notifying if it reports a change.
    fn transition(&self, id: u64, change: impl FnOnce(&mut ObserverState<M>) -> bool) {
        let snapshot = {
            let mut inner = self.inner.lock();
            if !inner.mounted || inner.state.id != id || !change(&mut inner.state) {
                return;
            }
            inner.snapshot()
        };
        self.notify(snapshot);
    }
}

impl<M> Core<M> {
    fn unsubscribe(&self, id: u64) {
        let mut inner = self.inner.lock();
        inner.listeners.retain(|(listener, _)| *listener != id);
        if inner.listeners.is_empty() && inner.mounted {
            inner.mounted = false;
            inner.cancel_all();
            drop(inner);
            self.entry.detach();
        }
    }

    /// Deliver a snapshot unless a newer one was already delivered.
    ///
    /// Stops early when a listener causes a newer snapshot to be delivered.
    fn notify(&self, snapshot: Snapshot<M>) {
        let delivered = self.delivered.lock();
        if delivered.get() >= snapshot.revision {
            return;
        }
        delivered.set(snapshot.revision);
        for listener in snapshot.listeners {
            if delivered.get() != snapshot.revision {
                break;
            }
            listener(&snapshot.state);
        }
    }
}

impl<M> fmt::Debug for Observer<M>
where
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.core.inner.lock();
        f.debug_struct("Observer")
            .field("entry", &self.core.entry.name())
            .field("state", &inner.state)
            .field("mounted", &inner.mounted)
            .finish()
    }
}

/// A mounted callback. Dropping it (or calling
/// [`unsubscribe`](Self::unsubscribe)) removes the callback, and unmounts the
/// consumer when it was the last one.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription<M> {
    core: Arc<Core<M>>,
    id: Option<u64>,
}

impl<M> Subscription<M> {
    /// Remove the callback now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.core.unsubscribe(id);
        }
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<M> fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        loadable::LoadableRegistry,
        testing::{CountingImporter, StateRecorder},
    };
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_load_never_passes_delay() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(1).with_delay(ms(50)),
            LoadableOptions::new(),
        );
        let observer = page.observe();
        let recorder = StateRecorder::new();
        let _sub = observer.subscribe(recorder.callback());

        assert_eq!(observer.phase(), Phase::Loading);
        assert!(!observer.state().past_delay);

        sleep(ms(100)).await;
        assert_eq!(observer.phase(), Phase::Done);
        assert_eq!(recorder.phases(), vec![Phase::Loading, Phase::Done]);
        assert!(recorder.states().iter().all(|s| s.loaded.is_some() == s.past_delay));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_passes_delay() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(1).with_delay(ms(500)),
            LoadableOptions::new(),
        );
        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});

        sleep(ms(250)).await;
        assert!(matches!(
            observer.view(),
            Ok(LoadView::Loading { past_delay: true })
        ));
        sleep(ms(300)).await;
        assert!(matches!(observer.view(), Ok(LoadView::Ready(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(1).with_delay(ms(500)),
            LoadableOptions::new().delay(Duration::ZERO),
        );
        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});
        assert!(observer.state().past_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_retry() {
        let registry = LoadableRegistry::new();
        let importer = CountingImporter::new(9).with_delay(ms(10)).fail_first(1);
        let page = registry.component("page", importer.clone(), LoadableOptions::new());
        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});

        sleep(ms(20)).await;
        assert_eq!(observer.phase(), Phase::Error);
        assert!(matches!(
            observer.view(),
            Ok(LoadView::Failed { timed_out: false, .. })
        ));

        let first_id = observer.state().id;
        observer.retry();
        assert_eq!(observer.phase(), Phase::Loading);
        assert!(observer.state().id > first_id);

        sleep(ms(20)).await;
        assert_eq!(observer.phase(), Phase::Done);
        assert_eq!(importer.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_when_done_is_immediate() {
        let registry = LoadableRegistry::new();
        let importer = CountingImporter::new(4);
        let page = registry.component("page", importer.clone(), LoadableOptions::new());
        page.preload().await.unwrap();

        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});
        assert_eq!(observer.phase(), Phase::Done);
        assert!(observer.state().past_delay);

        observer.retry();
        assert_eq!(observer.phase(), Phase::Done);
        assert_eq!(importer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throwable_returns_err() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(0).failing("chunk missing"),
            LoadableOptions::new().throwable(true),
        );
        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});
        sleep(ms(1)).await;

        let err = observer.view().unwrap_err();
        assert_eq!(err.to_string(), "import failed: chunk missing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_transitions() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(1).with_delay(ms(300)),
            LoadableOptions::new().timeout(ms(100)),
        );
        let observer = page.observe();
        let recorder = StateRecorder::new();
        let sub = observer.subscribe(recorder.callback());
        assert_eq!(page.entry().subscriber_count(), 1);

        sleep(ms(50)).await;
        sub.unsubscribe();
        assert!(!observer.is_mounted());
        assert_eq!(page.entry().subscriber_count(), 0);

        sleep(ms(500)).await;
        assert_eq!(recorder.len(), 1);
        assert_eq!(observer.phase(), Phase::Loading);
        assert!(page.entry().is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_unmounted_observer_is_ignored() {
        let registry = LoadableRegistry::new();
        let page = registry.component("page", CountingImporter::new(1), LoadableOptions::new());
        let observer = page.observe();
        observer.retry();
        assert_eq!(observer.phase(), Phase::Idle);
        assert_eq!(page.entry().import_count(), 0);
    }

    #[test]
    fn test_mount_outside_runtime_uses_loaded_module() {
        let registry = LoadableRegistry::new();
        let page = registry.component("page", CountingImporter::new(7), LoadableOptions::new());
        futures::executor::block_on(page.preload()).unwrap();

        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});
        assert_eq!(observer.phase(), Phase::Done);
        assert!(matches!(observer.view(), Ok(LoadView::Ready(7))));
    }

    #[test]
    fn test_mount_outside_runtime_waits_in_loading() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(7),
            LoadableOptions::new().timeout(ms(10)),
        );
        let observer = page.observe();
        let _sub = observer.subscribe(|_| {});
        assert_eq!(observer.phase(), Phase::Loading);
        assert_eq!(page.entry().import_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_from_listener_delivers_latest_state() {
        let registry = LoadableRegistry::new();
        let page = registry.component(
            "page",
            CountingImporter::new(3).with_delay(ms(10)).fail_first(1),
            LoadableOptions::new(),
        );
        let observer = Arc::new(page.observe());
        let recorder = StateRecorder::new();
        let _recording = observer.subscribe(recorder.callback());

        let retrying = Arc::downgrade(&observer);
        let _retry = observer.subscribe(move |state| {
            if state.phase() == Phase::Error {
                if let Some(observer) = retrying.upgrade() {
                    observer.retry();
                }
            }
        });

        sleep(ms(50)).await;
        assert_eq!(observer.phase(), Phase::Done);
        let last = recorder.last().unwrap();
        assert_eq!(last.phase(), Phase::Done);
        assert_eq!(last.id, observer.state().id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_delivered_state_is_current_across_threads() {
        for _ in 0..100 {
            let registry = LoadableRegistry::new();
            let page = registry.component(
                "page",
                CountingImporter::new(1),
                LoadableOptions::new().delay(Duration::ZERO),
            );
            let observer = page.observe();
            let recorder = StateRecorder::new();
            let _sub = observer.subscribe(recorder.callback());

            page.preload().await.unwrap();
            while recorder.last().map(|s| s.phase()) != Some(Phase::Done) {
                tokio::task::yield_now().await;
            }
            sleep(ms(1)).await;

            // A `Loading` taken before the import settled may be dropped,
            // but never delivered after `Done`.
            assert!(matches!(
                recorder.phases().as_slice(),
                [Phase::Done] | [Phase::Loading, Phase::Done]
            ));
        }
    }
}

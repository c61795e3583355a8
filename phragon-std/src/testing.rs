//! Testing utilities for Phragon.
//!
//! This module provides utilities to make testing loadables easier.
//!
//! # Features
//!
//! - [`CountingImporter`]: An importer that counts invocations and can be
//!   delayed or made to fail
//! - [`StateRecorder`]: A subscriber that records every observer state it sees

use crate::loadable::{ObserverState, Phase};
use parking_lot::Mutex;
use phragon_core::{BoxError, Importer};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

// ============================================================================
// Counting Importer
// ============================================================================

/// An importer that counts how often it is invoked.
///
/// Clones share the counter, so keep one clone to inspect after handing the
/// other to a registry.
///
/// # Example
///
/// ```rust,ignore
/// let importer = CountingImporter::new("page").with_delay(Duration::from_millis(50));
/// let page = registry.component("page", importer.clone(), LoadableOptions::new());
///
/// page.preload().await?;
/// assert_eq!(importer.calls(), 1);
/// ```
pub struct CountingImporter<M> {
    module: M,
    delay: Duration,
    failure: Option<String>,
    fail_first: usize,
    calls: Arc<AtomicUsize>,
}

impl<M> CountingImporter<M> {
    /// Create an importer that resolves to `module` immediately.
    pub fn new(module: M) -> Self {
        Self {
            module,
            delay: Duration::ZERO,
            failure: None,
            fail_first: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait `delay` before settling.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every invocation with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Fail the first `count` invocations, then succeed.
    pub fn fail_first(mut self, count: usize) -> Self {
        self.fail_first = count;
        self
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<M: Clone> Clone for CountingImporter<M> {
    fn clone(&self) -> Self {
        Self {
            module: self.module.clone(),
            delay: self.delay,
            failure: self.failure.clone(),
            fail_first: self.fail_first,
            calls: self.calls.clone(),
        }
    }
}

impl<M> Importer<M> for CountingImporter<M>
where
    M: Clone + Send + Sync + 'static,
{
    async fn import(&self) -> Result<M, BoxError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        if call < self.fail_first {
            return Err(format!("import attempt {} failed", call + 1).into());
        }
        Ok(self.module.clone())
    }
}

// ============================================================================
// State Recorder
// ============================================================================

/// Records every state an observer reports.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = StateRecorder::new();
/// let _sub = observer.subscribe(recorder.callback());
///
/// // ... let time pass ...
/// assert_eq!(recorder.phases(), vec![Phase::Loading, Phase::Done]);
/// ```
pub struct StateRecorder<M> {
    states: Arc<Mutex<Vec<ObserverState<M>>>>,
}

impl<M> StateRecorder<M>
where
    M: Clone + Send + 'static,
{
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback for [`Observer::subscribe`](crate::loadable::Observer::subscribe)
    /// that appends to this recorder.
    pub fn callback(&self) -> impl Fn(&ObserverState<M>) + Send + Sync + 'static {
        let states = self.states.clone();
        move |state| states.lock().push(state.clone())
    }

    /// Get a clone of the recorded states.
    pub fn states(&self) -> Vec<ObserverState<M>> {
        self.states.lock().clone()
    }

    /// The phase of every recorded state, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.states.lock().iter().map(ObserverState::phase).collect()
    }

    /// The most recent state.
    pub fn last(&self) -> Option<ObserverState<M>> {
        self.states.lock().last().cloned()
    }

    /// Get the number of recorded states.
    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }

    /// Clear all recorded states.
    pub fn clear(&self) {
        self.states.lock().clear();
    }
}

impl<M> Default for StateRecorder<M>
where
    M: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for StateRecorder<M> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
        }
    }
}

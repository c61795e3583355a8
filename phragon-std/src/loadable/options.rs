//! Per-component loadable options.

use std::time::Duration;

/// Delay before a consumer reports `past_delay` when none is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

/// How each consumer of a loadable waits for it.
///
/// # Example
///
/// ```rust,ignore
/// let options = LoadableOptions::new()
///     .delay(Duration::ZERO)
///     .timeout(Duration::from_secs(5))
///     .throwable(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadableOptions {
    /// Time before `past_delay` flips to `true`. Zero means immediately.
    pub delay: Duration,
    /// Time after which a still pending load reports a timeout error.
    pub timeout: Option<Duration>,
    /// Whether [`Observer::view`](super::Observer::view) returns errors as `Err`.
    pub throwable: bool,
}

impl LoadableOptions {
    /// Default options: 200ms delay, no timeout, errors rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set whether errors are returned as `Err` from views.
    pub fn throwable(mut self, throwable: bool) -> Self {
        self.throwable = throwable;
        self
    }
}

impl Default for LoadableOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            timeout: None,
            throwable: false,
        }
    }
}

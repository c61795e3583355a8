//! Compiled-pattern cache.

use super::Pattern;
use crate::modifiers::ModifierRegistry;
use parking_lot::RwLock;
use phragon_core::PatternError;
use std::{collections::HashMap, sync::Arc};

/// Reuses compiled patterns for identical template strings.
///
/// Compilation is a pure function of the template (for a fixed modifier
/// registry), so a cache must only ever be used with one registry. Cached and
/// freshly compiled patterns behave identically.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: RwLock<HashMap<String, Arc<Pattern>>>,
}

impl PatternCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached pattern for `template`, compiling it on first use.
    pub fn get_or_compile(
        &self,
        template: &str,
        modifiers: &ModifierRegistry,
    ) -> Result<Arc<Pattern>, PatternError> {
        if let Some(pattern) = self.patterns.read().get(template) {
            #[cfg(feature = "tracing")]
            tracing::trace!(template, "pattern cache hit");
            return Ok(pattern.clone());
        }

        let compiled = Arc::new(Pattern::compile(template, modifiers)?);
        let mut patterns = self.patterns.write();
        Ok(patterns
            .entry(template.to_string())
            .or_insert(compiled)
            .clone())
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }

    /// Drop every cached pattern.
    pub fn clear(&self) {
        self.patterns.write().clear();
    }
}

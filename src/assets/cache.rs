/// Shared load cache
///
/// The set of locators that have already settled in this process. Every
/// preload pass consults it to skip redundant loads and inserts into it as
/// loads settle. Entries have no TTL and no size bound: they stay until a
/// scoped clear removes them or the process exits.
///
/// One cache is built at startup and cloned into each call site; clones
/// share the same set.

use dashmap::DashSet;
use std::sync::Arc;

use super::manifest::AssetLocator;

#[derive(Debug, Clone, Default)]
pub struct SharedLoadCache {
    loaded: Arc<DashSet<AssetLocator>>,
}

impl SharedLoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, locator: &AssetLocator) -> bool {
        self.loaded.contains(locator)
    }

    /// Record a settled locator
    ///
    /// Returns `true` if it was not cached yet. Inserting an already
    /// present locator is a no-op.
    pub fn mark_loaded(&self, locator: AssetLocator) -> bool {
        self.loaded.insert(locator)
    }

    /// Remove exactly the given locators, leaving every other entry alone
    ///
    /// Only call this when no in-flight pass still needs these entries.
    pub fn clear_group(&self, locators: &[AssetLocator]) {
        let mut removed = 0;
        for locator in locators {
            if self.loaded.remove(locator).is_some() {
                removed += 1;
            }
        }
        tracing::debug!("🧹 Cleared {} of {} cached assets", removed, locators.len());
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::plugins::{PluginKind, SharedResult};

/// Compute-once storage for plugin results within a single run.
///
/// Every plugin owns one slot. Concurrent callers racing on an empty slot
/// block until the first computation finishes, so a plugin never runs twice.
pub struct ResultCache {
    slots: HashMap<PluginKind, OnceCell<SharedResult>>,
}

impl ResultCache {
    /// Create a cache with an empty slot for every known plugin
    pub fn new() -> Self {
        Self {
            slots: PluginKind::ALL
                .into_iter()
                .map(|kind| (kind, OnceCell::new()))
                .collect(),
        }
    }

    /// Retrieve a result if it was already computed
    pub fn get(&self, kind: PluginKind) -> Option<SharedResult> {
        self.slots.get(&kind).and_then(OnceCell::get).cloned()
    }

    /// Return the stored result, computing it with `compute` on first access
    pub fn get_or_compute<F>(&self, kind: PluginKind, compute: F) -> SharedResult
    where
        F: FnOnce() -> SharedResult,
    {
        match self.slots.get(&kind) {
            Some(slot) => Arc::clone(slot.get_or_init(compute)),
            // Slots exist for every variant of PluginKind.
            None => compute(),
        }
    }

    /// Number of plugins computed so far
    pub fn computed(&self) -> usize {
        self.slots.values().filter(|slot| slot.get().is_some()).count()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::CommitsPerAuthor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn empty_result() -> SharedResult {
        Arc::new(CommitsPerAuthor::compute(&[]))
    }

    #[test]
    fn test_compute_once() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_compute(PluginKind::CommitsPerAuthor, || {
            calls.fetch_add(1, Ordering::SeqCst);
            empty_result()
        });
        let second = cache.get_or_compute(PluginKind::CommitsPerAuthor, || {
            calls.fetch_add(1, Ordering::SeqCst);
            empty_result()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.computed(), 1);
    }

    #[test]
    fn test_get_before_compute() {
        let cache = ResultCache::default();
        assert!(cache.get(PluginKind::TypeOfProgression).is_none());
        cache.get_or_compute(PluginKind::TypeOfProgression, empty_result);
        assert!(cache.get(PluginKind::TypeOfProgression).is_some());
        assert!(cache.get(PluginKind::CommitsPerAuthor).is_none());
    }

    #[test]
    fn test_concurrent_callers_compute_once() {
        let cache = Arc::new(ResultCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    cache.get_or_compute(PluginKind::MergeCommitsPerAuthor, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        empty_result()
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

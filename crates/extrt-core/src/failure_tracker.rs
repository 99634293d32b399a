//! Shared failure tracker (spec §4.4.6, §5), grounded in
//! `original_source/src/core/failure_tracker.hpp`.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use extrt_types::UniqueId;

/// Thread-safe set of failed extension ids, used to short-circuit
/// dependents across stages without recursing (spec §4.4.6): each stage
/// consults the tracker and, on its own failure, marks only its *direct*
/// dependents — those dependents cascade the mark outward themselves when
/// they are visited.
pub struct FailureTracker {
    failed: RwLock<FxHashMap<UniqueId, ()>>,
}

impl FailureTracker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            failed: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    pub fn mark_failed(&self, id: UniqueId) {
        self.failed
            .write()
            .expect("failure tracker lock poisoned")
            .insert(id, ());
    }

    pub fn has_failed(&self, id: &UniqueId) -> bool {
        self.failed
            .read()
            .expect("failure tracker lock poisoned")
            .contains_key(id)
    }

    /// True if any of `ext`'s dependencies (looked up via the reverse
    /// dependency graph: who-depends-on-me, keyed by the dependency) have
    /// failed.
    pub fn has_any_dependency_failed(
        &self,
        id: &UniqueId,
        dependency_graph: &FxHashMap<UniqueId, Vec<UniqueId>>,
    ) -> bool {
        let failed = self.failed.read().expect("failure tracker lock poisoned");
        dependency_graph
            .get(id)
            .into_iter()
            .flatten()
            .any(|dep| failed.contains_key(dep))
    }

    /// The name of the first failed dependency of `id`, for building the
    /// `"Skipped: dependency 'X' failed"` message (spec §4.4.3, S5).
    pub fn failed_dependency_name(
        &self,
        id: &UniqueId,
        dependency_graph: &FxHashMap<UniqueId, Vec<UniqueId>>,
    ) -> Option<String> {
        let failed = self.failed.read().expect("failure tracker lock poisoned");
        dependency_graph
            .get(id)
            .into_iter()
            .flatten()
            .find(|dep| failed.contains_key(*dep))
            .map(|dep| dep.display_name().to_string())
    }

    /// Mark every direct dependent of `id` as failed, using the
    /// dependency_graph (deps-of) to find entries whose list contains
    /// `id`. Callers pass the reverse_dependency_graph directly when they
    /// have it, which is O(1) per lookup rather than a scan.
    pub fn propagate_to_direct_dependents(
        &self,
        id: &UniqueId,
        reverse_dependency_graph: &FxHashMap<UniqueId, Vec<UniqueId>>,
    ) {
        if let Some(dependents) = reverse_dependency_graph.get(id) {
            let mut failed = self.failed.write().expect("failure tracker lock poisoned");
            for dependent in dependents {
                failed.insert(dependent.clone(), ());
            }
        }
    }
}

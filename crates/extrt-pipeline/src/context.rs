//! Shared state threaded through every stage (spec §4.3, §5).

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use extrt_config::Config;
use extrt_core::FailureTracker;
use extrt_types::UniqueId;

/// The graphs and load order produced once by `ResolutionStage`. Stored
/// behind a `OnceLock` rather than a `RwLock`: spec §5 calls these
/// "constructed exclusively by ResolutionStage; read-only thereafter, no
/// synchronization needed" once set, which `OnceLock` models directly.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraphs {
    pub dependency_graph: FxHashMap<UniqueId, Vec<UniqueId>>,
    pub reverse_dependency_graph: FxHashMap<UniqueId, Vec<UniqueId>>,
    pub load_order: Vec<UniqueId>,
}

/// Per-run context shared by reference across every stage invocation.
pub struct PipelineContext {
    pub config: Config,
    pub failure_tracker: FailureTracker,
    resolution: OnceLock<ResolvedGraphs>,
}

impl PipelineContext {
    pub fn new(config: Config) -> Self {
        Self {
            failure_tracker: FailureTracker::with_capacity(32),
            resolution: OnceLock::new(),
            config,
        }
    }

    /// Called once by `ResolutionStage`. A second call is a no-op — later
    /// stages only ever read what resolution produced.
    pub fn set_resolution(&self, graphs: ResolvedGraphs) {
        let _ = self.resolution.set(graphs);
    }

    pub fn resolution(&self) -> Option<&ResolvedGraphs> {
        self.resolution.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_unset_until_written() {
        let ctx = PipelineContext::new(Config::default());
        assert!(ctx.resolution().is_none());
        ctx.set_resolution(ResolvedGraphs::default());
        assert!(ctx.resolution().is_some());
    }
}

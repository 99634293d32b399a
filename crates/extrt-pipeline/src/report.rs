//! `Report` / `StageStatistics` (spec §4.3) — the executor's diagnostic
//! output.

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct StageStatistics {
    pub name: String,
    pub items_in: usize,
    pub items_out: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub errors: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub stages: Vec<StageStatistics>,
    /// Set when a required stage failed and the pipeline stopped early.
    pub stopped_at: Option<String>,
}

impl Report {
    pub fn stage(&self, name: &str) -> Option<&StageStatistics> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn total_elapsed(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }
}

//! `DependencyIssue` and `ResolutionReport` (spec §3), produced by the
//! resolver and consumed by `ResolutionStage`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use extrt_types::UniqueId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyIssue {
    pub affected: UniqueId,
    pub involved: Option<UniqueId>,
    pub problem: String,
    pub description: String,
    pub suggested_fixes: Vec<String>,
    /// `true` maps to an error on the affected extension; `false` to a
    /// warning (spec §3).
    pub is_blocking: bool,
}

impl DependencyIssue {
    pub fn blocking(
        affected: UniqueId,
        problem: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            affected,
            involved: None,
            problem: problem.into(),
            description: description.into(),
            suggested_fixes: Vec::new(),
            is_blocking: true,
        }
    }

    pub fn warning(
        affected: UniqueId,
        problem: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            affected,
            involved: None,
            problem: problem.into(),
            description: description.into(),
            suggested_fixes: Vec::new(),
            is_blocking: false,
        }
    }

    pub fn involving(mut self, involved: UniqueId) -> Self {
        self.involved = Some(involved);
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fixes.push(fix.into());
        self
    }

    /// Human-readable rendering, analogous to
    /// `DependencyIssue::GetDetailedDescription` in the original.
    pub fn detailed_description(&self) -> String {
        let mut out = format!("{}: {}", self.problem, self.description);
        if !self.suggested_fixes.is_empty() {
            out.push_str("\n  Suggestions:");
            for fix in &self.suggested_fixes {
                out.push_str(&format!("\n    - {fix}"));
            }
        }
        out
    }
}

/// The resolver's output (spec §3, §4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub issues: FxHashMap<UniqueId, Vec<DependencyIssue>>,
    /// Who-I-depend-on.
    pub dependency_graph: FxHashMap<UniqueId, Vec<UniqueId>>,
    /// Who-depends-on-me.
    pub reverse_dependency_graph: FxHashMap<UniqueId, Vec<UniqueId>>,
    pub load_order: Vec<UniqueId>,
    pub is_load_order_valid: bool,
}

impl ResolutionReport {
    pub fn add_issue(&mut self, issue: DependencyIssue) {
        self.issues.entry(issue.affected.clone()).or_default().push(issue);
    }

    pub fn blocking_issues_for(&self, id: &UniqueId) -> impl Iterator<Item = &DependencyIssue> {
        self.issues
            .get(id)
            .into_iter()
            .flatten()
            .filter(|i| i.is_blocking)
    }

    pub fn warning_issues_for(&self, id: &UniqueId) -> impl Iterator<Item = &DependencyIssue> {
        self.issues
            .get(id)
            .into_iter()
            .flatten()
            .filter(|i| !i.is_blocking)
    }

    /// `index_of(u) < index_of(v)` for every `(u, v)` in `dependency_graph`
    /// (spec §8 property 4), assuming a valid load order.
    pub fn is_topologically_consistent(&self) -> bool {
        let position: FxHashMap<&UniqueId, usize> = self
            .load_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();

        for (dependent, deps) in &self.dependency_graph {
            let Some(&dependent_pos) = position.get(dependent) else {
                continue;
            };
            for dep in deps {
                if let Some(&dep_pos) = position.get(dep) {
                    if dependent_pos <= dep_pos {
                        return false;
                    }
                }
            }
        }
        true
    }
}

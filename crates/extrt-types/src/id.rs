//! Opaque, stable extension identifier (spec §3 "UniqueId").

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier assigned to an extension at discovery time. Carries a
/// short display name for diagnostics; equality and hashing ignore the name
/// and only compare the numeric id, so two `UniqueId`s are the same
/// identity regardless of which copy of the display name they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueId {
    value: u64,
    display_name: String,
}

impl UniqueId {
    /// Allocate a fresh id for `display_name`. Ids are assigned in
    /// increasing order within a process, which the resolver relies on for
    /// the "smallest id" canonical cycle rotation (spec §4.2 step 6).
    pub fn new(display_name: impl Into<String>) -> Self {
        let value = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            value,
            display_name: display_name.into(),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl PartialEq for UniqueId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for UniqueId {}

impl std::hash::Hash for UniqueId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for UniqueId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UniqueId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.display_name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_monotonically() {
        let a = UniqueId::new("a");
        let b = UniqueId::new("b");
        assert!(a.value() < b.value());
    }

    #[test]
    fn equality_ignores_display_name() {
        let a = UniqueId {
            value: 7,
            display_name: "one".into(),
        };
        let b = UniqueId {
            value: 7,
            display_name: "other".into(),
        };
        assert_eq!(a, b);
    }
}

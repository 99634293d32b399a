//! The extension entity, its state machine, the shared failure tracker,
//! and the resolver's report types (spec §3, §4.1, §4.2).

pub mod extension;
pub mod failure_tracker;
pub mod method_table;
pub mod resolution_report;
pub mod state;

pub use extension::{Assembly, Extension};
pub use failure_tracker::FailureTracker;
pub use method_table::MethodTable;
pub use resolution_report::{DependencyIssue, ResolutionReport};
pub use state::ExtensionState;

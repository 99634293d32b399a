//! `ExtensionState` and its legal-transition table (spec §3, §4.1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionState {
    Unknown,
    Discovered,

    Parsing,
    Parsed,
    Corrupted,

    Resolving,
    Resolved,
    Unresolved,

    Disabled,
    Skipped,
    Failed,

    Loading,
    Loaded,

    Exporting,
    Exported,

    Starting,
    Started,

    Running,

    Ending,
    Ended,

    Terminating,
    Terminated,
}

impl ExtensionState {
    /// Terminal error states (spec §3): an extension in one of these will
    /// never enter `Running`.
    pub fn is_terminal_error(self) -> bool {
        matches!(
            self,
            ExtensionState::Corrupted
                | ExtensionState::Failed
                | ExtensionState::Disabled
                | ExtensionState::Skipped
                | ExtensionState::Unresolved
                | ExtensionState::Terminated
        )
    }

    /// The exact legal-edge set from spec §3's state diagram.
    pub fn is_valid_transition(from: ExtensionState, to: ExtensionState) -> bool {
        use ExtensionState::*;
        matches!(
            (from, to),
            (Unknown, Discovered)
                | (Discovered, Parsing)
                | (Parsing, Parsed)
                | (Parsing, Corrupted)
                | (Parsed, Resolving)
                | (Resolving, Resolved)
                | (Resolving, Unresolved)
                | (Resolving, Disabled)
                | (Resolving, Skipped)
                | (Resolved, Loading)
                | (Resolved, Skipped)
                | (Loading, Loaded)
                | (Loading, Failed)
                | (Loaded, Exporting)
                | (Loaded, Running)
                | (Loaded, Skipped)
                | (Exporting, Exported)
                | (Exporting, Failed)
                | (Exported, Starting)
                | (Exported, Skipped)
                | (Starting, Started)
                | (Starting, Failed)
                | (Started, Running)
                | (Running, Ending)
                | (Ending, Ended)
                | (Ended, Terminating)
                | (Terminating, Terminated)
        )
    }
}

impl Default for ExtensionState {
    fn default() -> Self {
        ExtensionState::Unknown
    }
}

impl std::fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

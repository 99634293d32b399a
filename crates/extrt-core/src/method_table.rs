//! Compact record of which lifecycle hooks a loaded extension implements
//! (spec §3, §6.1, SPEC_FULL.md supplemented feature #3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct MethodTable {
    pub has_update: bool,
    pub has_start: bool,
    pub has_end: bool,
    pub has_export: bool,
}

impl MethodTable {
    pub const NONE: MethodTable = MethodTable {
        has_update: false,
        has_start: false,
        has_end: false,
        has_export: false,
    };
}

//! Loader flag bitset (spec §4.6), grounded in
//! `original_source/include/plugify/core/load_flag.hpp`. Hand-rolled rather
//! than pulled from the `bitflags` crate: the set is small, fixed, and never
//! needs the macro's serde/iterator extras.

use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadFlags(u32);

impl LoadFlags {
    pub const NONE: LoadFlags = LoadFlags(0);
    pub const LAZY: LoadFlags = LoadFlags(1 << 0);
    pub const NOW: LoadFlags = LoadFlags(1 << 1);
    pub const GLOBAL: LoadFlags = LoadFlags(1 << 2);
    pub const LOCAL: LoadFlags = LoadFlags(1 << 3);
    pub const DEEPBIND: LoadFlags = LoadFlags(1 << 4);
    pub const NO_UNLOAD: LoadFlags = LoadFlags(1 << 5);
    pub const SEARCH_USER_DIRS: LoadFlags = LoadFlags(1 << 6);
    pub const SEARCH_SYSTEM32: LoadFlags = LoadFlags(1 << 7);
    pub const SEARCH_DLL_LOAD_DIR: LoadFlags = LoadFlags(1 << 8);
    pub const DONT_RESOLVE_DLL_REFERENCES: LoadFlags = LoadFlags(1 << 9);

    pub fn contains(self, flag: LoadFlags) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for LoadFlags {
    type Output = LoadFlags;
    fn bitor(self, rhs: LoadFlags) -> LoadFlags {
        LoadFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for LoadFlags {
    fn bitor_assign(&mut self, rhs: LoadFlags) {
        self.0 |= rhs.0;
    }
}

/// The flag set `LoadingStage` requests for a language-module runtime
/// library (spec §4.4.3), with `Deepbind` folded in when the config prefers
/// the module's own symbol resolution.
pub fn module_load_flags(prefer_own_symbols: bool) -> LoadFlags {
    let mut flags = LoadFlags::LAZY
        | LoadFlags::GLOBAL
        | LoadFlags::SEARCH_USER_DIRS
        | LoadFlags::SEARCH_SYSTEM32
        | LoadFlags::SEARCH_DLL_LOAD_DIR;
    if prefer_own_symbols {
        flags |= LoadFlags::DEEPBIND;
    }
    flags
}

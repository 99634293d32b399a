//! The C-ABI v-table a language module exports (spec §6.1), grounded in
//! `original_source/include/plugify/language_module.hpp`'s `ILanguageModule`.
//!
//! The original is a C++ virtual-call interface; we don't have a portable
//! way to call across a vtable pointer without knowing the foreign
//! compiler's ABI, so we model the boundary as a flat struct of `extern "C"`
//! function pointers instead, in a fixed order the module and the host both
//! agree on. `GetLanguageModule` is the one symbol every module exports; it
//! returns a pointer to one of these.

use std::os::raw::c_char;

use extrt_core::MethodTable;

/// Exported as `GetLanguageModule` by every language module (spec §6.1).
pub type GetLanguageModuleFn = unsafe extern "C" fn() -> *const RawLanguageModuleVTable;

#[repr(C)]
pub struct RawMethodBinding {
    pub method_index: usize,
    pub address: usize,
}

#[repr(C)]
pub struct RawInitResult {
    pub ok: bool,
    pub table: MethodTable,
    /// NUL-terminated, owned by the module; valid only for the duration of
    /// the call that produced it.
    pub error: *const c_char,
}

#[repr(C)]
pub struct RawLoadResult {
    pub ok: bool,
    pub user_data: usize,
    pub table: MethodTable,
    pub methods: *const RawMethodBinding,
    pub methods_len: usize,
    pub error: *const c_char,
}

/// Fixed-order, ABI-stable table of entry points (spec §6.1 "order and
/// signatures are ABI-stable across the core/module boundary"). `extension`
/// and `plugin` are opaque addresses of the host-side `Extension`; a module
/// never dereferences them, it only passes them back through provider calls
/// it doesn't have in this scope.
#[repr(C)]
pub struct RawLanguageModuleVTable {
    pub initialize: unsafe extern "C" fn(provider: *const (), extension: *const ()) -> RawInitResult,
    pub shutdown: unsafe extern "C" fn(),
    pub on_update: unsafe extern "C" fn(delta_millis: u64),
    pub on_plugin_load: unsafe extern "C" fn(plugin: *const ()) -> RawLoadResult,
    pub on_plugin_start: unsafe extern "C" fn(plugin: *const ()),
    pub on_plugin_update: unsafe extern "C" fn(plugin: *const (), delta_millis: u64),
    pub on_plugin_end: unsafe extern "C" fn(plugin: *const ()),
    pub on_method_export: unsafe extern "C" fn(plugin: *const ()),
    pub is_debug_build: unsafe extern "C" fn() -> bool,
}

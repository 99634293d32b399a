//! The host-side view of a loaded language module (spec §6.1), grounded in
//! `original_source/include/plugify/language_module.hpp`'s `ILanguageModule`.

use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use extrt_core::{Assembly, MethodTable};
use extrt_foundation::{ExtError, ExtResult};
use extrt_manifest::Method;
use extrt_types::Address;

use crate::raw_abi::RawLanguageModuleVTable;
use crate::safe_call::safe_call;

/// Result of [`LanguageModule::initialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InitData {
    pub table: MethodTable,
}

/// Result of [`LanguageModule::on_plugin_load`].
#[derive(Debug, Clone)]
pub struct LoadData {
    pub methods: Vec<(Method, Address)>,
    pub user_data: Address,
    pub table: MethodTable,
}

/// Capabilities the host exposes back to a language module during
/// `initialize`. The distilled spec names the parameter but not its
/// surface; we expose what a module plausibly needs and nothing it would
/// have to fake: where extensions live and where its own log lines should
/// be attributed.
#[derive(Debug, Clone)]
pub struct Provider {
    pub base_dir: PathBuf,
    pub log_target: String,
}

impl Provider {
    pub fn new(base_dir: impl Into<PathBuf>, log_target: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            log_target: log_target.into(),
        }
    }
}

/// Host-side handle to a loaded language module's lifecycle hooks. One
/// implementation, [`NativeLanguageModule`], calls through a resolved
/// [`RawLanguageModuleVTable`]; tests can substitute their own.
pub trait LanguageModule: Send + Sync {
    fn initialize(&self, provider: &Provider, extension_name: &str) -> ExtResult<InitData>;
    fn shutdown(&self, extension_name: &str) -> ExtResult<()>;
    fn on_update(&self, extension_name: &str, delta: Duration) -> ExtResult<()>;
    fn on_plugin_load(&self, plugin_name: &str) -> ExtResult<LoadData>;
    fn on_plugin_start(&self, plugin_name: &str) -> ExtResult<()>;
    fn on_plugin_update(&self, plugin_name: &str, delta: Duration) -> ExtResult<()>;
    fn on_plugin_end(&self, plugin_name: &str) -> ExtResult<()>;
    fn on_method_export(&self, plugin_name: &str) -> ExtResult<()>;
    fn is_debug_build(&self) -> bool;
}

/// Calls through a `RawLanguageModuleVTable` resolved from a loaded
/// assembly. Holds the assembly alive for as long as the module is in use,
/// since the v-table's function pointers live inside it.
pub struct NativeLanguageModule {
    vtable: *const RawLanguageModuleVTable,
    _assembly: Arc<dyn Assembly>,
}

// SAFETY: the v-table is a set of function pointers into mapped, executable
// code that doesn't change once loaded; calling through it from any thread
// is exactly what the ABI contract promises.
unsafe impl Send for NativeLanguageModule {}
unsafe impl Sync for NativeLanguageModule {}

impl NativeLanguageModule {
    /// # Safety
    /// `vtable` must point to a valid, fully-initialized
    /// `RawLanguageModuleVTable` for as long as `assembly` (which keeps the
    /// owning library mapped) is alive.
    pub unsafe fn new(vtable: *const RawLanguageModuleVTable, assembly: Arc<dyn Assembly>) -> Self {
        Self {
            vtable,
            _assembly: assembly,
        }
    }

    fn vtable(&self) -> &RawLanguageModuleVTable {
        // SAFETY: guaranteed valid for our lifetime per `new`'s contract.
        unsafe { &*self.vtable }
    }
}

/// The ABI's `self_ext`/`plugin` parameter is documented as a reference to
/// the calling `Extension`; we don't hand the module our own `Extension`
/// layout (it's private to `extrt-core` and not part of the ABI contract),
/// so we pass the one piece of it the ABI can use safely across the FFI
/// boundary: a NUL-terminated copy of its name, the same identity already
/// threaded through every `LanguageModule` method as `extension_name`.
fn extension_handle(name: &str) -> CString {
    CString::new(name).unwrap_or_default()
}

fn raw_error(prefix: &str, ptr: *const std::os::raw::c_char) -> ExtError {
    if ptr.is_null() {
        ExtError::initialization_failed(prefix.to_string())
    } else {
        // SAFETY: the module promises a NUL-terminated string for the
        // duration of the call that returned it, which includes this read.
        let message = unsafe { CStr::from_ptr(ptr) }.to_string_lossy();
        ExtError::initialization_failed(format!("{prefix}: {message}"))
    }
}

impl LanguageModule for NativeLanguageModule {
    fn initialize(&self, provider: &Provider, extension_name: &str) -> ExtResult<InitData> {
        let vtable = self.vtable();
        let handle = extension_handle(extension_name);
        let raw = safe_call("initialize", extension_name, || {
            let provider_ptr = provider as *const Provider as *const ();
            // SAFETY: `initialize` is called at most once per module, before
            // any other entry point, per spec §4.3's state machine.
            unsafe { (vtable.initialize)(provider_ptr, handle.as_ptr() as *const ()) }
        })?;
        if raw.ok {
            Ok(InitData { table: raw.table })
        } else {
            Err(raw_error("language module initialize() failed", raw.error))
        }
    }

    fn shutdown(&self, extension_name: &str) -> ExtResult<()> {
        let vtable = self.vtable();
        safe_call("shutdown", extension_name, || unsafe { (vtable.shutdown)() })
    }

    fn on_update(&self, extension_name: &str, delta: Duration) -> ExtResult<()> {
        let vtable = self.vtable();
        let millis = delta.as_millis() as u64;
        safe_call("on_update", extension_name, || unsafe {
            (vtable.on_update)(millis)
        })
    }

    fn on_plugin_load(&self, plugin_name: &str) -> ExtResult<LoadData> {
        let vtable = self.vtable();
        let handle = extension_handle(plugin_name);
        let raw = safe_call("on_plugin_load", plugin_name, || unsafe {
            (vtable.on_plugin_load)(handle.as_ptr() as *const ())
        })?;
        if !raw.ok {
            return Err(raw_error("language module OnPluginLoad() failed", raw.error));
        }
        let methods = if raw.methods.is_null() || raw.methods_len == 0 {
            Vec::new()
        } else {
            // SAFETY: `ok` is true, so the module promises `methods` points
            // to `methods_len` valid `RawMethodBinding`s for this call.
            let bindings = unsafe { std::slice::from_raw_parts(raw.methods, raw.methods_len) };
            bindings
                .iter()
                .map(|b| (placeholder_method(b.method_index), Address::new(b.address)))
                .collect()
        };
        Ok(LoadData {
            methods,
            user_data: Address::new(raw.user_data),
            table: raw.table,
        })
    }

    fn on_plugin_start(&self, plugin_name: &str) -> ExtResult<()> {
        let vtable = self.vtable();
        let handle = extension_handle(plugin_name);
        safe_call("on_plugin_start", plugin_name, || unsafe {
            (vtable.on_plugin_start)(handle.as_ptr() as *const ())
        })
    }

    fn on_plugin_update(&self, plugin_name: &str, delta: Duration) -> ExtResult<()> {
        let vtable = self.vtable();
        let millis = delta.as_millis() as u64;
        let handle = extension_handle(plugin_name);
        safe_call("on_plugin_update", plugin_name, || unsafe {
            (vtable.on_plugin_update)(handle.as_ptr() as *const (), millis)
        })
    }

    fn on_plugin_end(&self, plugin_name: &str) -> ExtResult<()> {
        let vtable = self.vtable();
        let handle = extension_handle(plugin_name);
        safe_call("on_plugin_end", plugin_name, || unsafe {
            (vtable.on_plugin_end)(handle.as_ptr() as *const ())
        })
    }

    fn on_method_export(&self, plugin_name: &str) -> ExtResult<()> {
        let vtable = self.vtable();
        let handle = extension_handle(plugin_name);
        safe_call("on_method_export", plugin_name, || unsafe {
            (vtable.on_method_export)(handle.as_ptr() as *const ())
        })
    }

    fn is_debug_build(&self) -> bool {
        let vtable = self.vtable();
        // A debug-build query can't meaningfully fail; a panic here still
        // shouldn't be fatal, so fall back to `false` rather than unwrap.
        safe_call("is_debug_build", "<module>", || unsafe {
            (vtable.is_debug_build)()
        })
        .unwrap_or(false)
    }
}

/// The raw ABI only tells us a method's resolved `Address`, keyed by its
/// position in the plugin's own manifest; the manifest (already parsed and
/// held by the stage driving this call) is the source of truth for the
/// `Method` signature itself, so callers reassociate `methods[i].0` with
/// `manifest.exported_methods[i]` rather than trusting this placeholder.
fn placeholder_method(index: usize) -> Method {
    use extrt_manifest::{CallingConvention, Property};
    use extrt_types::ValueType;

    Method {
        name: format!("#{index}"),
        func_name: String::new(),
        calling_convention: CallingConvention::Cdecl,
        return_type: Property::scalar(ValueType::Void),
        params: Vec::new(),
        var_index: extrt_manifest::method::NO_VAR_ARGS,
    }
}

//! Resolves a loaded module assembly's `GetLanguageModule` export into a
//! [`LanguageModule`] handle (spec §4.3, §6.1).

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use extrt_core::Assembly;
use extrt_foundation::{ExtError, ExtResult};
use extrt_platform::{LoadFlags, PlatformOps};

use crate::language_module::{LanguageModule, NativeLanguageModule};
use crate::raw_abi::GetLanguageModuleFn;

/// Fixed export name every language module must provide (spec §6.1).
pub const ENTRY_POINT_SYMBOL: &str = "GetLanguageModule";

/// Loads module libraries through a [`PlatformOps`] and resolves them into
/// [`LanguageModule`] handles.
pub struct ExtensionLoader {
    platform: Arc<dyn PlatformOps>,
}

impl ExtensionLoader {
    pub fn new(platform: Arc<dyn PlatformOps>) -> Self {
        Self { platform }
    }

    /// Loads the shared library at `path` and resolves its
    /// `GetLanguageModule` export, returning both the module handle and the
    /// assembly backing it (the caller stores the assembly on the
    /// `Extension` so it outlives the module).
    pub fn load_module(
        &self,
        path: &Path,
        flags: LoadFlags,
    ) -> ExtResult<(Arc<dyn LanguageModule>, Arc<dyn Assembly>)> {
        let assembly = self.platform.load_library(path, flags)?;
        let module = self.resolve(Arc::clone(&assembly))?;
        Ok((module, assembly))
    }

    fn resolve(&self, assembly: Arc<dyn Assembly>) -> ExtResult<Arc<dyn LanguageModule>> {
        let entry = assembly.get_symbol(ENTRY_POINT_SYMBOL)?;
        debug!(symbol = ENTRY_POINT_SYMBOL, address = %entry, "resolved language module entry point");

        if entry.is_null() {
            return Err(ExtError::language_module_not_loaded(
                assembly.path().display().to_string(),
            ));
        }

        // SAFETY: `entry` was resolved from the library's own symbol table
        // under the name the ABI contract reserves for exactly this
        // function pointer type.
        let get_module: GetLanguageModuleFn =
            unsafe { std::mem::transmute::<*const (), GetLanguageModuleFn>(entry.cast::<()>()) };
        // SAFETY: calling a module-supplied entry point is the one call we
        // cannot wrap in `safe_call` (it hasn't returned a `LanguageModule`
        // to call through yet); a well-formed module returns a non-null,
        // `'static` v-table pointer here.
        let vtable = unsafe { get_module() };
        if vtable.is_null() {
            return Err(ExtError::language_module_not_loaded(
                assembly.path().display().to_string(),
            ));
        }

        // SAFETY: `vtable` is non-null and the module is contractually
        // obligated to keep it valid for as long as the library stays
        // mapped, which `assembly` guarantees.
        let module = unsafe { NativeLanguageModule::new(vtable, assembly) };
        Ok(Arc::new(module))
    }
}

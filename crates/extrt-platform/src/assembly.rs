//! Owning handle to a loaded shared library (spec C2 "Assembly"), grounded
//! in `original_source/include/plugify/core/assembly.hpp`.

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use extrt_core::Assembly;
use extrt_foundation::{ExtError, ExtResult};
use extrt_types::Address;

/// `libloading`-backed [`Assembly`]. Dropping it unloads the library unless
/// the loader requested [`crate::LoadFlags::NO_UNLOAD`], in which case the
/// handle is leaked deliberately (spec §4.6 "NoUnload").
pub struct NativeAssembly {
    library: Option<libloading::Library>,
    path: PathBuf,
}

impl NativeAssembly {
    pub(crate) fn new(library: libloading::Library, path: PathBuf, leak: bool) -> Self {
        Self {
            library: if leak { None } else { Some(library) },
            path,
        }
    }
}

impl Assembly for NativeAssembly {
    fn path(&self) -> &Path {
        &self.path
    }

    fn get_symbol(&self, name: &str) -> ExtResult<Address> {
        let Some(library) = self.library.as_ref() else {
            return Err(ExtError::initialization_failed(format!(
                "{}: library handle was leaked, symbols are no longer resolvable",
                self.path.display()
            )));
        };
        let mut symbol_name = name.as_bytes().to_vec();
        symbol_name.push(0);
        // SAFETY: `symbol_name` is NUL-terminated and `library` outlives the
        // borrow; the raw pointer is never dereferenced by this crate.
        unsafe {
            let symbol = library
                .get::<*mut c_void>(&symbol_name)
                .map_err(|e| symbol_not_found(&self.path, name, &e))?;
            Ok(Address::from_ptr(*symbol))
        }
    }
}

fn symbol_not_found(path: &Path, name: &str, source: &libloading::Error) -> ExtError {
    ExtError::initialization_failed(format!(
        "{}: symbol '{name}' not found: {source}",
        path.display()
    ))
}

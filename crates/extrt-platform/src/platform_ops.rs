//! Platform loader abstraction (spec §4.6), grounded in
//! `original_source/include/plugify/core/platform_ops.hpp`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::debug;

use extrt_core::Assembly;
use extrt_foundation::{ExtError, ExtResult};

use crate::assembly::NativeAssembly;
use crate::load_flag::LoadFlags;

/// A single object providing library loading, symbol resolution, and
/// search-path management. Unsupported operations return an error rather
/// than silently succeeding (spec §4.6).
#[cfg_attr(feature = "test-util", mockall::automock)]
pub trait PlatformOps: Send + Sync {
    fn load_library(&self, path: &Path, flags: LoadFlags) -> ExtResult<Arc<dyn Assembly>>;

    /// Drops the last reference to `assembly`. A no-op beyond that unless
    /// the concrete implementation tracks extra bookkeeping.
    fn unload_library(&self, assembly: Arc<dyn Assembly>) -> ExtResult<()> {
        drop(assembly);
        Ok(())
    }

    fn get_symbol(&self, assembly: &dyn Assembly, name: &str) -> ExtResult<extrt_types::Address> {
        assembly.get_symbol(name)
    }

    fn get_library_path(&self, assembly: &dyn Assembly) -> PathBuf {
        assembly.path().to_path_buf()
    }

    fn supports_runtime_path_modification(&self) -> bool;
    fn supports_lazy_binding(&self) -> bool;

    fn add_search_path(&self, path: &Path) -> ExtResult<()> {
        let _ = path;
        Err(unsupported())
    }

    fn remove_search_path(&self, path: &Path) -> ExtResult<()> {
        let _ = path;
        Err(unsupported())
    }
}

fn unsupported() -> ExtError {
    ExtError::validation_failed("Runtime path modification not supported on this platform")
}

/// `libloading`-backed [`PlatformOps`]. Search paths added via
/// [`PlatformOps::add_search_path`] are tried, in order, ahead of the bare
/// path when resolving a library (spec §6.4): we don't mutate a process-wide
/// loader search path portably, so we emulate it at the call site instead.
pub struct NativePlatformOps {
    search_paths: RwLock<Vec<PathBuf>>,
}

impl Default for NativePlatformOps {
    fn default() -> Self {
        Self::new()
    }
}

impl NativePlatformOps {
    pub fn new() -> Self {
        Self {
            search_paths: RwLock::new(Vec::new()),
        }
    }

    fn candidate_paths(&self, path: &Path) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = if path.is_absolute() {
            Vec::new()
        } else {
            self.search_paths
                .read()
                .expect("search path lock poisoned")
                .iter()
                .map(|dir| dir.join(path))
                .collect()
        };
        candidates.push(path.to_path_buf());
        candidates
    }
}

impl PlatformOps for NativePlatformOps {
    fn load_library(&self, path: &Path, flags: LoadFlags) -> ExtResult<Arc<dyn Assembly>> {
        let leak = flags.contains(LoadFlags::NO_UNLOAD);
        let mut last_error = None;

        for candidate in self.candidate_paths(path) {
            debug!(path = %candidate.display(), "attempting to load library");
            // SAFETY: the extension's manifest names a path the host trusts
            // to contain a conforming `GetLanguageModule` export; running
            // its static initializers is an accepted part of loading it.
            match unsafe { libloading::Library::new(&candidate) } {
                Ok(library) => {
                    return Ok(Arc::new(NativeAssembly::new(library, candidate, leak)));
                }
                Err(e) => last_error = Some((candidate, e)),
            }
        }

        match last_error {
            Some((candidate, e)) => Err(ExtError::initialization_failed(format!(
                "{}: {e}",
                candidate.display()
            ))),
            None => Err(ExtError::initialization_failed(format!(
                "{}: no candidate paths",
                path.display()
            ))),
        }
    }

    fn supports_runtime_path_modification(&self) -> bool {
        true
    }

    fn supports_lazy_binding(&self) -> bool {
        cfg!(unix)
    }

    fn add_search_path(&self, path: &Path) -> ExtResult<()> {
        self.search_paths
            .write()
            .expect("search path lock poisoned")
            .push(path.to_path_buf());
        Ok(())
    }

    fn remove_search_path(&self, path: &Path) -> ExtResult<()> {
        self.search_paths
            .write()
            .expect("search path lock poisoned")
            .retain(|p| p != path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_a_nonexistent_library_is_an_error_not_a_panic() {
        let ops = NativePlatformOps::new();
        let result = ops.load_library(Path::new("/nonexistent/libfoo.so"), LoadFlags::NONE);
        assert!(result.is_err());
    }

    #[test]
    fn search_paths_are_tried_before_the_bare_relative_path() {
        let ops = NativePlatformOps::new();
        ops.add_search_path(Path::new("/opt/extensions")).unwrap();
        let candidates = ops.candidate_paths(Path::new("libpython.so"));
        assert_eq!(candidates[0], PathBuf::from("/opt/extensions/libpython.so"));
        assert_eq!(candidates[1], PathBuf::from("libpython.so"));
    }
}

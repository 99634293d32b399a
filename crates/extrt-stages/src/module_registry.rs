//! Registry of loaded language modules, keyed by the language they
//! implement (spec §4.4.3 "`_loadedModules`"). Shared (via cheap `Clone`)
//! across `LoadingStage`, `ExportingStage`, and `StartingStage` so the
//! later stages can see every module `LoadingStage` brought up — the
//! original recomputes an equivalent list in `ExportingStage::Setup`, which
//! our stage trait has no hook for.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use extrt_loader::LanguageModule;

#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: Arc<RwLock<FxHashMap<String, Arc<dyn LanguageModule>>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, language: impl Into<String>, module: Arc<dyn LanguageModule>) {
        self.modules
            .write()
            .expect("module registry lock poisoned")
            .insert(language.into(), module);
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn LanguageModule>> {
        self.modules
            .read()
            .expect("module registry lock poisoned")
            .get(language)
            .cloned()
    }

    /// Every currently-registered module, for stages (like Exporting) that
    /// broadcast to all of them rather than look one up by language.
    pub fn all(&self) -> Vec<Arc<dyn LanguageModule>> {
        self.modules
            .read()
            .expect("module registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

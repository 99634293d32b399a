//! Loading stage (spec §4.4.3): loads a module's shared library or loads a
//! plugin into its already-loaded language module. Grounded in
//! `original_source/src/core/stages_impl.hpp`'s `LoadingStage`.

use std::sync::Arc;

use extrt_core::{Extension, ExtensionState};
use extrt_foundation::{ExtError, ExtResult};
use extrt_loader::{ExtensionLoader, Provider};
use extrt_manifest::Method;
use extrt_pipeline::{PipelineContext, SequentialStage};
use extrt_platform::{module_load_flags, PlatformOps};
use extrt_types::Address;

use crate::common::{check_dependency_failure, check_timeout, handle_operation_failure};
use crate::module_registry::ModuleRegistry;

/// The raw ABI only tells us a method's resolved `Address`, keyed by its
/// position in the plugin's own manifest (spec §4.4.3, testable property 3);
/// reassociate each loaded address with the manifest's own `Method` (the
/// source of truth for the signature) rather than trust the loader's
/// placeholder, and reject the load if the counts don't match or an address
/// came back null. Reports up to 10 mismatches, then summarizes the rest.
fn reassociate_methods(
    manifest_methods: &[Method],
    loaded: Vec<(Method, Address)>,
) -> ExtResult<Vec<(Method, Address)>> {
    if loaded.len() != manifest_methods.len() {
        return Err(ExtError::validation_failed(format!(
            "method table size mismatch: manifest declares {} method(s), module returned {}",
            manifest_methods.len(),
            loaded.len()
        )));
    }

    let mut mismatches = Vec::new();
    let mut total_mismatched = 0usize;
    let mut result = Vec::with_capacity(loaded.len());
    for (index, (manifest_method, (_, address))) in manifest_methods.iter().zip(loaded).enumerate() {
        if address.is_null() {
            total_mismatched += 1;
            if mismatches.len() < 10 {
                mismatches.push(format!("#{index} '{}': null address", manifest_method.name));
            }
        }
        result.push((manifest_method.clone(), address));
    }

    if total_mismatched > 0 {
        let mut message = format!(
            "{total_mismatched} method(s) failed validation: {}",
            mismatches.join("; ")
        );
        if total_mismatched > mismatches.len() {
            message.push_str(&format!(" (and {} more)", total_mismatched - mismatches.len()));
        }
        return Err(ExtError::validation_failed(message));
    }

    Ok(result)
}

pub struct LoadingStage {
    loader: ExtensionLoader,
    modules: ModuleRegistry,
}

impl LoadingStage {
    pub fn new(platform: Arc<dyn PlatformOps>, modules: ModuleRegistry) -> Self {
        Self {
            loader: ExtensionLoader::new(platform),
            modules,
        }
    }

    fn load_module_extension(&self, ext: &mut Extension, prefer_own_symbols: bool) -> ExtResult<()> {
        let manifest = ext
            .manifest()
            .ok_or_else(|| ExtError::invalid_manifest("module has no manifest"))?;
        let path = manifest.runtime_path(ext.location());
        let language = manifest.language.clone();
        let flags = module_load_flags(prefer_own_symbols);
        let location = ext.location().to_path_buf();
        let name = ext.name().to_string();

        let (module, assembly) = self.loader.load_module(&path, flags)?;
        ext.set_assembly(assembly);
        ext.set_language_module(Address::from_ptr(Arc::as_ptr(&module) as *const ()));

        let provider = Provider::new(location, language.clone());
        let init = module.initialize(&provider, &name)?;
        ext.set_method_table(init.table);

        self.modules.register(language, module);
        Ok(())
    }

    fn load_plugin_extension(&self, ext: &mut Extension) -> ExtResult<()> {
        let manifest = ext
            .manifest()
            .ok_or_else(|| ExtError::invalid_manifest("plugin has no manifest"))?;
        let language = manifest.language.clone();
        let manifest_methods = manifest.methods.clone();

        let module = self
            .modules
            .get(&language)
            .ok_or_else(|| ExtError::language_module_not_loaded(language.clone()))?;

        let load = module.on_plugin_load(ext.name())?;
        let methods = reassociate_methods(&manifest_methods, load.methods)?;
        ext.set_method_data(methods);
        ext.set_user_data(load.user_data);
        ext.set_method_table(load.table);
        ext.set_language_module(Address::from_ptr(Arc::as_ptr(&module) as *const ()));
        Ok(())
    }
}

impl SequentialStage for LoadingStage {
    fn name(&self) -> &str {
        "Loading"
    }

    fn should_process(&self, ext: &Extension) -> bool {
        ext.state() == ExtensionState::Resolved
    }

    fn process_item(
        &self,
        ext: &mut Extension,
        _pos: usize,
        _total: usize,
        ctx: &PipelineContext,
    ) -> ExtResult<()> {
        if let Some(result) = check_dependency_failure(ctx, ext) {
            return result;
        }

        ext.start_operation(ExtensionState::Loading)?;

        let result = if ext.is_module() {
            self.load_module_extension(ext, ctx.config.loading.prefer_own_symbols)
        } else {
            self.load_plugin_extension(ext)
        };

        if let Err(e) = &result {
            handle_operation_failure(ctx, ext, e, ExtensionState::Failed);
            return result;
        }

        ext.end_operation(ExtensionState::Loaded)?;
        check_timeout(ext, ExtensionState::Loading, ctx.config.timeouts.loading);

        if ext.is_module() {
            ext.start_operation(ExtensionState::Running)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use extrt_core::Assembly;
    use extrt_loader::LoadData;
    use extrt_manifest::{ExtensionType, Manifest};
    use extrt_types::{UniqueId, Version};

    fn manifest(name: &str, extension_type: ExtensionType, language: &str) -> Manifest {
        Manifest {
            name: name.to_string(),
            version: "1.0.0".parse::<Version>().unwrap(),
            language: language.to_string(),
            extension_type,
            description: String::new(),
            author: String::new(),
            website: String::new(),
            license: String::new(),
            platforms: Vec::new(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            obsoletes: Vec::new(),
            entry: String::new(),
            methods: Vec::new(),
            runtime: None,
            directories: Vec::new(),
        }
    }

    fn resolved_extension(name: &str, extension_type: ExtensionType, language: &str) -> Extension {
        let mut ext = Extension::new(
            UniqueId::new(name),
            extension_type,
            PathBuf::from(format!("/ext/{name}")),
        );
        ext.set_manifest(manifest(name, extension_type, language));
        ext.set_state(ExtensionState::Parsing).unwrap();
        ext.set_state(ExtensionState::Parsed).unwrap();
        ext.set_state(ExtensionState::Resolving).unwrap();
        ext.set_state(ExtensionState::Resolved).unwrap();
        ext
    }

    struct FailingPlatformOps;
    impl PlatformOps for FailingPlatformOps {
        fn load_library(
            &self,
            _path: &Path,
            _flags: extrt_platform::LoadFlags,
        ) -> ExtResult<Arc<dyn Assembly>> {
            Err(ExtError::initialization_failed("no such library"))
        }
        fn supports_runtime_path_modification(&self) -> bool {
            false
        }
        fn supports_lazy_binding(&self) -> bool {
            false
        }
    }

    fn ctx() -> PipelineContext {
        PipelineContext::new(extrt_config::Config::default())
    }

    #[test]
    fn module_loading_asks_the_platform_for_the_manifests_runtime_path() {
        use extrt_platform::MockPlatformOps;

        let mut mock = MockPlatformOps::new();
        mock.expect_load_library()
            .once()
            .withf(|path, _flags| {
                let path = path.to_string_lossy();
                path.contains("bin") && path.contains("python")
            })
            .returning(|_, _| Err(ExtError::initialization_failed("no such library")));

        let stage = LoadingStage::new(Arc::new(mock), ModuleRegistry::new());
        let mut ext = resolved_extension("py", ExtensionType::Module, "python");
        let ctx = ctx();
        assert!(stage.process_item(&mut ext, 0, 1, &ctx).is_err());
        assert_eq!(ext.state(), ExtensionState::Failed);
    }

    #[test]
    fn module_load_failure_marks_extension_failed() {
        let stage = LoadingStage::new(Arc::new(FailingPlatformOps), ModuleRegistry::new());
        let mut ext = resolved_extension("py", ExtensionType::Module, "python");
        let ctx = ctx();
        assert!(stage.process_item(&mut ext, 0, 1, &ctx).is_err());
        assert_eq!(ext.state(), ExtensionState::Failed);
        assert!(ctx.failure_tracker.has_failed(ext.id()));
    }

    #[test]
    fn plugin_without_its_language_module_loaded_fails_cleanly() {
        let stage = LoadingStage::new(Arc::new(FailingPlatformOps), ModuleRegistry::new());
        let mut ext = resolved_extension("alpha", ExtensionType::Plugin, "python");
        let ctx = ctx();
        assert!(stage.process_item(&mut ext, 0, 1, &ctx).is_err());
        assert_eq!(ext.state(), ExtensionState::Failed);
    }

    struct FixedLoadModule(LoadData);
    impl extrt_loader::LanguageModule for FixedLoadModule {
        fn initialize(&self, _: &Provider, _: &str) -> ExtResult<extrt_loader::InitData> {
            unimplemented!()
        }
        fn shutdown(&self, _: &str) -> ExtResult<()> {
            Ok(())
        }
        fn on_update(&self, _: &str, _: std::time::Duration) -> ExtResult<()> {
            Ok(())
        }
        fn on_plugin_load(&self, _: &str) -> ExtResult<LoadData> {
            Ok(self.0.clone())
        }
        fn on_plugin_start(&self, _: &str) -> ExtResult<()> {
            Ok(())
        }
        fn on_plugin_update(&self, _: &str, _: std::time::Duration) -> ExtResult<()> {
            Ok(())
        }
        fn on_plugin_end(&self, _: &str) -> ExtResult<()> {
            Ok(())
        }
        fn on_method_export(&self, _: &str) -> ExtResult<()> {
            Ok(())
        }
        fn is_debug_build(&self) -> bool {
            false
        }
    }

    fn declared_method(name: &str) -> extrt_manifest::Method {
        extrt_manifest::Method {
            name: name.to_string(),
            func_name: name.to_string(),
            calling_convention: extrt_manifest::CallingConvention::Cdecl,
            return_type: extrt_manifest::Property::scalar(extrt_types::ValueType::Void),
            params: Vec::new(),
            var_index: extrt_manifest::method::NO_VAR_ARGS,
        }
    }

    #[test]
    fn plugin_load_reassociates_addresses_with_manifest_methods() {
        let registry = ModuleRegistry::new();
        registry.register(
            "python",
            Arc::new(FixedLoadModule(LoadData {
                methods: vec![(declared_method("placeholder"), Address::new(0x1000))],
                user_data: Address::new(0),
                table: extrt_core::MethodTable::NONE,
            })),
        );
        let stage = LoadingStage::new(Arc::new(FailingPlatformOps), registry);
        let mut ext = resolved_extension("alpha", ExtensionType::Plugin, "python");
        ext.set_manifest(Manifest {
            methods: vec![declared_method("do_thing")],
            ..manifest("alpha", ExtensionType::Plugin, "python")
        });
        let ctx = ctx();
        stage.process_item(&mut ext, 0, 1, &ctx).unwrap();
        assert_eq!(ext.method_data().len(), 1);
        assert_eq!(ext.method_data()[0].0.name, "do_thing");
        assert_eq!(ext.method_data()[0].1, Address::new(0x1000));
    }

    #[test]
    fn plugin_load_rejects_a_method_count_mismatch() {
        let registry = ModuleRegistry::new();
        registry.register(
            "python",
            Arc::new(FixedLoadModule(LoadData {
                methods: Vec::new(),
                user_data: Address::new(0),
                table: extrt_core::MethodTable::NONE,
            })),
        );
        let stage = LoadingStage::new(Arc::new(FailingPlatformOps), registry);
        let mut ext = resolved_extension("alpha", ExtensionType::Plugin, "python");
        ext.set_manifest(Manifest {
            methods: vec![declared_method("do_thing")],
            ..manifest("alpha", ExtensionType::Plugin, "python")
        });
        let ctx = ctx();
        assert!(stage.process_item(&mut ext, 0, 1, &ctx).is_err());
        assert_eq!(ext.state(), ExtensionState::Failed);
    }

    #[test]
    fn plugin_load_rejects_a_null_method_address() {
        let registry = ModuleRegistry::new();
        registry.register(
            "python",
            Arc::new(FixedLoadModule(LoadData {
                methods: vec![(declared_method("placeholder"), Address::new(0))],
                user_data: Address::new(0),
                table: extrt_core::MethodTable::NONE,
            })),
        );
        let stage = LoadingStage::new(Arc::new(FailingPlatformOps), registry);
        let mut ext = resolved_extension("alpha", ExtensionType::Plugin, "python");
        ext.set_manifest(Manifest {
            methods: vec![declared_method("do_thing")],
            ..manifest("alpha", ExtensionType::Plugin, "python")
        });
        let ctx = ctx();
        assert!(stage.process_item(&mut ext, 0, 1, &ctx).is_err());
        assert_eq!(ext.state(), ExtensionState::Failed);
    }
}

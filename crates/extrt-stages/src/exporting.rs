//! Exporting stage (spec §4.4.4): broadcasts `OnMethodExport` to every
//! running language module for each loaded plugin. Grounded in
//! `original_source/src/core/stages_impl.hpp`'s `ExportingStage`.

use extrt_core::{Extension, ExtensionState};
use extrt_foundation::ExtResult;
use extrt_pipeline::{PipelineContext, SequentialStage};

use crate::common::{check_dependency_failure, check_timeout, handle_operation_failure};
use crate::module_registry::ModuleRegistry;

pub struct ExportingStage {
    modules: ModuleRegistry,
}

impl ExportingStage {
    pub fn new(modules: ModuleRegistry) -> Self {
        Self { modules }
    }
}

impl SequentialStage for ExportingStage {
    fn name(&self) -> &str {
        "Exporting"
    }

    fn should_process(&self, ext: &Extension) -> bool {
        ext.state() == ExtensionState::Loaded && ext.is_plugin()
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

        ext.start_operation(ExtensionState::Exporting)?;

        if ext.method_table().has_export {
            for module in self.modules.all() {
                if let Err(e) = module.on_method_export(ext.name()) {
                    handle_operation_failure(ctx, ext, &e, ExtensionState::Failed);
                    return Err(e);
                }
            }
        }

        ext.end_operation(ExtensionState::Exported)?;
        check_timeout(ext, ExtensionState::Exporting, ctx.config.timeouts.exporting);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use extrt_foundation::ExtError;
    use extrt_loader::{InitData, LanguageModule, LoadData, Provider};
    use extrt_manifest::{ExtensionType, Manifest};
    use extrt_types::{UniqueId, Version};

    struct RecordingModule {
        exported: std::sync::Mutex<Vec<String>>,
    }

    impl LanguageModule for RecordingModule {
        fn initialize(&self, _: &Provider, _: &str) -> ExtResult<InitData> {
            unimplemented!()
        }
        fn shutdown(&self, _: &str) -> ExtResult<()> {
            Ok(())
        }
        fn on_update(&self, _: &str, _: std::time::Duration) -> ExtResult<()> {
            Ok(())
        }
        fn on_plugin_load(&self, _: &str) -> ExtResult<LoadData> {
            unimplemented!()
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
        fn on_method_export(&self, plugin_name: &str) -> ExtResult<()> {
            self.exported.lock().unwrap().push(plugin_name.to_string());
            Ok(())
        }
        fn is_debug_build(&self) -> bool {
            false
        }
    }

    struct FailingModule;
    impl LanguageModule for FailingModule {
        fn initialize(&self, _: &Provider, _: &str) -> ExtResult<InitData> {
            unimplemented!()
        }
        fn shutdown(&self, _: &str) -> ExtResult<()> {
            Ok(())
        }
        fn on_update(&self, _: &str, _: std::time::Duration) -> ExtResult<()> {
            Ok(())
        }
        fn on_plugin_load(&self, _: &str) -> ExtResult<LoadData> {
            unimplemented!()
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
            Err(ExtError::initialization_failed("boom"))
        }
        fn is_debug_build(&self) -> bool {
            false
        }
    }

    fn loaded_plugin(name: &str) -> Extension {
        let mut ext = Extension::new(
            UniqueId::new(name),
            ExtensionType::Plugin,
            PathBuf::from(format!("/ext/{name}")),
        );
        ext.set_manifest(Manifest {
            name: name.to_string(),
            version: "1.0.0".parse::<Version>().unwrap(),
            language: "python".to_string(),
            extension_type: ExtensionType::Plugin,
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
        });
        for state in [
            ExtensionState::Parsing,
            ExtensionState::Parsed,
            ExtensionState::Resolving,
            ExtensionState::Resolved,
            ExtensionState::Loading,
            ExtensionState::Loaded,
        ] {
            ext.set_state(state).unwrap();
        }
        ext.set_method_table(extrt_core::MethodTable {
            has_export: true,
            ..Default::default()
        });
        ext
    }

    fn ctx() -> PipelineContext {
        PipelineContext::new(extrt_config::Config::default())
    }

    #[test]
    fn every_running_module_sees_the_export_event() {
        let registry = ModuleRegistry::new();
        registry.register(
            "python",
            Arc::new(RecordingModule {
                exported: std::sync::Mutex::new(Vec::new()),
            }),
        );
        let stage = ExportingStage::new(registry);
        let mut ext = loaded_plugin("alpha");
        let ctx = ctx();
        stage.process_item(&mut ext, 0, 1, &ctx).unwrap();
        assert_eq!(ext.state(), ExtensionState::Exported);
    }

    #[test]
    fn a_failing_module_fails_the_plugin_being_exported() {
        let registry = ModuleRegistry::new();
        registry.register("python", Arc::new(FailingModule));
        let stage = ExportingStage::new(registry);
        let mut ext = loaded_plugin("alpha");
        let ctx = ctx();
        assert!(stage.process_item(&mut ext, 0, 1, &ctx).is_err());
        assert_eq!(ext.state(), ExtensionState::Failed);
    }

    #[test]
    fn a_plugin_without_on_method_export_skips_every_module() {
        let registry = ModuleRegistry::new();
        registry.register("python", Arc::new(FailingModule));
        let stage = ExportingStage::new(registry);
        let mut ext = loaded_plugin("alpha");
        ext.set_method_table(extrt_core::MethodTable::NONE);
        let ctx = ctx();
        stage.process_item(&mut ext, 0, 1, &ctx).unwrap();
        assert_eq!(ext.state(), ExtensionState::Exported);
    }
}

//! Starting stage (spec §4.4.5): calls `OnPluginStart` on a loaded
//! plugin's language module, then transitions it into `Running`. Grounded
//! in `original_source/src/core/stages_impl.hpp`'s `StartingStage`.

use extrt_core::{Extension, ExtensionState};
use extrt_foundation::{ExtError, ExtResult};
use extrt_pipeline::{PipelineContext, SequentialStage};

use crate::common::{check_dependency_failure, check_timeout, handle_operation_failure};
use crate::module_registry::ModuleRegistry;

pub struct StartingStage {
    modules: ModuleRegistry,
}

impl StartingStage {
    pub fn new(modules: ModuleRegistry) -> Self {
        Self { modules }
    }
}

impl SequentialStage for StartingStage {
    fn name(&self) -> &str {
        "Starting"
    }

    fn should_process(&self, ext: &Extension) -> bool {
        ext.state() == ExtensionState::Exported && ext.is_plugin()
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

        ext.start_operation(ExtensionState::Starting)?;

        if ext.method_table().has_start {
            let language = ext
                .manifest()
                .map(|m| m.language.clone())
                .unwrap_or_default();
            let result = self
                .modules
                .get(&language)
                .ok_or_else(|| ExtError::language_module_not_loaded(language.clone()))
                .and_then(|module| module.on_plugin_start(ext.name()));

            if let Err(e) = &result {
                handle_operation_failure(ctx, ext, e, ExtensionState::Failed);
                return result;
            }
        }

        ext.end_operation(ExtensionState::Started)?;
        check_timeout(ext, ExtensionState::Starting, ctx.config.timeouts.starting);

        ext.start_operation(ExtensionState::Running)?;
        Ok(())
    }
}

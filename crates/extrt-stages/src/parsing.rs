//! Parsing stage (spec §4.4.1): reads and parses a candidate extension's
//! manifest. Grounded in `original_source/src/core/stages_impl.hpp`'s
//! `ParsingStage`.

use std::sync::Arc;

use extrt_core::{Extension, ExtensionState};
use extrt_foundation::ExtResult;
use extrt_manifest::{read_raw, ManifestSource};
use extrt_pipeline::{PipelineContext, TransformStage};

pub struct ParsingStage {
    source: Arc<dyn ManifestSource>,
}

impl ParsingStage {
    pub fn new(source: Arc<dyn ManifestSource>) -> Self {
        Self { source }
    }
}

impl TransformStage for ParsingStage {
    fn name(&self) -> &str {
        "Parsing"
    }

    fn should_process(&self, ext: &Extension) -> bool {
        ext.state() == ExtensionState::Discovered
    }

    fn process_item(&self, ext: &mut Extension, _ctx: &PipelineContext) -> ExtResult<()> {
        ext.start_operation(ExtensionState::Parsing)?;

        let raw = match read_raw(ext.location()) {
            Ok(raw) => raw,
            Err(e) => {
                ext.add_error(e.message.clone());
                ext.end_operation(ExtensionState::Corrupted)?;
                return Err(e);
            }
        };

        match self.source.parse(&raw) {
            Ok(manifest) => {
                ext.set_manifest(manifest);
                ext.end_operation(ExtensionState::Parsed)?;
                Ok(())
            }
            Err(e) => {
                ext.add_error(e.message.clone());
                ext.end_operation(ExtensionState::Corrupted)?;
                Err(e)
            }
        }
    }
}

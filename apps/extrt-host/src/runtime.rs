//! Wires discovery, the staged pipeline, the `Running`-state Update
//! fan-out, and shutdown into one object, the way `apps/mill`'s
//! `dispatcher_factory.rs` assembles a `PluginDispatcher` from its
//! collaborators.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use extrt_config::Config;
use extrt_core::{Extension, ExtensionState};
use extrt_foundation::ExtResult;
use extrt_manifest::JsonManifestSource;
use extrt_pipeline::{PipelineContext, PipelineExecutor, Report, ResolvedGraphs, StageSpec};
use extrt_platform::{NativePlatformOps, PlatformOps};
use extrt_resolver::DependencyResolver;
use extrt_stages::{ExportingStage, LoadingStage, ModuleRegistry, ParsingStage, ResolutionStage, StartingStage};

use crate::discovery::discover;

/// Everything the bootstrap phase produced: the pipeline's surviving
/// extensions (in load order, followed by anything excluded/unresolved),
/// its diagnostic report, and the dependency graphs `ResolutionStage`
/// committed — kept around so `shutdown` can unwind in reverse order.
pub struct Bootstrap {
    pub extensions: Vec<Extension>,
    pub report: Report,
    pub graphs: ResolvedGraphs,
}

/// Owns the collaborators a running extension host needs for its whole
/// lifetime: the platform loader, the shared module registry, and the
/// configuration every stage reads from the pipeline context.
pub struct Host {
    config: Config,
    platform: Arc<dyn PlatformOps>,
    modules: ModuleRegistry,
}

impl Host {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            platform: Arc::new(NativePlatformOps::new()),
            modules: ModuleRegistry::new(),
        }
    }

    /// Discover extensions under `dir` and run them through Parsing,
    /// Resolution, Loading, Exporting, Starting (spec §4.4). Parsing and
    /// Resolution are required: nothing downstream is meaningful without
    /// them. Loading/Exporting/Starting are not required at the pipeline
    /// level — a single extension's failure is isolated by the failure
    /// tracker and must not halt every other extension's progress.
    pub fn bootstrap(&self, dir: &Path) -> ExtResult<Bootstrap> {
        let extensions = discover(dir)?;
        info!(count = extensions.len(), dir = %dir.display(), "discovered extensions");

        let ctx = PipelineContext::new(self.config.clone());
        let executor = PipelineExecutor::new(vec![
            StageSpec::transform(ParsingStage::new(Arc::new(JsonManifestSource)), true),
            StageSpec::barrier(ResolutionStage::new(DependencyResolver::new()), true),
            StageSpec::sequential(
                LoadingStage::new(self.platform.clone(), self.modules.clone()),
                false,
            ),
            StageSpec::sequential(ExportingStage::new(self.modules.clone()), false),
            StageSpec::sequential(StartingStage::new(self.modules.clone()), false),
        ]);

        let (extensions, report) = executor.run(extensions, &ctx);
        let graphs = ctx.resolution().cloned().unwrap_or_default();

        Ok(Bootstrap {
            extensions,
            report,
            graphs,
        })
    }

    /// Runs only Parsing and Resolution, for a dry-run dependency check that
    /// never touches the platform loader. Extensions end as `Resolved` or
    /// `Unresolved`/`Disabled`, each carrying its own errors/warnings.
    pub fn check(&self, dir: &Path) -> ExtResult<Bootstrap> {
        let extensions = discover(dir)?;
        let ctx = PipelineContext::new(self.config.clone());
        let executor = PipelineExecutor::new(vec![
            StageSpec::transform(ParsingStage::new(Arc::new(JsonManifestSource)), true),
            StageSpec::barrier(ResolutionStage::new(DependencyResolver::new()), true),
        ]);

        let (extensions, report) = executor.run(extensions, &ctx);
        let graphs = ctx.resolution().cloned().unwrap_or_default();

        Ok(Bootstrap {
            extensions,
            report,
            graphs,
        })
    }

    /// One tick of the runtime Update fan-out (spec §2 data-flow: "surviving
    /// Extensions enter Running → runtime Update fan-out"). Modules receive
    /// `on_update`, plugins receive `on_plugin_update`, both gated by
    /// `MethodTable::has_update` (spec §3, §6.1).
    pub fn update(&self, extensions: &mut [Extension], dt: Duration) {
        for ext in extensions.iter_mut() {
            if ext.state() != ExtensionState::Running || !ext.method_table().has_update {
                continue;
            }
            let Some(language) = ext.manifest().map(|m| m.language.clone()) else {
                continue;
            };
            let Some(module) = self.modules.get(&language) else {
                continue;
            };

            let result = if ext.is_module() {
                module.on_update(ext.name(), dt)
            } else {
                module.on_plugin_update(ext.name(), dt)
            };

            if let Err(e) = result {
                warn!(extension = %ext.name(), error = %e, "on_update failed");
                ext.add_error(format!("Update: {e}"));
            }
        }
    }

    /// Ends every `Running` extension and terminates it, in the reverse of
    /// the load order `ResolutionStage` committed — dependents before the
    /// dependencies they rely on, mirroring the original's reverse-order
    /// shutdown.
    pub fn shutdown(&self, extensions: &mut [Extension], graphs: &ResolvedGraphs) {
        let position: std::collections::HashMap<_, _> = graphs
            .load_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut order: Vec<usize> = (0..extensions.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(position.get(extensions[i].id()).copied()));

        for i in order {
            let ext = &mut extensions[i];
            if ext.state() != ExtensionState::Running {
                continue;
            }
            self.end_one(ext);
        }
    }

    fn end_one(&self, ext: &mut Extension) {
        let Some(language) = ext.manifest().map(|m| m.language.clone()) else {
            return;
        };
        let Some(module) = self.modules.get(&language) else {
            return;
        };

        if ext.start_operation(ExtensionState::Ending).is_err() {
            return;
        }

        let result = if ext.is_module() {
            module.shutdown(ext.name())
        } else if ext.method_table().has_end {
            module.on_plugin_end(ext.name())
        } else {
            Ok(())
        };
        if let Err(e) = result {
            warn!(extension = %ext.name(), error = %e, "shutdown hook failed");
            ext.add_error(format!("Ending: {e}"));
        }

        let _ = ext.end_operation(ExtensionState::Ended);
        let _ = ext.start_operation(ExtensionState::Terminating);
        let _ = ext.end_operation(ExtensionState::Terminated);
    }
}

//! Resolution stage (spec §4.4.2): policy filtering, dependency
//! resolution, and committing the resulting load order to the shared
//! context. Grounded in `original_source/src/core/stages_impl.hpp`'s
//! `ResolutionStage`. Plugin-to-language-module dependency edges are
//! synthesized by `DependencyResolver` itself (see `extrt-resolver`), so
//! unlike the original this stage doesn't need its own
//! `AddLanguageDependencies` pass.

use rustc_hash::FxHashMap;

use extrt_core::{Extension, ExtensionState};
use extrt_foundation::ExtResult;
use extrt_pipeline::{BarrierStage, PipelineContext, ResolvedGraphs};
use extrt_resolver::DependencyResolver;
use extrt_types::UniqueId;

pub struct ResolutionStage {
    resolver: DependencyResolver,
}

impl ResolutionStage {
    pub fn new(resolver: DependencyResolver) -> Self {
        Self { resolver }
    }
}

impl Default for ResolutionStage {
    fn default() -> Self {
        Self::new(DependencyResolver::new())
    }
}

fn supports_platform(platforms: &[String]) -> bool {
    platforms.is_empty() || platforms.iter().any(|p| p.contains(current_platform()))
}

fn current_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    }
}

impl BarrierStage for ResolutionStage {
    fn name(&self) -> &str {
        "Resolution"
    }

    fn process_all(
        &self,
        items: Vec<Extension>,
        ctx: &PipelineContext,
    ) -> ExtResult<Vec<Extension>> {
        let security = &ctx.config.security;
        let mut filtered = Vec::with_capacity(items.len());
        let mut excluded = Vec::new();

        for mut ext in items {
            let manifest_ok = ext.state() == ExtensionState::Parsed;
            let whitelisted = security.whitelisted_extensions.is_empty()
                || security.whitelisted_extensions.contains(ext.name());
            let blacklisted = security.blacklisted_extensions.contains(ext.name());
            let platform_ok = ext
                .manifest()
                .map(|m| supports_platform(&m.platforms))
                .unwrap_or(true);

            if manifest_ok && whitelisted && !blacklisted && platform_ok {
                ext.set_state(ExtensionState::Resolving)?;
                filtered.push(ext);
            } else {
                if ext.state() == ExtensionState::Parsed {
                    ext.set_state(ExtensionState::Disabled)?;
                    ext.add_warning("Excluded due to policy");
                }
                excluded.push(ext);
            }
        }

        if filtered.is_empty() {
            filtered.append(&mut excluded);
            return Ok(filtered);
        }

        let report = self.resolver.resolve(&filtered);

        let mut by_id: FxHashMap<UniqueId, Extension> = filtered
            .into_iter()
            .map(|ext| (ext.id().clone(), ext))
            .collect();

        let mut result = Vec::with_capacity(by_id.len() + excluded.len());
        for id in &report.load_order {
            if let Some(mut ext) = by_id.remove(id) {
                ext.set_state(ExtensionState::Resolved)?;
                result.push(ext);
            }
        }

        for (id, mut ext) in by_id {
            ext.set_state(ExtensionState::Unresolved)?;
            for issue in report.blocking_issues_for(&id) {
                ext.add_error(issue.detailed_description());
            }
            for issue in report.warning_issues_for(&id) {
                ext.add_warning(issue.detailed_description());
            }
            result.push(ext);
        }

        result.append(&mut excluded);

        ctx.set_resolution(ResolvedGraphs {
            dependency_graph: report.dependency_graph,
            reverse_dependency_graph: report.reverse_dependency_graph,
            load_order: report.load_order,
        });

        Ok(result)
    }
}

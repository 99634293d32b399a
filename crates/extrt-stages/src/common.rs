//! Shared helpers for the three failure-propagating sequential stages
//! (Loading, Exporting, Starting), grounded in
//! `original_source/src/core/stages_impl.hpp`'s `BaseFailurePropagatingStage`.
//! The original threads dependency graphs through each stage's constructor;
//! ours reads them straight off `ctx.resolution()`, set once by
//! `ResolutionStage`.

use std::time::Duration;

use extrt_core::{Extension, ExtensionState};
use extrt_foundation::{ExtError, ExtResult};
use extrt_pipeline::PipelineContext;
use extrt_types::UniqueId;

/// If any of `ext`'s dependencies have already failed, mark `ext` skipped
/// and return the error to propagate; otherwise `None` and the caller
/// proceeds with its own processing (spec §4.4.3 "HandleDependencyFailure").
pub(crate) fn check_dependency_failure(
    ctx: &PipelineContext,
    ext: &mut Extension,
) -> Option<ExtResult<()>> {
    let graphs = ctx.resolution()?;
    if !ctx
        .failure_tracker
        .has_any_dependency_failed(ext.id(), &graphs.dependency_graph)
    {
        return None;
    }

    let failed_dep = ctx
        .failure_tracker
        .failed_dependency_name(ext.id(), &graphs.dependency_graph)
        .unwrap_or_else(|| "<unknown>".to_string());

    ext.set_state(ExtensionState::Skipped).ok();
    ext.add_error(format!("Skipped: dependency '{failed_dep}' failed"));
    ctx.failure_tracker.mark_failed(ext.id().clone());

    Some(Err(ExtError::initialization_failed(format!(
        "dependency '{failed_dep}' failed"
    ))))
}

/// Records the operation failure on `ext`, marks it failed, and cascades
/// that failure to its direct dependents (spec §4.4.6).
pub(crate) fn handle_operation_failure(
    ctx: &PipelineContext,
    ext: &mut Extension,
    err: &ExtError,
    failed_state: ExtensionState,
) {
    ext.add_error(err.message.clone());
    ext.end_operation(failed_state).ok();
    ctx.failure_tracker.mark_failed(ext.id().clone());
    propagate_to_direct_dependents(ctx, ext.id());
}

fn propagate_to_direct_dependents(ctx: &PipelineContext, id: &UniqueId) {
    if let Some(graphs) = ctx.resolution() {
        ctx.failure_tracker
            .propagate_to_direct_dependents(id, &graphs.reverse_dependency_graph);
    }
}

/// Adds a warning if `state`'s accumulated operation time exceeds `timeout`
/// (spec §4.4.3 "CheckTimeout").
pub(crate) fn check_timeout(ext: &mut Extension, state: ExtensionState, timeout: Duration) {
    let elapsed = ext.operation_time(state);
    if elapsed > timeout {
        ext.add_warning(format!("{state} took {}ms to complete", elapsed.as_millis()));
    }
}

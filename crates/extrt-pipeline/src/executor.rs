//! Runs an ordered list of stages over a mutable collection of extensions
//! (spec §4.3).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tracing::{info, warn};

use extrt_core::Extension;

use crate::context::PipelineContext;
use crate::report::{Report, StageStatistics};
use crate::stage::{Stage, StageSpec};
use crate::worker_pool::WorkerPool;

pub struct PipelineExecutor {
    stages: Vec<StageSpec>,
}

impl PipelineExecutor {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self { stages }
    }

    pub fn run(self, mut items: Vec<Extension>, ctx: &PipelineContext) -> (Vec<Extension>, Report) {
        let mut report = Report::default();

        for spec in self.stages {
            let stage_name = spec.stage.name().to_string();
            let items_in = items.len();
            let start = Instant::now();

            let (new_items, succeeded, failed, errors, barrier_error) =
                run_stage(spec.stage, items, ctx);

            items = new_items;
            let elapsed = start.elapsed();
            let items_out = items.len();

            info!(stage = %stage_name, items_in, items_out, succeeded, failed, elapsed_ms = elapsed.as_millis() as u64, "stage complete");

            let stage_failed = failed > 0 || barrier_error.is_some();
            if let Some(message) = &barrier_error {
                warn!(stage = %stage_name, %message, "stage failed as a whole");
            }

            report.stages.push(StageStatistics {
                name: stage_name.clone(),
                items_in,
                items_out,
                succeeded,
                failed,
                elapsed,
                errors,
            });

            if spec.required && stage_failed {
                warn!(stage = %stage_name, "required stage failed; stopping pipeline");
                report.stopped_at = Some(stage_name);
                break;
            }
        }

        (items, report)
    }
}

type StageRunOutcome = (
    Vec<Extension>,
    usize,
    usize,
    Vec<(String, String)>,
    Option<String>,
);

fn run_stage(stage: Stage, mut items: Vec<Extension>, ctx: &PipelineContext) -> StageRunOutcome {
    match stage {
        Stage::Transform(transform) => {
            let succeeded = AtomicUsize::new(0);
            let failed = AtomicUsize::new(0);
            let errors: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

            let pool = WorkerPool::new(ctx.config.worker_count());
            pool.map_mut(&mut items, |ext| {
                if !transform.should_process(ext) {
                    return;
                }
                match transform.process_item(ext, ctx) {
                    Ok(()) => {
                        succeeded.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        let message = err.to_string();
                        ext.add_error(format!("{}: {message}", transform.name()));
                        errors
                            .lock()
                            .expect("stage error log lock poisoned")
                            .push((ext.name().to_string(), message));
                    }
                }
            });

            (
                items,
                succeeded.into_inner(),
                failed.into_inner(),
                errors.into_inner().expect("stage error log lock poisoned"),
                None,
            )
        }
        Stage::Sequential(sequential) => {
            let mut succeeded = 0;
            let mut failed = 0;
            let mut errors = Vec::new();
            let total = items.len();

            for pos in 0..items.len() {
                let ext = &mut items[pos];
                if !sequential.should_process(ext) {
                    continue;
                }
                match sequential.process_item(ext, pos, total, ctx) {
                    Ok(()) => succeeded += 1,
                    Err(err) => {
                        failed += 1;
                        let message = err.to_string();
                        ext.add_error(format!("{}: {message}", sequential.name()));
                        errors.push((ext.name().to_string(), message));
                        if !sequential.continue_on_error() {
                            break;
                        }
                    }
                }
            }

            (items, succeeded, failed, errors, None)
        }
        Stage::Barrier(barrier) => {
            let items_in = items.len();
            match barrier.process_all(items, ctx) {
                Ok(new_items) => {
                    let succeeded = new_items.len();
                    (new_items, succeeded, 0, Vec::new(), None)
                }
                Err(err) => (Vec::new(), 0, items_in, Vec::new(), Some(err.to_string())),
            }
        }
    }
}

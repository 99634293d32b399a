//! Stage abstraction (spec §4.3, §9 "Heterogeneous dispatch of stages").
//!
//! The source models stages via inheritance + CRTP; without runtime
//! inheritance we tag each stage with its kind and dispatch through one of
//! three small traits, matching the design note's suggested shape.

use extrt_core::Extension;
use extrt_foundation::ExtResult;

use crate::context::PipelineContext;

/// Invoked in parallel across eligible items by the shared worker pool.
pub trait TransformStage: Send + Sync {
    fn name(&self) -> &str;
    fn should_process(&self, ext: &Extension) -> bool {
        let _ = ext;
        true
    }
    fn process_item(&self, ext: &mut Extension, ctx: &PipelineContext) -> ExtResult<()>;
}

/// Receives ownership of the whole collection and returns a possibly
/// reordered/filtered one. Runs on the calling thread.
pub trait BarrierStage: Send + Sync {
    fn name(&self) -> &str;
    fn process_all(
        &self,
        items: Vec<Extension>,
        ctx: &PipelineContext,
    ) -> ExtResult<Vec<Extension>>;
}

/// Invoked in container order, on the calling thread.
pub trait SequentialStage: Send + Sync {
    fn name(&self) -> &str;
    fn should_process(&self, ext: &Extension) -> bool {
        let _ = ext;
        true
    }
    /// If `false`, the first item failure stops this stage from visiting
    /// the remaining items.
    fn continue_on_error(&self) -> bool {
        true
    }
    fn process_item(
        &self,
        ext: &mut Extension,
        pos: usize,
        total: usize,
        ctx: &PipelineContext,
    ) -> ExtResult<()>;
}

pub enum Stage {
    Transform(Box<dyn TransformStage>),
    Barrier(Box<dyn BarrierStage>),
    Sequential(Box<dyn SequentialStage>),
}

impl Stage {
    pub fn name(&self) -> &str {
        match self {
            Stage::Transform(s) => s.name(),
            Stage::Barrier(s) => s.name(),
            Stage::Sequential(s) => s.name(),
        }
    }
}

/// A stage plus the executor-level policy around it (spec §4.3 "required").
pub struct StageSpec {
    pub stage: Stage,
    /// If a required stage ends with any failure, the pipeline stops.
    pub required: bool,
}

impl StageSpec {
    pub fn transform(stage: impl TransformStage + 'static, required: bool) -> Self {
        Self {
            stage: Stage::Transform(Box::new(stage)),
            required,
        }
    }

    pub fn barrier(stage: impl BarrierStage + 'static, required: bool) -> Self {
        Self {
            stage: Stage::Barrier(Box::new(stage)),
            required,
        }
    }

    pub fn sequential(stage: impl SequentialStage + 'static, required: bool) -> Self {
        Self {
            stage: Stage::Sequential(Box::new(stage)),
            required,
        }
    }
}

pub mod context;
pub mod executor;
pub mod report;
pub mod stage;
pub mod worker_pool;

pub use context::{PipelineContext, ResolvedGraphs};
pub use executor::PipelineExecutor;
pub use report::{Report, StageStatistics};
pub use stage::{BarrierStage, SequentialStage, Stage, StageSpec, TransformStage};
pub use worker_pool::WorkerPool;

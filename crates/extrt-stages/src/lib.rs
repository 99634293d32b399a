//! Concrete pipeline stages (spec §4.4), grounded in
//! `original_source/src/core/stages_impl.hpp`.

mod common;

pub mod exporting;
pub mod loading;
pub mod module_registry;
pub mod parsing;
pub mod resolution;
pub mod starting;

pub use exporting::ExportingStage;
pub use loading::LoadingStage;
pub use module_registry::ModuleRegistry;
pub use parsing::ParsingStage;
pub use resolution::ResolutionStage;
pub use starting::StartingStage;

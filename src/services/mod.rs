//! Services
//!
//! Pipeline stages of the workflow orchestrator, leaves first:
//! intent classification, project resolution, parameter validation, tool
//! dispatch, response composition, and the orchestrator that runs them.

pub mod composer;
pub mod dispatch;
pub mod intent;
pub mod parameters;
pub mod pipeline;
pub mod project;

pub use composer::ResponseComposer;
pub use dispatch::ToolDispatcher;
pub use intent::{IntentClassifier, IntentResult, IntentRouter, IntentStrategy, ModelAssistedStrategy};
pub use parameters::{ParameterError, ParameterValidator};
pub use pipeline::{PipelineError, PipelineStage, WorkflowOrchestrator};
pub use project::{LocationNaming, ProjectContextResolver};

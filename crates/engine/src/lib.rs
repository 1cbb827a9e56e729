//! `engine` crate: the workflow graph model, publish-time validation and
//! dry-run execution traces.

pub mod condition;
pub mod demo;
pub mod error;
pub mod format;
pub mod graph;
mod lifecycle;
pub mod models;
pub mod sample;
pub mod simulation;
pub mod validation;

pub use condition::Condition;
pub use error::EngineError;
pub use format::StepKind;
pub use graph::WorkflowGraph;
pub use models::{Connection, Node, Workflow, WorkflowStatus};
pub use sample::RuntimeSample;
pub use simulation::{
    simulate, Highlight, Outcome, SimulationConfig, Simulator, StepRecord, Trace, TraceObserver,
};
pub use validation::{validate, Issue, ValidationError};

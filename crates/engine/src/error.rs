//! Engine-level error types.

use thiserror::Error;

use nodes::Handle;

use crate::models::WorkflowStatus;
use crate::validation::ValidationError;

/// Errors produced when editing a workflow or moving it through its lifecycle.
///
/// Validation itself never fails: structural problems come back as a list of
/// [`ValidationError`]s and only turn into an `EngineError` when a caller
/// tries to publish anyway.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Editing errors ------

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// A connection references a node ID that doesn't exist in the workflow.
    #[error("connection references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    /// A connection would leave and enter the same node.
    #[error("node '{0}' cannot connect to itself")]
    SelfLoop(String),

    /// An identical `(from, fromHandle, to)` edge already exists.
    #[error("connection '{from}' ({handle}) -> '{to}' already exists")]
    DuplicateConnection {
        from: String,
        handle: Handle,
        to: String,
    },

    /// A branch handle leaving a node that does not branch.
    #[error("node '{node_id}' does not branch and cannot use the '{handle}' handle")]
    BranchHandleOnPlainNode { node_id: String, handle: Handle },

    /// No connection with this ID exists.
    #[error("unknown connection '{0}'")]
    UnknownConnection(String),

    /// The workflow is not a draft, so its graph is frozen.
    #[error("workflow '{workflow_id}' is {status} and cannot be edited")]
    Locked {
        workflow_id: String,
        status: WorkflowStatus,
    },

    // ------ Lifecycle errors ------

    /// The requested status change is not allowed from the current status.
    #[error("cannot move workflow from {from} to {to}")]
    InvalidTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },

    /// Validation reported problems, so the workflow may not go live.
    #[error("publish blocked by {} validation error(s)", .errors.len())]
    PublishBlocked { errors: Vec<ValidationError> },
}

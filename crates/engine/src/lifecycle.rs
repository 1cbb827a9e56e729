//! Workflow lifecycle and graph editing.
//!
//! ```text
//!          publish (valid only)
//!   Draft ─────────────────────▶ Active
//!     ▲  ◀───────────────────── │
//!     │        unpublish        │
//!     │ restore          archive│
//!   Archived ◀──────────────────┘   (Draft may archive too)
//! ```
//!
//! Only drafts may be edited.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Connection, Node, Workflow, WorkflowStatus};
use crate::sample::RuntimeSample;
use crate::simulation::{simulate, Trace};
use crate::validation::{validate, ValidationError};

impl Workflow {
    // -----------------------------------------------------------------------
    // Engines
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ValidationError> {
        validate(&self.nodes, &self.connections)
    }

    pub fn simulate(&self, sample: &RuntimeSample) -> Trace {
        simulate(&self.nodes, &self.connections, sample)
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Validate and, if clean, move a draft to `Active`.
    ///
    /// # Errors
    /// - [`EngineError::InvalidTransition`] unless the workflow is a draft.
    /// - [`EngineError::PublishBlocked`] carrying every validation error.
    #[instrument(skip(self), fields(workflow_id = %self.id))]
    pub fn publish(&mut self) -> Result<(), EngineError> {
        if self.status != WorkflowStatus::Draft {
            return Err(self.refuse(WorkflowStatus::Active));
        }

        let errors = self.validate();
        if !errors.is_empty() {
            warn!(errors = errors.len(), "publish blocked by validation");
            return Err(EngineError::PublishBlocked { errors });
        }

        self.set_status(WorkflowStatus::Active);
        Ok(())
    }

    /// Return a published workflow to `Draft` so it can be edited again.
    pub fn unpublish(&mut self) -> Result<(), EngineError> {
        self.transition(WorkflowStatus::Active, WorkflowStatus::Draft)
    }

    /// Retire a draft or active workflow.
    pub fn archive(&mut self) -> Result<(), EngineError> {
        match self.status {
            WorkflowStatus::Draft | WorkflowStatus::Active => {
                self.set_status(WorkflowStatus::Archived);
                Ok(())
            }
            WorkflowStatus::Archived => Err(self.refuse(WorkflowStatus::Archived)),
        }
    }

    /// Bring an archived workflow back as a draft.
    pub fn restore(&mut self) -> Result<(), EngineError> {
        self.transition(WorkflowStatus::Archived, WorkflowStatus::Draft)
    }

    /// A fresh draft copy with its own ID, named `"<name> (Copy)"`.
    pub fn duplicate(&self) -> Workflow {
        let now = Utc::now();
        Workflow {
            id: format!("wf_{}", Uuid::new_v4().simple()),
            name: format!("{} (Copy)", self.name),
            status: WorkflowStatus::Draft,
            created_at: Some(now),
            updated_at: Some(now),
            ..self.clone()
        }
    }

    fn transition(&mut self, from: WorkflowStatus, to: WorkflowStatus) -> Result<(), EngineError> {
        if self.status != from {
            return Err(self.refuse(to));
        }
        self.set_status(to);
        Ok(())
    }

    fn set_status(&mut self, to: WorkflowStatus) {
        info!(workflow_id = %self.id, from = %self.status, %to, "workflow status changed");
        self.status = to;
        self.touch();
    }

    fn refuse(&self, to: WorkflowStatus) -> EngineError {
        warn!(workflow_id = %self.id, from = %self.status, %to, "status change refused");
        EngineError::InvalidTransition { from: self.status, to }
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// # Errors
    /// [`EngineError::Locked`] unless the workflow is a draft.
    pub fn ensure_editable(&self) -> Result<(), EngineError> {
        if self.status == WorkflowStatus::Draft {
            Ok(())
        } else {
            Err(EngineError::Locked { workflow_id: self.id.clone(), status: self.status })
        }
    }

    /// Append a node.
    ///
    /// # Errors
    /// [`EngineError::Locked`], or [`EngineError::DuplicateNodeId`] if the ID
    /// is taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), EngineError> {
        self.ensure_editable()?;
        if self.node(&node.id).is_some() {
            return Err(EngineError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        self.touch();
        Ok(())
    }

    /// Remove a node together with every connection touching it.
    ///
    /// # Errors
    /// [`EngineError::Locked`], or [`EngineError::UnknownNodeReference`].
    pub fn remove_node(&mut self, node_id: &str) -> Result<Node, EngineError> {
        self.ensure_editable()?;
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| EngineError::UnknownNodeReference {
                node_id: node_id.to_owned(),
                side: "node",
            })?;

        let removed = self.nodes.remove(idx);
        self.connections.retain(|c| c.from != node_id && c.to != node_id);
        self.touch();
        Ok(removed)
    }

    /// Add a connection between two existing nodes.
    ///
    /// # Errors
    /// - [`EngineError::Locked`] unless the workflow is a draft.
    /// - [`EngineError::SelfLoop`] when `from == to`.
    /// - [`EngineError::UnknownNodeReference`] for a missing endpoint.
    /// - [`EngineError::BranchHandleOnPlainNode`] when a branch handle leaves
    ///   a node that does not branch.
    /// - [`EngineError::DuplicateConnection`] when the same
    ///   `(from, fromHandle, to)` edge already exists.
    pub fn connect(&mut self, connection: Connection) -> Result<&Connection, EngineError> {
        self.ensure_editable()?;
        if connection.from == connection.to {
            return Err(EngineError::SelfLoop(connection.from));
        }
        for (node_id, side) in [(&connection.from, "from"), (&connection.to, "to")] {
            if self.node(node_id).is_none() {
                return Err(EngineError::UnknownNodeReference { node_id: node_id.clone(), side });
            }
        }
        // Unknown types are left to validation.
        let handle_allowed = self
            .node(&connection.from)
            .and_then(|source| source.definition().ok())
            .map_or(true, |def| def.outputs.accepts(connection.from_handle));
        if !handle_allowed {
            return Err(EngineError::BranchHandleOnPlainNode {
                node_id: connection.from,
                handle: connection.from_handle,
            });
        }
        if self.connections.iter().any(|c| c.same_edge(&connection)) {
            return Err(EngineError::DuplicateConnection {
                from: connection.from,
                handle: connection.from_handle,
                to: connection.to,
            });
        }

        self.touch();
        self.connections.push(connection);
        Ok(&self.connections[self.connections.len() - 1])
    }

    /// Remove a connection by ID.
    ///
    /// # Errors
    /// [`EngineError::Locked`], or [`EngineError::UnknownConnection`].
    pub fn disconnect(&mut self, connection_id: &str) -> Result<Connection, EngineError> {
        self.ensure_editable()?;
        let idx = self
            .connections
            .iter()
            .position(|c| c.id == connection_id)
            .ok_or_else(|| EngineError::UnknownConnection(connection_id.to_owned()))?;
        let removed = self.connections.remove(idx);
        self.touch();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodes::{Handle, NodeKind};
    use serde_json::json;

    fn publishable() -> Workflow {
        Workflow::from_parts(
            "Closeout",
            vec![
                Node::new("t", NodeKind::ManualTrigger, "Start"),
                Node::new("n", NodeKind::SendNotification, "Notify")
                    .with_config(json!({ "recipient": "HSE Lead" })),
            ],
            vec![Connection::with_id("c1", "t", Handle::Default, "n")],
        )
    }

    #[test]
    fn publish_then_unpublish() {
        let mut wf = publishable();
        wf.publish().expect("valid draft publishes");
        assert_eq!(wf.status, WorkflowStatus::Active);

        assert!(matches!(
            wf.publish(),
            Err(EngineError::InvalidTransition { from: WorkflowStatus::Active, to: WorkflowStatus::Active })
        ));

        wf.unpublish().unwrap();
        assert_eq!(wf.status, WorkflowStatus::Draft);
        assert!(matches!(wf.unpublish(), Err(EngineError::InvalidTransition { .. })));
    }

    #[test]
    fn publish_blocked_keeps_draft() {
        let mut wf = publishable();
        wf.nodes[1].config.clear();

        match wf.publish() {
            Err(EngineError::PublishBlocked { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message(), "\"Notify\": Recipient is required.");
            }
            other => panic!("expected PublishBlocked, got {other:?}"),
        }
        assert_eq!(wf.status, WorkflowStatus::Draft);
    }

    #[test]
    fn archive_and_restore() {
        let mut wf = publishable();
        wf.publish().unwrap();
        wf.archive().unwrap();
        assert_eq!(wf.status, WorkflowStatus::Archived);
        assert!(wf.archive().is_err());
        assert!(wf.publish().is_err());
        wf.restore().unwrap();
        assert_eq!(wf.status, WorkflowStatus::Draft);
    }

    #[test]
    fn published_graph_is_locked() {
        let mut wf = publishable();
        wf.publish().unwrap();

        let err = wf.add_node(Node::new("x", NodeKind::UpdateStatus, "X")).unwrap_err();
        assert!(matches!(err, EngineError::Locked { status: WorkflowStatus::Active, .. }));
        assert!(matches!(wf.disconnect("c1"), Err(EngineError::Locked { .. })));
        assert!(matches!(wf.remove_node("n"), Err(EngineError::Locked { .. })));
        assert_eq!(wf.connections.len(), 1);
    }

    #[test]
    fn connect_rejects_bad_edges() {
        let mut wf = publishable();

        assert!(matches!(
            wf.connect(Connection::new("n", "n")),
            Err(EngineError::SelfLoop(id)) if id == "n"
        ));
        assert!(matches!(
            wf.connect(Connection::new("t", "ghost")),
            Err(EngineError::UnknownNodeReference { side: "to", .. })
        ));
        assert!(matches!(
            wf.connect(Connection::new("t", "n")),
            Err(EngineError::DuplicateConnection { handle: Handle::Default, .. })
        ));

        assert!(matches!(
            wf.connect(Connection::new("t", "n").via(Handle::BranchElse)),
            Err(EngineError::BranchHandleOnPlainNode { node_id, handle: Handle::BranchElse }) if node_id == "t"
        ));
        assert_eq!(wf.connections.len(), 1);
        assert!(wf.validate().is_empty());
    }

    #[test]
    fn branch_handles_only_leave_branching_nodes() {
        let mut wf = publishable();
        wf.add_node(Node::new("gate", NodeKind::IfElse, "Gate")).unwrap();
        wf.connect(Connection::new("n", "gate")).unwrap();

        // Same endpoints through a different handle is a different edge.
        wf.add_node(Node::new("r", NodeKind::GenerateReport, "Report")).unwrap();
        let stored = wf.connect(Connection::new("gate", "r").via(Handle::BranchIf)).unwrap();
        assert_eq!(stored.from_handle, Handle::BranchIf);
        assert!(stored.id.starts_with("conn_"));
        wf.connect(Connection::new("gate", "r").via(Handle::BranchElse)).unwrap();

        assert!(matches!(
            wf.connect(Connection::new("n", "r").via(Handle::BranchIf)),
            Err(EngineError::BranchHandleOnPlainNode { node_id, handle: Handle::BranchIf }) if node_id == "n"
        ));
        assert!(wf
            .validate()
            .iter()
            .all(|e| !matches!(e.issue, crate::Issue::BranchHandleOnPlainNode { .. })));
    }

    #[test]
    fn removing_a_node_drops_its_connections() {
        let mut wf = publishable();
        wf.add_node(Node::new("r", NodeKind::GenerateReport, "Report")).unwrap();
        wf.connect(Connection::new("n", "r")).unwrap();
        assert!(matches!(
            wf.add_node(Node::new("r", NodeKind::GenerateReport, "Again")),
            Err(EngineError::DuplicateNodeId(id)) if id == "r"
        ));

        let removed = wf.remove_node("n").unwrap();
        assert_eq!(removed.name, "Notify");
        assert!(wf.connections.is_empty());
        assert!(matches!(wf.remove_node("n"), Err(EngineError::UnknownNodeReference { .. })));
        assert!(matches!(wf.disconnect("c1"), Err(EngineError::UnknownConnection(_))));
    }

    #[test]
    fn duplicate_is_a_fresh_draft() {
        let mut wf = publishable();
        wf.publish().unwrap();
        let copy = wf.duplicate();

        assert_ne!(copy.id, wf.id);
        assert_eq!(copy.name, "Closeout (Copy)");
        assert_eq!(copy.status, WorkflowStatus::Draft);
        assert_eq!(copy.nodes, wf.nodes);
        assert_eq!(copy.connections, wf.connections);
    }
}

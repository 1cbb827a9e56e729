//! Publish-time validation of a workflow graph.
//!
//! Rules run in a fixed order and each one walks nodes (or connections) in
//! document order, so the same input always yields the same list:
//!
//! 1. At least one trigger exists.
//! 2. Every non-trigger node has an incoming connection.
//! 3. Every non-trigger node is reachable from some trigger.
//! 4. Required configuration is present.
//! 5. The graph has no directed cycle.
//! 6. Node IDs are unique and types/categories agree with the catalogue.
//! 7. Connections point at real nodes, are not self-loops or duplicates,
//!    and only branching nodes use branch handles.
//!
//! Nothing here fails: problems are collected and returned.

use std::collections::HashSet;
use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

use nodes::{required_fields, Category, Handle};

use crate::graph::WorkflowGraph;
use crate::models::{Connection, Node};

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// What is wrong. The `Display` text is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    // ------ Graph shape ------

    #[error("Workflow must have at least one Trigger node.")]
    MissingTrigger,

    #[error("\"{name}\" has no incoming connection.")]
    NoIncomingConnection { name: String },

    #[error("\"{name}\" is disconnected from the workflow.")]
    Unreachable { name: String },

    #[error("\"{name}\": {label} is required.")]
    MissingField {
        name: String,
        key: &'static str,
        label: &'static str,
    },

    #[error("Workflow contains a circular loop. Remove cyclic connections.")]
    Cycle,

    // ------ Node identity ------

    #[error("Node ID \"{0}\" is used by more than one node.")]
    DuplicateNodeId(String),

    #[error("\"{name}\" has unknown node type '{node_type}'.")]
    UnknownType { name: String, node_type: String },

    #[error("\"{name}\" has unknown category '{category}'.")]
    UnknownCategory { name: String, category: String },

    #[error("\"{name}\" is marked {declared} but '{node_type}' belongs to {expected}.")]
    CategoryMismatch {
        name: String,
        node_type: String,
        declared: Category,
        expected: Category,
    },

    // ------ Connection integrity ------

    #[error("Connection \"{connection_id}\" references missing node \"{node_id}\".")]
    DanglingConnection { connection_id: String, node_id: String },

    #[error("\"{name}\" is connected to itself.")]
    SelfLoop { name: String },

    #[error("Connection \"{connection_id}\" duplicates an existing connection.")]
    DuplicateConnection { connection_id: String },

    #[error("\"{name}\" is not a branching node but has a '{handle}' connection.")]
    BranchHandleOnPlainNode { name: String, handle: Handle },
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// One problem, optionally pinned to the node it concerns.
///
/// Serialises as `{"nodeId": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// `None` for workflow-wide problems.
    pub node_id: Option<String>,
    pub issue: Issue,
}

impl ValidationError {
    pub fn global(issue: Issue) -> Self {
        Self { node_id: None, issue }
    }

    pub fn at(node_id: impl Into<String>, issue: Issue) -> Self {
        Self { node_id: Some(node_id.into()), issue }
    }

    pub fn message(&self) -> String {
        self.issue.to_string()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.issue, f)
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("nodeId", &self.node_id)?;
        state.serialize_field("message", &self.issue.to_string())?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Check a workflow graph for everything that would stop it going live.
///
/// An empty result means the workflow may be published.
#[instrument(skip_all, fields(nodes = nodes.len(), connections = connections.len()))]
pub fn validate(nodes: &[Node], connections: &[Connection]) -> Vec<ValidationError> {
    let graph = WorkflowGraph::new(nodes, connections);
    let mut errors: Vec<ValidationError> = Vec::new();

    // -----------------------------------------------------------------------
    // 1. Trigger presence
    // -----------------------------------------------------------------------
    if graph.triggers().next().is_none() {
        errors.push(ValidationError::global(Issue::MissingTrigger));
    }

    // -----------------------------------------------------------------------
    // 2. Every non-trigger node has an input
    // -----------------------------------------------------------------------
    let mut no_input: HashSet<&str> = HashSet::new();
    for node in nodes.iter().filter(|n| !n.is_trigger()) {
        if !graph.has_incoming(&node.id) {
            no_input.insert(node.id.as_str());
            errors.push(ValidationError::at(
                &node.id,
                Issue::NoIncomingConnection { name: node.display_name().to_owned() },
            ));
        }
    }

    // -----------------------------------------------------------------------
    // 3. Reachability from the triggers
    //
    // A node already reported by rule 2 is not reported again here.
    // -----------------------------------------------------------------------
    let reached = graph.reachable_from(graph.triggers().map(|t| t.id.as_str()));
    for node in nodes.iter().filter(|n| !n.is_trigger()) {
        if !reached.contains(node.id.as_str()) && !no_input.contains(node.id.as_str()) {
            errors.push(ValidationError::at(
                &node.id,
                Issue::Unreachable { name: node.display_name().to_owned() },
            ));
        }
    }

    // -----------------------------------------------------------------------
    // 4. Required configuration
    // -----------------------------------------------------------------------
    for node in nodes {
        for field in required_fields(node.effective_category(), node.kind()) {
            if !node.has_config(field.key) {
                errors.push(ValidationError::at(
                    &node.id,
                    Issue::MissingField {
                        name: node.display_name().to_owned(),
                        key: field.key,
                        label: field.label,
                    },
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // 5. Cycles (reported once, whatever their number)
    // -----------------------------------------------------------------------
    if graph.has_cycle() {
        errors.push(ValidationError::global(Issue::Cycle));
    }

    // -----------------------------------------------------------------------
    // 6. Node identity
    // -----------------------------------------------------------------------
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(ValidationError::at(&node.id, Issue::DuplicateNodeId(node.id.clone())));
        }
        let declared = match node.declared_category() {
            Some(Err(_)) => {
                errors.push(ValidationError::at(
                    &node.id,
                    Issue::UnknownCategory {
                        name: node.display_name().to_owned(),
                        category: node.category.clone().unwrap_or_default(),
                    },
                ));
                None
            }
            Some(Ok(category)) => Some(category),
            None => None,
        };
        match node.definition() {
            Err(_) => errors.push(ValidationError::at(
                &node.id,
                Issue::UnknownType {
                    name: node.display_name().to_owned(),
                    node_type: node.node_type.clone(),
                },
            )),
            Ok(def) => {
                if let Some(declared) = declared.filter(|&c| c != def.category) {
                    errors.push(ValidationError::at(
                        &node.id,
                        Issue::CategoryMismatch {
                            name: node.display_name().to_owned(),
                            node_type: node.node_type.clone(),
                            declared,
                            expected: def.category,
                        },
                    ));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // 7. Connection integrity
    // -----------------------------------------------------------------------
    for (idx, conn) in connections.iter().enumerate() {
        let source = graph.node(&conn.from);

        for endpoint in [&conn.from, &conn.to] {
            if !graph.contains(endpoint) {
                let issue = Issue::DanglingConnection {
                    connection_id: conn.id.clone(),
                    node_id: endpoint.clone(),
                };
                errors.push(match source {
                    Some(node) => ValidationError::at(&node.id, issue),
                    None => ValidationError::global(issue),
                });
            }
        }

        if conn.from == conn.to {
            if let Some(node) = source {
                errors.push(ValidationError::at(
                    &node.id,
                    Issue::SelfLoop { name: node.display_name().to_owned() },
                ));
            }
        }

        if connections[..idx].iter().any(|earlier| earlier.same_edge(conn)) {
            errors.push(ValidationError {
                node_id: source.map(|n| n.id.clone()),
                issue: Issue::DuplicateConnection { connection_id: conn.id.clone() },
            });
        }

        if let Some(node) = source {
            if let Ok(def) = node.definition() {
                if !def.outputs.accepts(conn.from_handle) {
                    errors.push(ValidationError::at(
                        &node.id,
                        Issue::BranchHandleOnPlainNode {
                            name: node.display_name().to_owned(),
                            handle: conn.from_handle,
                        },
                    ));
                }
            }
        }
    }

    debug!(errors = errors.len(), "validation finished");
    errors
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use nodes::NodeKind;
    use serde_json::json;

    fn trigger(id: &str) -> Node {
        Node::new(id, NodeKind::ManualTrigger, "Start")
    }

    fn action(id: &str, name: &str) -> Node {
        Node::new(id, NodeKind::UpdateStatus, name)
    }

    fn edge(id: &str, from: &str, to: &str) -> Connection {
        Connection::with_id(id, from, Handle::Default, to)
    }

    fn messages(errors: &[ValidationError]) -> Vec<String> {
        errors.iter().map(ValidationError::message).collect()
    }

    #[test]
    fn minimal_valid_workflow_passes() {
        let nodes = vec![trigger("t"), action("a", "Close")];
        let conns = vec![edge("c1", "t", "a")];
        assert!(validate(&nodes, &conns).is_empty());
    }

    #[test]
    fn empty_workflow_only_lacks_a_trigger() {
        let errors = validate(&[], &[]);
        assert_eq!(messages(&errors), vec!["Workflow must have at least one Trigger node."]);
        assert_eq!(errors[0].node_id, None);
    }

    #[test]
    fn orphan_is_reported_once() {
        let nodes = vec![trigger("t"), action("a", "Close"), action("orphan", "Orphan")];
        let conns = vec![edge("c1", "t", "a")];
        let errors = validate(&nodes, &conns);

        assert_eq!(messages(&errors), vec!["\"Orphan\" has no incoming connection."]);
        assert_eq!(errors[0].node_id.as_deref(), Some("orphan"));
    }

    #[test]
    fn island_with_an_input_is_disconnected() {
        // x → y is an island: x has no input (rule 2), y has one but is unreachable (rule 3).
        let nodes = vec![trigger("t"), action("x", "X"), action("y", "Y")];
        let conns = vec![edge("c1", "x", "y")];
        let errors = validate(&nodes, &conns);

        assert_eq!(
            messages(&errors),
            vec![
                "\"X\" has no incoming connection.",
                "\"Y\" is disconnected from the workflow.",
            ]
        );
    }

    #[test]
    fn cycle_is_one_global_error() {
        let nodes = vec![trigger("t"), action("a", "A"), action("b", "B"), action("c", "C")];
        let conns = vec![
            edge("c1", "t", "a"),
            edge("c2", "a", "b"),
            edge("c3", "b", "a"),
            edge("c4", "b", "c"),
            edge("c5", "c", "b"),
        ];
        let errors = validate(&nodes, &conns);
        let cycles: Vec<_> = errors.iter().filter(|e| e.issue == Issue::Cycle).collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].node_id, None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn required_fields_use_truthiness() {
        let nodes = vec![
            trigger("t"),
            Node::new("ai", NodeKind::AiRiskAnalyzer, "Analyzer").with_config(json!({ "inputSource": "" })),
            Node::new("n", NodeKind::SendNotification, "Notify").with_config(json!({ "recipient": 0 })),
            Node::new("task", NodeKind::AssignTask, "Assign").with_config(json!({ "role": "Supervisor" })),
            Node::new("gate", NodeKind::MultiLevelApproval, "Gate"),
        ];
        let conns = vec![
            edge("c1", "t", "ai"),
            edge("c2", "ai", "n"),
            edge("c3", "n", "task"),
            edge("c4", "task", "gate"),
        ];
        assert_eq!(
            messages(&validate(&nodes, &conns)),
            vec![
                "\"Analyzer\": Input Source is required.",
                "\"Notify\": Recipient is required.",
                "\"Gate\": Approver Role is required.",
            ]
        );
    }

    #[test]
    fn rules_report_in_fixed_order() {
        let nodes = vec![
            action("a", "A"),
            Node::new("g", NodeKind::SingleApprover, "Gate"),
        ];
        let conns = vec![edge("c1", "a", "g"), edge("c2", "g", "a")];
        let issues: Vec<_> = validate(&nodes, &conns).into_iter().map(|e| e.issue).collect();

        assert!(matches!(issues[0], Issue::MissingTrigger));
        assert!(matches!(issues[1], Issue::Unreachable { .. }));
        assert!(matches!(issues[2], Issue::Unreachable { .. }));
        assert!(matches!(issues[3], Issue::MissingField { key: "role", .. }));
        assert!(matches!(issues[4], Issue::Cycle));
        assert_eq!(issues.len(), 5);
    }

    #[test]
    fn node_identity_problems() {
        let mut mislabelled = action("m", "Mislabelled");
        mislabelled.category = Some(Category::Logic.to_string());
        let mut mystery = action("q", "Mystery");
        mystery.node_type = "teleport".into();
        let mut custom = action("x", "Custom");
        custom.category = Some("custom".into());

        let nodes = vec![trigger("t"), action("a", "A"), action("a", "Again"), mislabelled, mystery, custom];
        let conns = vec![
            edge("c1", "t", "a"),
            edge("c2", "a", "m"),
            edge("c3", "m", "q"),
            edge("c4", "q", "x"),
        ];
        let errors = validate(&nodes, &conns);

        assert_eq!(
            messages(&errors),
            vec![
                "Node ID \"a\" is used by more than one node.",
                "\"Mislabelled\" is marked logic but 'update_status' belongs to action.",
                "\"Mystery\" has unknown node type 'teleport'.",
                "\"Custom\" has unknown category 'custom'.",
            ]
        );
        assert_eq!(errors[3].node_id.as_deref(), Some("x"));
    }

    #[test]
    fn connection_integrity_problems() {
        let nodes = vec![trigger("t"), action("a", "A")];
        let conns = vec![
            edge("c1", "t", "a"),
            edge("c2", "t", "a"),
            edge("c3", "a", "ghost"),
            edge("c4", "a", "a"),
            Connection::with_id("c5", "t", Handle::BranchIf, "a"),
        ];
        let issues: Vec<_> = validate(&nodes, &conns).into_iter().map(|e| e.issue).collect();

        assert!(issues.contains(&Issue::DuplicateConnection { connection_id: "c2".into() }));
        assert!(issues.contains(&Issue::DanglingConnection {
            connection_id: "c3".into(),
            node_id: "ghost".into(),
        }));
        assert!(issues.contains(&Issue::SelfLoop { name: "A".into() }));
        assert!(issues.contains(&Issue::BranchHandleOnPlainNode {
            name: "Start".into(),
            handle: Handle::BranchIf,
        }));
        // The self-loop is also a cycle.
        assert!(issues.contains(&Issue::Cycle));
    }

    #[test]
    fn validation_does_not_touch_its_input() {
        let nodes = vec![trigger("t"), action("orphan", "Orphan")];
        let before = nodes.clone();
        let _ = validate(&nodes, &[]);
        assert_eq!(nodes, before);
    }

    #[test]
    fn serialises_with_node_id_and_message() {
        let err = ValidationError::at("n1", Issue::NoIncomingConnection { name: "Notify".into() });
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "nodeId": "n1", "message": "\"Notify\" has no incoming connection." })
        );
        let err = ValidationError::global(Issue::Cycle);
        assert_eq!(serde_json::to_value(&err).unwrap()["nodeId"], serde_json::Value::Null);
    }
}

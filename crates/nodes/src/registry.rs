//! The static node catalogue.
//!
//! Every node type a workflow may contain is declared once in
//! [`DEFINITIONS`]. Lookups are pure and never allocate.

use serde::Serialize;

use crate::kind::{Category, NodeKind, OutputShape};
use crate::NodeError;

// ---------------------------------------------------------------------------
// Required configuration
// ---------------------------------------------------------------------------

/// A configuration key a node must carry before the workflow can go live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredField {
    /// Key inside the node's `config` object.
    pub key: &'static str,
    /// Human label used in validation messages.
    pub label: &'static str,
}

const NONE: &[RequiredField] = &[];
const INPUT_SOURCE: &[RequiredField] = &[RequiredField { key: "inputSource", label: "Input Source" }];
const APPROVER_ROLE: &[RequiredField] = &[RequiredField { key: "role", label: "Approver Role" }];
const RECIPIENT: &[RequiredField] = &[RequiredField { key: "recipient", label: "Recipient" }];
const ROLE_TO_ASSIGN: &[RequiredField] = &[RequiredField { key: "role", label: "Role to Assign" }];

/// Configuration a node must carry, given its effective category and kind.
///
/// Category rules apply even when the type itself is unknown, so a document
/// that only states `"category": "ai"` still needs an input source.
pub const fn required_fields(
    category: Option<Category>,
    kind: Option<NodeKind>,
) -> &'static [RequiredField] {
    match (category, kind) {
        (Some(Category::Ai), _) => INPUT_SOURCE,
        (Some(Category::Approval), _) => APPROVER_ROLE,
        (Some(Category::Action), Some(NodeKind::SendNotification)) => RECIPIENT,
        (Some(Category::Action), Some(NodeKind::AssignTask)) => ROLE_TO_ASSIGN,
        _ => NONE,
    }
}

// ---------------------------------------------------------------------------
// NodeDefinition
// ---------------------------------------------------------------------------

/// Everything the engines need to know about one node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeDefinition {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub category: Category,
    /// Default display name.
    pub name: &'static str,
    pub subtitle: &'static str,
    /// Backed by a model rather than a deterministic rule.
    pub ai_assisted: bool,
    pub outputs: OutputShape,
    pub required_fields: &'static [RequiredField],
}

impl NodeDefinition {
    const fn new(
        kind: NodeKind,
        category: Category,
        name: &'static str,
        subtitle: &'static str,
    ) -> Self {
        Self {
            kind,
            category,
            name,
            subtitle,
            ai_assisted: false,
            outputs: OutputShape::Single,
            required_fields: required_fields(Some(category), Some(kind)),
        }
    }

    const fn ai(self) -> Self {
        Self { ai_assisted: true, ..self }
    }

    const fn branching(self) -> Self {
        Self { outputs: OutputShape::Branching, ..self }
    }

    /// Whether this node routes through `branch-if` / `branch-else`.
    pub fn is_branching(&self) -> bool {
        self.outputs == OutputShape::Branching
    }
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

use Category::{Action, Ai, Approval, Logic, Trigger};

/// The full catalogue, in component-library order.
pub(crate) static DEFINITIONS: [NodeDefinition; 28] = [
    // triggers
    NodeDefinition::new(NodeKind::ManualTrigger, Trigger, "Manual Trigger", "Start on demand"),
    NodeDefinition::new(NodeKind::FormSubmission, Trigger, "Form Submission", "Form filled by user"),
    NodeDefinition::new(NodeKind::ObservationRaised, Trigger, "Observation Raised", "Safety observation logged"),
    NodeDefinition::new(NodeKind::IncidentLogged, Trigger, "Incident Logged", "HSE incident recorded"),
    NodeDefinition::new(NodeKind::ScheduledTrigger, Trigger, "Scheduled Trigger", "Time-based execution"),
    NodeDefinition::new(NodeKind::InspectionFormBuilder, Trigger, "Inspection Form Builder", "Dynamic scored form"),
    NodeDefinition::new(NodeKind::AiRiskAlertTrigger, Trigger, "AI Risk Alert Trigger", "AI-detected risk event").ai(),
    // actions
    NodeDefinition::new(NodeKind::SendNotification, Action, "Send Notification", "Notify via Email/App/SMS"),
    NodeDefinition::new(NodeKind::AssignTask, Action, "Assign Task", "Create and assign a task"),
    NodeDefinition::new(NodeKind::UpdateStatus, Action, "Update Status", "Change record status"),
    NodeDefinition::new(NodeKind::EscalateRole, Action, "Escalate to Role", "Escalate to supervisor"),
    NodeDefinition::new(NodeKind::GenerateReport, Action, "Generate Report", "Auto-generate HSE report"),
    NodeDefinition::new(NodeKind::CreatePtw, Action, "Create PTW", "Issue Permit to Work"),
    NodeDefinition::new(NodeKind::CreateObservation, Action, "Create Observation", "Log new observation"),
    NodeDefinition::new(NodeKind::CalculateInspectionScore, Action, "Calculate Inspection Score", "Calculate total form score"),
    // logic
    NodeDefinition::new(NodeKind::IfElse, Logic, "If / Else Condition", "Conditional branching").branching(),
    NodeDefinition::new(NodeKind::MultiBranch, Logic, "Multi-Branch Switch", "Route to multiple paths"),
    NodeDefinition::new(NodeKind::DelayTimer, Logic, "Delay Timer", "Wait before continuing"),
    NodeDefinition::new(NodeKind::ValidationRule, Logic, "Validation Rule", "Enforce data rules"),
    // ai
    NodeDefinition::new(NodeKind::AiRiskAnalyzer, Ai, "AI Risk Analyzer", "Analyze risk score").ai(),
    NodeDefinition::new(NodeKind::AiDocValidator, Ai, "AI Document Validator", "Validate HSE documents").ai(),
    NodeDefinition::new(NodeKind::AiRootCause, Ai, "AI Root Cause Identifier", "Root cause analysis").ai(),
    NodeDefinition::new(NodeKind::AiComplianceChecker, Ai, "AI Compliance Checker", "Check regulatory compliance").ai(),
    NodeDefinition::new(NodeKind::AiPredictiveEscalation, Ai, "AI Predictive Escalation", "Predict escalation path").ai(),
    // approval
    NodeDefinition::new(NodeKind::SingleApprover, Approval, "Single Approver", "One-person approval gate"),
    NodeDefinition::new(NodeKind::MultiLevelApproval, Approval, "Multi-Level Approval", "Sequential approval chain"),
    NodeDefinition::new(NodeKind::ParallelApproval, Approval, "Parallel Approval", "Simultaneous approvals"),
    NodeDefinition::new(NodeKind::SlaEscalation, Approval, "SLA Escalation", "Escalate on SLA breach"),
];

impl NodeKind {
    /// The catalogue entry for this kind.
    pub fn definition(self) -> &'static NodeDefinition {
        &DEFINITIONS[self as usize]
    }
}

/// Look up a document `type` string.
///
/// # Errors
/// [`NodeError::UnknownType`] when the string names no catalogue entry.
pub fn resolve(node_type: &str) -> Result<&'static NodeDefinition, NodeError> {
    node_type.parse::<NodeKind>().map(NodeKind::definition)
}

/// The catalogue grouped by category, in library order.
pub fn catalog() -> Vec<(Category, Vec<&'static NodeDefinition>)> {
    Category::ALL
        .iter()
        .map(|&cat| (cat, DEFINITIONS.iter().filter(|d| d.category == cat).collect()))
        .collect()
}

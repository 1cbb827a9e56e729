//! Closed vocabularies: node categories, node kinds and output handles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::NodeError;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The five families a node type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trigger,
    Action,
    Logic,
    Ai,
    Approval,
}

impl Category {
    /// Every category, in component-library order.
    pub const ALL: [Category; 5] = [
        Category::Trigger,
        Category::Action,
        Category::Logic,
        Category::Ai,
        Category::Approval,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trigger  => "trigger",
            Self::Action   => "action",
            Self::Logic    => "logic",
            Self::Ai       => "ai",
            Self::Approval => "approval",
        }
    }

    /// Heading used when the catalogue is listed.
    pub fn title(self) -> &'static str {
        match self {
            Self::Trigger  => "Triggers",
            Self::Action   => "Actions",
            Self::Logic    => "Logic",
            Self::Ai       => "AI Agent Nodes",
            Self::Approval => "Human Approval",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trigger"  => Ok(Self::Trigger),
            "action"   => Ok(Self::Action),
            "logic"    => Ok(Self::Logic),
            "ai"       => Ok(Self::Ai),
            "approval" => Ok(Self::Approval),
            other      => Err(NodeError::UnknownCategory(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// Every node type the builder offers.
///
/// Discriminants index into the registry table, so the order here must match
/// `registry::DEFINITIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // triggers
    ManualTrigger = 0,
    FormSubmission,
    ObservationRaised,
    IncidentLogged,
    ScheduledTrigger,
    InspectionFormBuilder,
    AiRiskAlertTrigger,
    // actions
    SendNotification,
    AssignTask,
    UpdateStatus,
    EscalateRole,
    GenerateReport,
    CreatePtw,
    CreateObservation,
    CalculateInspectionScore,
    // logic
    IfElse,
    MultiBranch,
    DelayTimer,
    ValidationRule,
    // ai
    AiRiskAnalyzer,
    AiDocValidator,
    AiRootCause,
    AiComplianceChecker,
    AiPredictiveEscalation,
    // approval
    SingleApprover,
    MultiLevelApproval,
    ParallelApproval,
    SlaEscalation,
}

impl NodeKind {
    /// Document-level type key, e.g. `"send_notification"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManualTrigger            => "manual_trigger",
            Self::FormSubmission           => "form_submission",
            Self::ObservationRaised        => "observation_raised",
            Self::IncidentLogged           => "incident_logged",
            Self::ScheduledTrigger         => "scheduled_trigger",
            Self::InspectionFormBuilder    => "inspection_form_builder",
            Self::AiRiskAlertTrigger       => "ai_risk_alert_trigger",
            Self::SendNotification         => "send_notification",
            Self::AssignTask               => "assign_task",
            Self::UpdateStatus             => "update_status",
            Self::EscalateRole             => "escalate_role",
            Self::GenerateReport           => "generate_report",
            Self::CreatePtw                => "create_ptw",
            Self::CreateObservation        => "create_observation",
            Self::CalculateInspectionScore => "calculate_inspection_score",
            Self::IfElse                   => "if_else",
            Self::MultiBranch              => "multi_branch",
            Self::DelayTimer               => "delay_timer",
            Self::ValidationRule           => "validation_rule",
            Self::AiRiskAnalyzer           => "ai_risk_analyzer",
            Self::AiDocValidator           => "ai_doc_validator",
            Self::AiRootCause              => "ai_root_cause",
            Self::AiComplianceChecker      => "ai_compliance_checker",
            Self::AiPredictiveEscalation   => "ai_predictive_escalation",
            Self::SingleApprover           => "single_approver",
            Self::MultiLevelApproval       => "multi_level_approval",
            Self::ParallelApproval         => "parallel_approval",
            Self::SlaEscalation            => "sla_escalation",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::registry::DEFINITIONS
            .iter()
            .map(|def| def.kind)
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NodeError::UnknownType(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// How many outputs a node exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// One output, handle `default`.
    Single,
    /// Two typed outputs, `branch-if` and `branch-else`.
    Branching,
}

/// Output handle a connection leaves from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "branch-if")]
    BranchIf,
    #[serde(rename = "branch-else")]
    BranchElse,
}

impl Handle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default    => "default",
            Self::BranchIf   => "branch-if",
            Self::BranchElse => "branch-else",
        }
    }

    /// Branch handle selected by a condition result.
    pub fn for_branch(condition_met: bool) -> Self {
        if condition_met { Self::BranchIf } else { Self::BranchElse }
    }

    pub fn is_branch(self) -> bool {
        !matches!(self, Self::Default)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OutputShape {
    /// Whether a connection may leave a node of this shape through `handle`.
    ///
    /// Branch handles are reserved for branching nodes; a plain `default`
    /// edge is tolerated on either shape.
    pub fn accepts(self, handle: Handle) -> bool {
        match self {
            Self::Single    => !handle.is_branch(),
            Self::Branching => true,
        }
    }
}

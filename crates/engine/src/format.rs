//! Per-node step descriptions for execution traces.

use std::fmt;

use serde::{Deserialize, Serialize};

use nodes::{Category, NodeKind};

use crate::models::Node;
use crate::sample::RuntimeSample;

/// Inspection totals at or below this are low risk, unless configured.
pub const DEFAULT_THRESHOLD_LOW: i64 = 10;
/// Inspection totals at or below this (and above low) are medium risk.
pub const DEFAULT_THRESHOLD_MEDIUM: i64 = 20;

/// Visual class of a trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Trigger,
    Ai,
    Condition,
    Action,
    Approval,
    Success,
    Error,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trigger   => write!(f, "trigger"),
            Self::Ai        => write!(f, "ai"),
            Self::Condition => write!(f, "condition"),
            Self::Action    => write!(f, "action"),
            Self::Approval  => write!(f, "approval"),
            Self::Success   => write!(f, "success"),
            Self::Error     => write!(f, "error"),
        }
    }
}

/// Risk band of a summed inspection score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn classify(total: i64, low: i64, medium: i64) -> Self {
        if total <= low {
            Self::Low
        } else if total <= medium {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low    => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High   => write!(f, "High"),
        }
    }
}

/// What a node contributes to the trace when the cursor reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub kind: StepKind,
    pub message: String,
    pub detail: String,
}

impl StepOutput {
    fn new(kind: StepKind, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { kind, message: message.into(), detail: detail.into() }
    }
}

/// Describe `node` as a trace step.
///
/// Inspection nodes are matched by type first, then whole categories, then
/// the remaining action types that have their own wording.
pub fn format_step(node: &Node, sample: &RuntimeSample) -> StepOutput {
    let name = node.display_name();
    let text = |key: &str, fallback: &str| node.config_text(key).unwrap_or_else(|| fallback.to_owned());

    match (node.effective_category(), node.kind()) {
        (_, Some(NodeKind::InspectionFormBuilder)) => StepOutput::new(
            StepKind::Trigger,
            format!("{name} executed"),
            "Answers submitted — Computing evaluation.",
        ),
        (_, Some(NodeKind::CalculateInspectionScore)) => {
            let total = sample.total_inspection_score();
            let band = RiskBand::classify(
                total,
                node.config_int("thresholdLow").unwrap_or(DEFAULT_THRESHOLD_LOW),
                node.config_int("thresholdMedium").unwrap_or(DEFAULT_THRESHOLD_MEDIUM),
            );
            StepOutput::new(
                StepKind::Success,
                format!("{name} completed"),
                format!("Calculated Score: {total} — Risk: {band}"),
            )
        }
        (Some(Category::Ai), _) => StepOutput::new(
            StepKind::Ai,
            format!("{name} executed"),
            format!(
                "Analyzed input — confidence: {}% — Output: {}",
                text("confidence", "80"),
                text("outputMap", "Risk Score"),
            ),
        ),
        (Some(Category::Approval), _) => StepOutput::new(
            StepKind::Approval,
            format!("{name} gate reached"),
            format!("Awaiting: {} — SLA: {}h", text("role", "Approver"), text("slaHours", "24")),
        ),
        (Some(Category::Logic), _) => StepOutput::new(
            StepKind::Condition,
            format!("Logic node: {name}"),
            "Evaluating conditions...",
        ),
        (_, Some(NodeKind::SendNotification)) => StepOutput::new(
            StepKind::Action,
            "Notification sent",
            format!("To: {} via {}", text("recipient", "Stakeholders"), text("channel", "Email")),
        ),
        (_, Some(NodeKind::EscalateRole)) => StepOutput::new(
            StepKind::Action,
            "Escalated",
            format!("Escalated to: {}", text("role", "Corporate HSE")),
        ),
        _ => StepOutput::new(
            StepKind::Action,
            format!("{name} executed"),
            "Action completed successfully",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inspection_score_bands() {
        let node = Node::new("s", NodeKind::CalculateInspectionScore, "Score");
        let mut sample = RuntimeSample { inspection_scores: vec![10, 5, 7], ..RuntimeSample::default() };

        let out = format_step(&node, &sample);
        assert_eq!(out.kind, StepKind::Success);
        assert_eq!(out.message, "Score completed");
        assert_eq!(out.detail, "Calculated Score: 22 — Risk: High");

        sample.inspection_scores = vec![4, 6];
        assert_eq!(format_step(&node, &sample).detail, "Calculated Score: 10 — Risk: Low");

        let tuned = node.with_config(json!({ "thresholdLow": 5, "thresholdMedium": 12 }));
        assert_eq!(format_step(&tuned, &sample).detail, "Calculated Score: 10 — Risk: Medium");
    }

    #[test]
    fn category_wording_uses_config_or_fallbacks() {
        let sample = RuntimeSample::default();

        let ai = Node::new("a", NodeKind::AiRootCause, "RCA")
            .with_config(json!({ "inputSource": "Incident Report", "confidence": 92 }));
        let out = format_step(&ai, &sample);
        assert_eq!(out.kind, StepKind::Ai);
        assert_eq!(out.detail, "Analyzed input — confidence: 92% — Output: Risk Score");

        let gate = Node::new("g", NodeKind::SingleApprover, "HSE Sign-off");
        let out = format_step(&gate, &sample);
        assert_eq!(out.message, "HSE Sign-off gate reached");
        assert_eq!(out.detail, "Awaiting: Approver — SLA: 24h");

        let logic = Node::new("l", NodeKind::IfElse, "Risk Check");
        let out = format_step(&logic, &sample);
        assert_eq!(out.kind, StepKind::Condition);
        assert_eq!(out.message, "Logic node: Risk Check");
    }

    #[test]
    fn action_wording() {
        let sample = RuntimeSample::default();

        let notify = Node::new("n", NodeKind::SendNotification, "Notify")
            .with_config(json!({ "recipient": "Site Supervisor", "channel": "SMS" }));
        let out = format_step(&notify, &sample);
        assert_eq!(out.message, "Notification sent");
        assert_eq!(out.detail, "To: Site Supervisor via SMS");

        let escalate = Node::new("e", NodeKind::EscalateRole, "Escalate");
        assert_eq!(format_step(&escalate, &sample).detail, "Escalated to: Corporate HSE");

        let report = Node::new("r", NodeKind::GenerateReport, "Report");
        let out = format_step(&report, &sample);
        assert_eq!(out.kind, StepKind::Action);
        assert_eq!(out.message, "Report executed");
        assert_eq!(out.detail, "Action completed successfully");
    }

    #[test]
    fn inspection_form_is_described_as_a_trigger() {
        let form = Node::new("f", NodeKind::InspectionFormBuilder, "Weekly Inspection");
        let out = format_step(&form, &RuntimeSample::default());
        assert_eq!(out.kind, StepKind::Trigger);
        assert_eq!(out.message, "Weekly Inspection executed");
    }
}

//! Bundled sample workflows.
//!
//! Four realistic HSE processes, useful for trying the engines without a
//! document at hand. Each call builds a fresh copy.

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use nodes::{Handle, NodeKind};

use crate::models::{Connection, Node, Workflow, WorkflowStatus};

/// Names accepted by [`by_name`], in listing order.
pub const NAMES: [&str; 4] = ["inspection", "incident", "observation", "ptw"];

/// Every demo, in listing order.
pub fn all() -> Vec<Workflow> {
    vec![inspection(), incident(), observation(), ptw()]
}

pub fn by_name(name: &str) -> Option<Workflow> {
    match name {
        "inspection"  => Some(inspection()),
        "incident"    => Some(incident()),
        "observation" => Some(observation()),
        "ptw"         => Some(ptw()),
        _             => None,
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn node(id: &str, kind: NodeKind, name: &str, (x, y): (i64, i64), config: Value) -> Node {
    Node::new(id, kind, name).with_config(config).at(x, y)
}

fn edge(id: &str, from: &str, handle: Handle, to: &str) -> Connection {
    Connection::with_id(id, from, handle, to)
}

struct Header {
    id: &'static str,
    name: &'static str,
    status: WorkflowStatus,
    version: &'static str,
    description: &'static str,
    /// How long ago the demo was created / last edited.
    age: (Duration, Duration),
}

fn assemble(header: Header, nodes: Vec<Node>, connections: Vec<Connection>) -> Workflow {
    let now = Utc::now();
    Workflow {
        id: header.id.to_owned(),
        name: header.name.to_owned(),
        status: header.status,
        version: header.version.to_owned(),
        description: Some(header.description.to_owned()),
        created_at: Some(now - header.age.0),
        updated_at: Some(now - header.age.1),
        nodes,
        connections,
    }
}

// ---------------------------------------------------------------------------
// Demos
// ---------------------------------------------------------------------------

/// Scored inspection form routed by risk band.
///
/// Published as-is, although its SLA escalation step names no approver role
/// and so would not pass validation today.
pub fn inspection() -> Workflow {
    let header = Header {
        id: "wf_demo_configurable_inspection",
        name: "Configurable Safety Inspection with Risk Scoring",
        status: WorkflowStatus::Active,
        version: "2.0",
        description: "Demonstrate how an Admin can create configurable inspection forms with risk \
                      scoring that drives automated routing logic.",
        age: (Duration::zero(), Duration::zero()),
    };

    let nodes = vec![
        node("insp_trig_01", NodeKind::InspectionFormBuilder, "Inspection Form Builder", (60, 150), json!({
            "questions": [
                { "text": "Is proper PPE being worn?",
                  "options": [{ "text": "Yes", "score": 0 }, { "text": "Partially", "score": 5 }, { "text": "No", "score": 10 }] },
                { "text": "Is housekeeping satisfactory?",
                  "options": [{ "text": "Good", "score": 0 }, { "text": "Average", "score": 3 }, { "text": "Poor", "score": 8 }] },
                { "text": "Are fire extinguishers accessible?",
                  "options": [{ "text": "Accessible", "score": 0 }, { "text": "Blocked", "score": 7 }] }
            ]
        })),
        node("insp_calc_01", NodeKind::CalculateInspectionScore, "Calculate Inspection Score", (380, 150),
            json!({ "thresholdLow": 10, "thresholdMedium": 20 })),
        node("insp_if_high", NodeKind::IfElse, "Total Score > 20?", (700, 150),
            json!({ "conditions": [{ "field": "Total Score", "operator": ">", "value": "20" }] })),
        // high risk
        node("insp_act_high_1", NodeKind::AssignTask, "Assign: HSE Manager", (1000, -20),
            json!({ "role": "HSE Manager", "taskTitle": "Critical Inspection Failure" })),
        node("insp_act_high_2", NodeKind::SendNotification, "Notify Project Director", (1300, -20),
            json!({ "recipient": "Project Director", "message": "High Risk Hazard identified." })),
        node("insp_act_high_3", NodeKind::SlaEscalation, "SLA Escalation (24h)", (1600, -20),
            json!({ "slaHours": 24, "escalateTo": "Corporate HSE Director" })),
        // medium or low
        node("insp_if_med", NodeKind::IfElse, "Total Score > 10?", (1000, 150),
            json!({ "conditions": [{ "field": "Total Score", "operator": ">", "value": "10" }] })),
        node("insp_act_med_1", NodeKind::AssignTask, "Assign to Contractor Supervisor", (1300, 150),
            json!({ "role": "Contractor Supervisor" })),
        node("insp_act_med_2", NodeKind::SendNotification, "Notify Area Supervisor", (1600, 150),
            json!({ "recipient": "Area Supervisor", "message": "Medium risk findings from inspection." })),
        node("insp_act_low_1", NodeKind::UpdateStatus, "Auto Close", (1300, 320),
            json!({ "status": "Closed" })),
    ];

    let connections = vec![
        edge("c_insp_01", "insp_trig_01", Handle::Default, "insp_calc_01"),
        edge("c_insp_02", "insp_calc_01", Handle::Default, "insp_if_high"),
        edge("c_insp_03", "insp_if_high", Handle::BranchIf, "insp_act_high_1"),
        edge("c_insp_04", "insp_act_high_1", Handle::Default, "insp_act_high_2"),
        edge("c_insp_05", "insp_act_high_2", Handle::Default, "insp_act_high_3"),
        edge("c_insp_06", "insp_if_high", Handle::BranchElse, "insp_if_med"),
        edge("c_insp_07", "insp_if_med", Handle::BranchIf, "insp_act_med_1"),
        edge("c_insp_08", "insp_act_med_1", Handle::Default, "insp_act_med_2"),
        edge("c_insp_12", "insp_if_med", Handle::BranchElse, "insp_act_low_1"),
    ];

    assemble(header, nodes, connections)
}

/// AI risk analysis escalating high-risk incidents for approval.
pub fn incident() -> Workflow {
    let header = Header {
        id: "wf_demo_incident_escalation",
        name: "Intelligent Incident Escalation",
        status: WorkflowStatus::Active,
        version: "1.2",
        description: "AI-powered workflow that automatically analyzes incidents, evaluates risk, and \
                      escalates to corporate when risk exceeds threshold.",
        age: (Duration::days(2), Duration::hours(1)),
    };

    let nodes = vec![
        node("node_trigger_01", NodeKind::IncidentLogged, "Incident Logged", (80, 200),
            json!({ "description": "Triggered when any HSE incident is logged in the system." })),
        node("node_ai_01", NodeKind::AiRiskAnalyzer, "AI Risk Analyzer", (380, 200), json!({
            "inputSource": "Incident Record",
            "confidence": 85,
            "outputMap": "Risk Score",
            "failSafe": "Escalate to Human"
        })),
        node("node_if_01", NodeKind::IfElse, "Risk > 75?", (680, 200),
            json!({ "conditions": [{ "field": "Risk Score", "operator": ">", "value": "75" }] })),
        node("node_approval_01", NodeKind::MultiLevelApproval, "Multi-Level Approval", (980, 130), json!({
            "role": "HSE Manager",
            "slaHours": 4,
            "slaAction": "Auto-Escalate",
            "levels": 2
        })),
        node("node_escalate_01", NodeKind::EscalateRole, "Escalate to Corporate", (1280, 130), json!({
            "role": "Corporate HSE Director",
            "reason": "High-risk incident identified by AI Risk Analyzer."
        })),
        node("node_notify_low", NodeKind::SendNotification, "Notify Site Manager", (980, 310), json!({
            "recipient": "Area Manager",
            "message": "Low-risk incident logged. Review at earliest convenience.",
            "channel": "Email,In-App"
        })),
    ];

    let connections = vec![
        edge("conn_d_01", "node_trigger_01", Handle::Default, "node_ai_01"),
        edge("conn_d_02", "node_ai_01", Handle::Default, "node_if_01"),
        edge("conn_d_03", "node_if_01", Handle::BranchIf, "node_approval_01"),
        edge("conn_d_04", "node_approval_01", Handle::Default, "node_escalate_01"),
        edge("conn_d_05", "node_if_01", Handle::BranchElse, "node_notify_low"),
    ];

    assemble(header, nodes, connections)
}

/// AI hazard classification of safety observations.
///
/// Its condition tests a field the simulator cannot sample, so a dry run
/// always takes the "safe" branch.
pub fn observation() -> Workflow {
    let header = Header {
        id: "wf_demo_observation_loop",
        name: "Smart Observation Loop",
        status: WorkflowStatus::Draft,
        version: "1.0",
        description: "Automatically categorize observations, check for hazards using AI, and assign \
                      rectification tasks if needed.",
        age: (Duration::zero(), Duration::zero()),
    };

    let nodes = vec![
        node("obs_trig_01", NodeKind::ObservationRaised, "Observation Raised", (60, 220), json!({})),
        node("obs_ai_01", NodeKind::AiRootCause, "AI Hazard Classifier", (340, 220), json!({
            "inputSource": "Observation Text/Image",
            "confidence": 80,
            "outputMap": "Hazard Type"
        })),
        node("obs_if_01", NodeKind::IfElse, "Is Hazardous?", (620, 220),
            json!({ "conditions": [{ "field": "Hazard Type", "operator": "!=", "value": "Safe" }] })),
        node("obs_act_01", NodeKind::AssignTask, "Assign Rectification", (900, 140), json!({
            "role": "Maintenance Team",
            "priority": "High",
            "description": "Rectify hazard identified by AI."
        })),
        node("obs_act_02", NodeKind::UpdateStatus, "Mark as Closed", (900, 320),
            json!({ "status": "Closed", "comment": "Auto-closed: No hazard detected." })),
        node("obs_notify_01", NodeKind::SendNotification, "Notify Reporter", (1180, 320), json!({
            "recipient": "Reporter",
            "message": "Your observation was safe and has been closed.",
            "channel": "In-App"
        })),
    ];

    let connections = vec![
        edge("c_obs_01", "obs_trig_01", Handle::Default, "obs_ai_01"),
        edge("c_obs_02", "obs_ai_01", Handle::Default, "obs_if_01"),
        edge("c_obs_03", "obs_if_01", Handle::BranchIf, "obs_act_01"),
        edge("c_obs_04", "obs_if_01", Handle::BranchElse, "obs_act_02"),
        edge("c_obs_05", "obs_act_02", Handle::Default, "obs_notify_01"),
    ];

    assemble(header, nodes, connections)
}

/// Permit-to-work issuance gated on AI document checks.
pub fn ptw() -> Workflow {
    let header = Header {
        id: "wf_demo_ptw_automated",
        name: "Automated Permit to Work (PTW)",
        status: WorkflowStatus::Draft,
        version: "0.9",
        description: "Streamline permit issuance by pre-validating documents with AI before routing \
                      for Site Manager approval.",
        age: (Duration::zero(), Duration::zero()),
    };

    let nodes = vec![
        node("ptw_trig_01", NodeKind::FormSubmission, "PTW Request", (60, 180),
            json!({ "formType": "Hot Work Permit" })),
        node("ptw_ai_01", NodeKind::AiComplianceChecker, "AI Doc Validator", (340, 180), json!({
            "inputSource": "Attached Certs",
            "ruleSet": "HSE Global Standards",
            "confidence": 90
        })),
        node("ptw_if_01", NodeKind::IfElse, "Docs Valid?", (620, 180),
            json!({ "conditions": [{ "field": "Validation Confidence", "operator": ">", "value": "95" }] })),
        node("ptw_app_01", NodeKind::SingleApprover, "Site Manager Approval", (920, 100),
            json!({ "role": "Site Manager", "slaHours": 2 })),
        node("ptw_iss_01", NodeKind::CreatePtw, "Issue Permit", (1220, 100),
            json!({ "type": "Hot Work", "validFor": "8h" })),
        node("ptw_rej_01", NodeKind::SendNotification, "Reject Request", (920, 300), json!({
            "recipient": "Applicant",
            "message": "PTW Rejected: Documentation invalid.",
            "channel": "Email"
        })),
    ];

    let connections = vec![
        edge("c_ptw_01", "ptw_trig_01", Handle::Default, "ptw_ai_01"),
        edge("c_ptw_02", "ptw_ai_01", Handle::Default, "ptw_if_01"),
        edge("c_ptw_03", "ptw_if_01", Handle::BranchIf, "ptw_app_01"),
        edge("c_ptw_04", "ptw_app_01", Handle::Default, "ptw_iss_01"),
        edge("c_ptw_05", "ptw_if_01", Handle::BranchElse, "ptw_rej_01"),
    ];

    assemble(header, nodes, connections)
}

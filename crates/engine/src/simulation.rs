//! Dry-run execution traces.
//!
//! `Simulator` walks one representative path through a workflow, starting at
//! the first trigger:
//! 1. Each step follows the first outgoing connection whose target has not
//!    been visited yet, and records what that node would do.
//! 2. Branching nodes evaluate their condition against the [`RuntimeSample`]
//!    and jump to the target of the matching branch handle instead.
//! 3. The walk ends at a dead end, after a missing branch, when every target
//!    has been visited, or after `max_iterations` steps.
//!
//! Nothing is executed and the graph is never modified. Callers that want to
//! animate the run pass a [`TraceObserver`], which also lets them cancel
//! between records.

use std::collections::HashSet;
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use nodes::Handle;

use crate::condition::Condition;
use crate::format::{format_step, StepKind};
use crate::graph::WorkflowGraph;
use crate::models::{Connection, Node};
use crate::sample::RuntimeSample;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the simulator.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Upper bound on traversal steps, reached only by unusually long paths.
    pub max_iterations: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { max_iterations: 20 }
    }
}

// ---------------------------------------------------------------------------
// Records and events
// ---------------------------------------------------------------------------

/// One line of the execution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// 1-based and gap-free.
    pub step: u32,
    pub kind: StepKind,
    pub message: String,
    pub detail: String,
    /// The node this record describes. Branch decisions and the closing
    /// summary carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Visual cue for a live canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "id", rename_all = "snake_case")]
pub enum Highlight {
    NodeActive(String),
    NodeDone(String),
    ConnectionActive(String),
}

/// Receives records and highlight events as the simulator produces them.
pub trait TraceObserver {
    /// Called after each record is appended. Return `Break` to stop the run.
    fn on_record(&mut self, record: &StepRecord) -> ControlFlow<()>;

    fn on_highlight(&mut self, _highlight: &Highlight) {}
}

/// Observe nothing, never cancel.
impl TraceObserver for () {
    fn on_record(&mut self, _record: &StepRecord) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The path ended normally; the last record is the `success` summary.
    Completed,
    /// No trigger to start from; the only record is an `error`.
    NoTrigger,
    /// `max_iterations` was reached. No summary record.
    IterationLimit,
    /// The observer stopped the run. No summary record.
    Cancelled,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub records: Vec<StepRecord>,
    /// Node IDs the cursor stood on, in order. Branch targets appear here
    /// even though they get no record of their own.
    pub path: Vec<String>,
    pub outcome: Outcome,
}

impl Trace {
    /// IDs of nodes that produced a record, in order.
    pub fn recorded_node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().filter_map(|r| r.node_id.as_deref())
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Produces an execution trace for one `(graph, sample)` pair.
pub struct Simulator<'a> {
    graph: WorkflowGraph<'a>,
    sample: &'a RuntimeSample,
    config: SimulationConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(nodes: &'a [Node], connections: &'a [Connection], sample: &'a RuntimeSample) -> Self {
        Self {
            graph: WorkflowGraph::new(nodes, connections),
            sample,
            config: SimulationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Run to the end without observing.
    pub fn run(&self) -> Trace {
        self.run_with(&mut ())
    }

    /// Run, reporting each record and highlight to `observer` as it happens.
    #[instrument(skip_all, fields(nodes = self.graph.nodes().len()))]
    pub fn run_with<O: TraceObserver + ?Sized>(&self, observer: &mut O) -> Trace {
        let mut run = Run { records: Vec::new(), path: Vec::new(), observer };

        let outcome = match self.walk(&mut run) {
            ControlFlow::Continue(Outcome::Completed) => {
                let processed = run.records.len();
                // The summary is the last record either way.
                let _ = run.emit(
                    StepKind::Success,
                    "Workflow execution complete".to_owned(),
                    format!("Processed {processed} steps successfully"),
                    None,
                );
                Outcome::Completed
            }
            ControlFlow::Continue(outcome) => outcome,
            ControlFlow::Break(()) => Outcome::Cancelled,
        };

        match outcome {
            Outcome::Completed => info!(records = run.records.len(), "simulation completed"),
            Outcome::NoTrigger => warn!("simulation has no trigger to start from"),
            Outcome::IterationLimit => warn!(
                max_iterations = self.config.max_iterations,
                "simulation stopped at the iteration bound"
            ),
            Outcome::Cancelled => info!(records = run.records.len(), "simulation cancelled"),
        }

        Trace { records: run.records, path: run.path, outcome }
    }

    /// Traverse the graph. `Break` means the observer cancelled.
    fn walk<O: TraceObserver + ?Sized>(&self, run: &mut Run<'_, O>) -> ControlFlow<(), Outcome> {
        let Some(trigger) = self.graph.triggers().next() else {
            run.emit(
                StepKind::Error,
                "No trigger node found. Add a Trigger to start.".to_owned(),
                "System".to_owned(),
                None,
            )?;
            return ControlFlow::Continue(Outcome::NoTrigger);
        };

        run.emit(
            StepKind::Trigger,
            "Workflow triggered".to_owned(),
            format!("{} activated", trigger.display_name()),
            Some(&trigger.id),
        )?;
        run.highlight(Highlight::NodeActive(trigger.id.clone()));
        run.highlight(Highlight::NodeDone(trigger.id.clone()));
        run.path.push(trigger.id.clone());

        let mut visited: HashSet<&str> = HashSet::from([trigger.id.as_str()]);
        let mut cursor: &str = &trigger.id;

        for _ in 0..self.config.max_iterations {
            let outgoing = self.graph.outgoing(cursor);
            if outgoing.is_empty() {
                debug!(node_id = cursor, "path reached a dead end");
                return ControlFlow::Continue(Outcome::Completed);
            }

            // First unvisited target. Missing targets are marked and skipped.
            let mut next = None;
            for &conn in outgoing {
                if !visited.insert(conn.to.as_str()) {
                    continue;
                }
                if let Some(node) = self.graph.node(&conn.to) {
                    next = Some((conn, node));
                    break;
                }
                debug!(connection_id = %conn.id, target = %conn.to, "skipping dangling connection");
            }
            let Some((conn, node)) = next else {
                debug!(node_id = cursor, "every outgoing target already visited");
                return ControlFlow::Continue(Outcome::Completed);
            };

            run.highlight(Highlight::ConnectionActive(conn.id.clone()));
            let step = format_step(node, self.sample);
            run.emit(step.kind, step.message, step.detail, Some(&node.id))?;
            run.highlight(Highlight::NodeActive(node.id.clone()));
            run.highlight(Highlight::NodeDone(node.id.clone()));
            run.path.push(node.id.clone());

            if !node.is_branching() {
                cursor = &node.id;
                continue;
            }

            let condition = Condition::from_config(&node.config);
            let met = condition.as_ref().map_or(false, |c| c.evaluate(self.sample));
            let (label, detail) = match &condition {
                Some(c) => (branch_label(met), format!("Field: {c}")),
                None => (branch_label(met), "Field: N/A  ".to_owned()),
            };
            run.emit(
                StepKind::Condition,
                format!("Condition evaluated: {label}"),
                detail,
                None,
            )?;

            let handle = Handle::for_branch(met);
            debug!(node_id = %node.id, %handle, "branch resolved");
            match self.graph.branch_connection(&node.id, handle) {
                Some(branch) => {
                    run.highlight(Highlight::ConnectionActive(branch.id.clone()));
                    if self.graph.contains(&branch.to) {
                        run.path.push(branch.to.clone());
                    }
                    cursor = &branch.to;
                }
                None => {
                    debug!(node_id = %node.id, %handle, "no connection for the chosen branch");
                    return ControlFlow::Continue(Outcome::Completed);
                }
            }
        }

        ControlFlow::Continue(Outcome::IterationLimit)
    }
}

fn branch_label(met: bool) -> &'static str {
    if met {
        "TRUE → proceeding"
    } else {
        "FALSE → alternate path"
    }
}

/// Mutable state of a single run.
struct Run<'o, O: TraceObserver + ?Sized> {
    records: Vec<StepRecord>,
    path: Vec<String>,
    observer: &'o mut O,
}

impl<O: TraceObserver + ?Sized> Run<'_, O> {
    fn emit(
        &mut self,
        kind: StepKind,
        message: String,
        detail: String,
        node_id: Option<&str>,
    ) -> ControlFlow<()> {
        let record = StepRecord {
            step: self.records.len() as u32 + 1,
            kind,
            message,
            detail,
            node_id: node_id.map(str::to_owned),
            timestamp: Utc::now(),
        };
        debug!(step = record.step, kind = %record.kind, message = %record.message, "trace record");
        self.records.push(record);
        match self.records.last() {
            Some(record) => self.observer.on_record(record),
            None => ControlFlow::Continue(()),
        }
    }

    fn highlight(&mut self, highlight: Highlight) {
        self.observer.on_highlight(&highlight);
    }
}

/// Simulate with default settings and no observer.
pub fn simulate(nodes: &[Node], connections: &[Connection], sample: &RuntimeSample) -> Trace {
    Simulator::new(nodes, connections, sample).run()
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use nodes::NodeKind;

    fn chain(len: usize) -> (Vec<Node>, Vec<Connection>) {
        let mut nodes = vec![Node::new("n0", NodeKind::ManualTrigger, "Start")];
        let mut conns = Vec::new();
        for i in 1..len {
            nodes.push(Node::new(format!("n{i}"), NodeKind::UpdateStatus, format!("Step {i}")));
            conns.push(Connection::with_id(format!("c{i}"), format!("n{}", i - 1), Handle::Default, format!("n{i}")));
        }
        (nodes, conns)
    }

    #[test]
    fn no_trigger_yields_single_error() {
        let nodes = vec![Node::new("a", NodeKind::UpdateStatus, "Update")];
        let trace = simulate(&nodes, &[], &RuntimeSample::default());

        assert_eq!(trace.outcome, Outcome::NoTrigger);
        assert_eq!(trace.records.len(), 1);
        assert_eq!(trace.records[0].kind, StepKind::Error);
        assert_eq!(trace.records[0].message, "No trigger node found. Add a Trigger to start.");
        assert_eq!(trace.records[0].detail, "System");
        assert!(trace.path.is_empty());
    }

    #[test]
    fn lone_trigger_completes() {
        let (nodes, conns) = chain(1);
        let trace = simulate(&nodes, &conns, &RuntimeSample::default());

        assert_eq!(trace.outcome, Outcome::Completed);
        let messages: Vec<_> = trace.records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["Workflow triggered", "Workflow execution complete"]);
        assert_eq!(trace.records[0].detail, "Start activated");
        assert_eq!(trace.records[1].detail, "Processed 1 steps successfully");
    }

    #[test]
    fn steps_are_numbered_from_one() {
        let (nodes, conns) = chain(4);
        let trace = simulate(&nodes, &conns, &RuntimeSample::default());
        let steps: Vec<u32> = trace.records.iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5]);
        assert_eq!(trace.path, vec!["n0", "n1", "n2", "n3"]);
    }

    #[test]
    fn long_path_hits_iteration_bound_silently() {
        let (nodes, conns) = chain(30);
        let trace = Simulator::new(&nodes, &conns, &RuntimeSample::default())
            .with_config(SimulationConfig { max_iterations: 5 })
            .run();

        assert_eq!(trace.outcome, Outcome::IterationLimit);
        assert_eq!(trace.records.len(), 6);
        assert!(trace.records.iter().all(|r| r.kind != StepKind::Success));
    }

    #[test]
    fn first_unvisited_edge_only() {
        let nodes = vec![
            Node::new("t", NodeKind::ManualTrigger, "Start"),
            Node::new("a", NodeKind::UpdateStatus, "A"),
            Node::new("b", NodeKind::GenerateReport, "B"),
        ];
        let conns = vec![
            Connection::with_id("c1", "t", Handle::Default, "a"),
            Connection::with_id("c2", "t", Handle::Default, "b"),
        ];
        let trace = simulate(&nodes, &conns, &RuntimeSample::default());
        assert_eq!(trace.recorded_node_ids().collect::<Vec<_>>(), vec!["t", "a"]);
    }

    #[test]
    fn dangling_target_is_skipped() {
        let nodes = vec![
            Node::new("t", NodeKind::ManualTrigger, "Start"),
            Node::new("a", NodeKind::UpdateStatus, "A"),
        ];
        let conns = vec![
            Connection::with_id("c1", "t", Handle::Default, "ghost"),
            Connection::with_id("c2", "t", Handle::Default, "a"),
        ];
        let trace = simulate(&nodes, &conns, &RuntimeSample::default());
        assert_eq!(trace.recorded_node_ids().collect::<Vec<_>>(), vec!["t", "a"]);
        assert_eq!(trace.outcome, Outcome::Completed);
    }

    #[test]
    fn cycle_ends_by_edge_exhaustion() {
        let nodes = vec![
            Node::new("t", NodeKind::ManualTrigger, "Start"),
            Node::new("a", NodeKind::UpdateStatus, "A"),
            Node::new("b", NodeKind::UpdateStatus, "B"),
        ];
        let conns = vec![
            Connection::with_id("c1", "t", Handle::Default, "a"),
            Connection::with_id("c2", "a", Handle::Default, "b"),
            Connection::with_id("c3", "b", Handle::Default, "a"),
        ];
        let trace = simulate(&nodes, &conns, &RuntimeSample::default());
        assert_eq!(trace.outcome, Outcome::Completed);
        assert_eq!(trace.recorded_node_ids().collect::<Vec<_>>(), vec!["t", "a", "b"]);
    }

    #[test]
    fn highlights_follow_the_walk() {
        struct Recorder(Vec<Highlight>);
        impl TraceObserver for Recorder {
            fn on_record(&mut self, _record: &StepRecord) -> ControlFlow<()> {
                ControlFlow::Continue(())
            }
            fn on_highlight(&mut self, highlight: &Highlight) {
                self.0.push(highlight.clone());
            }
        }

        let (nodes, conns) = chain(2);
        let mut recorder = Recorder(Vec::new());
        Simulator::new(&nodes, &conns, &RuntimeSample::default()).run_with(&mut recorder);

        assert_eq!(
            recorder.0,
            vec![
                Highlight::NodeActive("n0".into()),
                Highlight::NodeDone("n0".into()),
                Highlight::ConnectionActive("c1".into()),
                Highlight::NodeActive("n1".into()),
                Highlight::NodeDone("n1".into()),
            ]
        );
    }

    #[test]
    fn record_serialises_camel_case() {
        let (nodes, conns) = chain(1);
        let trace = simulate(&nodes, &conns, &RuntimeSample::default());
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["records"][0]["kind"], "trigger");
        assert_eq!(json["records"][0]["nodeId"], "n0");
        assert!(json["records"][1].get("nodeId").is_none());
    }
}

//! Paced, cancellable playback of a simulation.
//!
//! The simulator is synchronous, so it runs on a blocking task and streams
//! its events over a bounded channel. Dropping the receiver (Ctrl-C, or the
//! caller losing interest) makes the next record send fail, which cancels
//! the run at the following step boundary.

use std::ops::ControlFlow;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use engine::{Highlight, RuntimeSample, SimulationConfig, Simulator, StepRecord, Trace, TraceObserver, Workflow};

/// Something the simulator produced.
#[derive(Debug, Clone)]
pub enum Event {
    Record(StepRecord),
    Highlight(Highlight),
}

/// Forwards simulator output into a channel, blocking while it is full.
struct ChannelObserver {
    tx: mpsc::Sender<Event>,
}

impl TraceObserver for ChannelObserver {
    fn on_record(&mut self, record: &StepRecord) -> ControlFlow<()> {
        match self.tx.blocking_send(Event::Record(record.clone())) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }

    fn on_highlight(&mut self, highlight: &Highlight) {
        // A closed channel is picked up by the next record.
        let _ = self.tx.blocking_send(Event::Highlight(highlight.clone()));
    }
}

/// Start a simulation on the blocking pool.
///
/// Events arrive on the returned receiver one at a time; the join handle
/// yields the finished trace.
pub fn spawn_simulation(
    workflow: Workflow,
    sample: RuntimeSample,
    config: SimulationConfig,
) -> (mpsc::Receiver<Event>, JoinHandle<Trace>) {
    let (tx, rx) = mpsc::channel(1);
    let handle = tokio::task::spawn_blocking(move || {
        let mut observer = ChannelObserver { tx };
        Simulator::new(&workflow.nodes, &workflow.connections, &sample)
            .with_config(config)
            .run_with(&mut observer)
    });
    (rx, handle)
}

/// Run a simulation, handing each event to `render` and waiting `pace`
/// after every record. Ctrl-C cancels.
pub async fn play<F>(
    workflow: Workflow,
    sample: RuntimeSample,
    config: SimulationConfig,
    pace: Duration,
    mut render: F,
) -> anyhow::Result<Trace>
where
    F: FnMut(&Event),
{
    let (mut rx, handle) = spawn_simulation(workflow, sample, config);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    'events: loop {
        let event = tokio::select! {
            _ = &mut ctrl_c => {
                warn!("interrupted, cancelling simulation");
                break 'events;
            }
            event = rx.recv() => match event {
                Some(event) => event,
                None => break 'events,
            },
        };

        render(&event);

        match &event {
            Event::Highlight(highlight) => debug!(?highlight, "highlight"),
            Event::Record(_) if !pace.is_zero() => {
                tokio::select! {
                    _ = &mut ctrl_c => {
                        warn!("interrupted, cancelling simulation");
                        break 'events;
                    }
                    _ = tokio::time::sleep(pace) => {}
                }
            }
            Event::Record(_) => {}
        }
    }

    drop(rx);
    handle.await.context("simulation task failed")
}

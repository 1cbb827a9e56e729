//! `hse-flow` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate`: check a workflow document for publish-blocking problems.
//! - `simulate`: print the execution trace of a dry run.
//! - `publish`: validate and mark a draft as active.
//! - `unpublish`: return an active workflow to draft.
//! - `catalog`: list every node type.
//! - `demo`: list or print the bundled sample workflows.

mod playback;
mod report;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{demo, EngineError, RuntimeSample, SimulationConfig, Workflow};

#[derive(Parser)]
#[command(
    name = "hse-flow",
    about = "Validate and dry-run HSE workflow definitions",
    version
)]
struct Cli {
    /// Log engine internals (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workflow definition.
    Validate {
        #[command(flatten)]
        source: Source,
        /// Print the errors as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Walk one execution path and print the trace.
    Simulate {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        sample: SampleArgs,
        /// Delay after each step, in milliseconds.
        #[arg(long, env = "WORKFLOW_PACE_MS", default_value_t = 0)]
        pace_ms: u64,
        #[arg(long, default_value_t = SimulationConfig::default().max_iterations)]
        max_iterations: u32,
        /// Print the finished trace as JSON instead of streaming it.
        #[arg(long)]
        json: bool,
    },
    /// Validate a draft and mark it active.
    Publish {
        path: PathBuf,
        /// Write the result here instead of back to PATH.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Return an active workflow to draft.
    Unpublish {
        path: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every node type, grouped by category.
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// List the bundled demos, or print one as a workflow document.
    Demo {
        name: Option<String>,
    },
}

/// Where a workflow comes from.
#[derive(Args)]
struct Source {
    /// Workflow JSON file.
    #[arg(required_unless_present = "demo")]
    path: Option<PathBuf>,
    /// Use a bundled demo instead of a file.
    #[arg(long, conflicts_with = "path")]
    demo: Option<String>,
}

impl Source {
    fn load(&self) -> anyhow::Result<Workflow> {
        match (&self.path, &self.demo) {
            (_, Some(name)) => demo::by_name(name).with_context(|| {
                format!("unknown demo '{name}' (expected one of: {})", demo::NAMES.join(", "))
            }),
            (Some(path), None) => read_workflow(path),
            (None, None) => bail!("a workflow file or --demo is required"),
        }
    }
}

/// Runtime values a live run would learn from upstream systems.
#[derive(Args)]
struct SampleArgs {
    #[arg(long, default_value = engine::sample::DEFAULT_SEVERITY)]
    severity: String,
    /// Non-numeric input falls back to 85.
    #[arg(long, default_value = "85")]
    risk_score: String,
    /// One inspection sub-score; repeat for each question.
    #[arg(long = "score")]
    scores: Vec<String>,
    /// Non-numeric input falls back to 40.
    #[arg(long, default_value = "40")]
    validation_confidence: String,
}

impl SampleArgs {
    fn to_sample(&self) -> RuntimeSample {
        RuntimeSample::from_raw(
            &self.severity,
            &self.risk_score,
            &self.scores,
            &self.validation_confidence,
        )
    }
}

fn read_workflow(path: &Path) -> anyhow::Result<Workflow> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a workflow document", path.display()))
}

fn write_workflow(path: &Path, workflow: &Workflow) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(workflow)?;
    std::fs::write(path, json + "\n").with_context(|| format!("cannot write {}", path.display()))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Validate { source, json } => {
            let workflow = source.load()?;
            let errors = workflow.validate();
            if json {
                println!("{}", serde_json::to_string_pretty(&errors)?);
            } else {
                report::validation(&workflow, &errors);
            }
            if !errors.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Simulate { source, sample, pace_ms, max_iterations, json } => {
            let workflow = source.load()?;
            let sample = sample.to_sample();
            let config = SimulationConfig { max_iterations };
            info!(workflow_id = %workflow.id, ?sample, "simulating");

            if json {
                let trace = engine::Simulator::new(&workflow.nodes, &workflow.connections, &sample)
                    .with_config(config)
                    .run();
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                let pace = Duration::from_millis(pace_ms);
                let trace = playback::play(workflow, sample, config, pace, |event| {
                    if let playback::Event::Record(record) = event {
                        report::record(record);
                    }
                })
                .await?;
                report::outcome(&trace);
            }
        }
        Command::Publish { path, output } => {
            let mut workflow = read_workflow(&path)?;
            match workflow.publish() {
                Ok(()) => {
                    write_workflow(output.as_deref().unwrap_or(path.as_path()), &workflow)?;
                    println!("🚀 \"{}\" is now active.", workflow.name);
                }
                Err(EngineError::PublishBlocked { errors }) => {
                    report::validation(&workflow, &errors);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Unpublish { path, output } => {
            let mut workflow = read_workflow(&path)?;
            workflow.unpublish()?;
            write_workflow(output.as_deref().unwrap_or(path.as_path()), &workflow)?;
            println!("\"{}\" reverted to draft.", workflow.name);
        }
        Command::Catalog { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&nodes::catalog())?);
            } else {
                report::node_catalog();
            }
        }
        Command::Demo { name: Some(name) } => {
            let workflow = demo::by_name(&name)
                .with_context(|| format!("unknown demo '{name}'"))?;
            println!("{}", serde_json::to_string_pretty(&workflow)?);
        }
        Command::Demo { name: None } => report::demos(&demo::all()),
    }

    Ok(())
}

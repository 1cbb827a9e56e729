//! Human-readable terminal output.

use engine::{Outcome, StepRecord, Trace, ValidationError, Workflow};
use nodes::catalog;

pub fn validation(workflow: &Workflow, errors: &[ValidationError]) {
    if errors.is_empty() {
        println!("✅ \"{}\" is ready to publish.", workflow.name);
        return;
    }

    println!("❌ \"{}\" has {} validation error(s):", workflow.name, errors.len());
    for error in errors {
        match &error.node_id {
            Some(id) => println!("  • {error}  [{id}]"),
            None => println!("  • {error}"),
        }
    }
}

pub fn record(record: &StepRecord) {
    println!(
        "STEP {:>2}  {:<9}  {}",
        record.step,
        record.kind.to_string(),
        record.message
    );
    if !record.detail.is_empty() {
        println!("{:15}{}", "", record.detail);
    }
}

pub fn outcome(trace: &Trace) {
    match trace.outcome {
        Outcome::Completed => println!("\nPath: {}", trace.path.join(" → ")),
        Outcome::NoTrigger => println!("\nNothing to run."),
        Outcome::IterationLimit => println!(
            "\nStopped after {} steps without reaching the end of the path.",
            trace.records.len()
        ),
        Outcome::Cancelled => println!("\nCancelled after {} step(s).", trace.records.len()),
    }
}

pub fn node_catalog() {
    for (category, definitions) in catalog() {
        println!("{}", category.title());
        for def in definitions {
            let mut tags = Vec::new();
            if def.ai_assisted {
                tags.push("AI".to_owned());
            }
            if def.is_branching() {
                tags.push("branching".to_owned());
            }
            for field in def.required_fields {
                tags.push(format!("requires {}", field.key));
            }
            let tags = if tags.is_empty() { String::new() } else { format!("  ({})", tags.join(", ")) };
            println!("  {:<28} {:<28} {}{}", def.kind.as_str(), def.name, def.subtitle, tags);
        }
    }
}

pub fn demos(workflows: &[Workflow]) {
    for (name, workflow) in engine::demo::NAMES.iter().zip(workflows) {
        println!(
            "{:<12} {:<50} {:<8} {} nodes",
            name,
            workflow.name,
            workflow.status.to_string(),
            workflow.nodes.len()
        );
    }
}

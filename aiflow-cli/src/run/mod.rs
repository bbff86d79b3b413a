//! Run entry points: load a layout, run it against the simulated agent, report.
//!
//! Re-exports [`run_file`], [`run_layout`], [`run_with_options`] and [`RunReport`].

mod events;
mod simulated;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use aiflow::context::{event_channel, ContextOptions, ContextStatus, ExecutionContext, FaultReport};
use aiflow::layout::{load_graph, GraphLayout, NodeRegistry};
use aiflow::tags::{AllTagsPredicate, TagSet};
use aiflow::Blackboard;

use crate::config::{Error, RunConfig, RunOptions};

pub use events::describe;
pub use simulated::SimulatedSubsystem;

/// What a run ended with.
#[derive(Debug)]
pub struct RunReport {
    /// `Running` when the tick limit was reached first; the context was then cancelled.
    pub status: ContextStatus,
    pub faults: Vec<FaultReport>,
    pub blackboard: Blackboard,
}

impl RunReport {
    pub fn timed_out(&self) -> bool {
        self.status == ContextStatus::Running
    }
}

/// Built-in nodes plus `tag_condition` (all-tags evaluator) and `ai_task`
/// (simulated agent).
pub fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::builtin();
    registry.register_tag_condition(Arc::new(AllTagsPredicate));
    registry.register_ai_task(Arc::new(SimulatedSubsystem));
    registry
}

pub fn load_layout(path: &Path) -> Result<GraphLayout, Error> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    Ok(GraphLayout::from_json(&json)?)
}

/// Builds, finalizes and drives the graph until it finishes or hits the tick limit.
pub async fn run_layout(layout: &GraphLayout, config: &RunConfig) -> Result<RunReport, Error> {
    let mut graph = load_graph(layout, &registry())?;
    if let Some(seed) = config.seed {
        graph.set_seed(seed)?;
    }
    graph.finalize()?;

    let tags: TagSet = config.tags.iter().map(String::as_str).collect();
    let mut options = ContextOptions::default()
        .with_agent(config.agent.clone())
        .with_tags(tags);
    let printer = if config.verbose {
        let (tx, stream) = event_channel();
        options = options.with_events(tx);
        Some(events::spawn_printer(stream))
    } else {
        None
    };

    let mut ctx = ExecutionContext::start_with(Arc::new(graph), BTreeMap::new(), options)?;
    let status = ctx
        .drive_for(config.tick_period(), config.max_ticks)
        .await;
    if status == ContextStatus::Running {
        tracing::warn!(max_ticks = config.max_ticks, "tick limit reached, cancelling");
        ctx.cancel();
    }
    let report = RunReport {
        status,
        faults: ctx.faults().to_vec(),
        blackboard: ctx.blackboard().clone(),
    };

    // the printer ends once the context drops its sender
    drop(ctx);
    if let Some(printer) = printer {
        printer.await?;
    }
    Ok(report)
}

pub async fn run_file(path: &Path, config: &RunConfig) -> Result<RunReport, Error> {
    let layout = load_layout(path)?;
    run_layout(&layout, config).await
}

/// Loads `.env`, builds `RunConfig` from env, applies `options`, then runs `path`.
pub async fn run_with_options(path: &Path, options: &RunOptions) -> Result<RunReport, Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env()?;
    config.apply_options(options);
    run_file(path, &config).await
}

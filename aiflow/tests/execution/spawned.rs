//! Async tasks on the tokio runtime and the interval driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use aiflow::ai::AsyncTask;
use aiflow::error::NodeFault;
use aiflow::graph::{FlowGraph, InputValues, NodeResult, Outcome};
use aiflow::nodes::{SpawnedTaskNode, StartNode, WaitNode};
use aiflow::value::Value;
use aiflow::{ContextStatus, NodeState};

use crate::common::{finalize, start, Probe};

struct Lookup;

#[async_trait]
impl AsyncTask for Lookup {
    async fn run(&self, _inputs: InputValues) -> Result<Outcome, NodeFault> {
        tokio::task::yield_now().await;
        Ok(Outcome::success().fire_value("Success", 7))
    }
}

/// Sleeps, then records that it ran to the end.
struct Slow {
    finished: Arc<AtomicBool>,
}

#[async_trait]
impl AsyncTask for Slow {
    async fn run(&self, _inputs: InputValues) -> Result<Outcome, NodeFault> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(Outcome::success().fire("Success"))
    }
}

struct Broken;

#[async_trait]
impl AsyncTask for Broken {
    async fn run(&self, _inputs: InputValues) -> Result<Outcome, NodeFault> {
        Err(NodeFault::Subsystem("service unavailable".to_string()))
    }
}

/// **Scenario**: a spawned task's outcome completes the node on a later step
/// and routes its payload downstream.
#[tokio::test]
async fn spawned_task_completes_through_driver() {
    let probe = Probe::default();
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let t = graph.add_node("Lookup", SpawnedTaskNode::new(Lookup)).unwrap();
    let p = graph.add_node("Probe", probe.clone()).unwrap();
    graph.connect(s, "Out", t, "In").unwrap();
    graph.connect(t, "Success", p, "Value").unwrap();
    graph.connect(t, "Success", p, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    assert_eq!(ctx.node_state(t), Some(NodeState::Running));

    let status = ctx.drive_for(Duration::from_millis(5), 200).await;
    assert_eq!(status, ContextStatus::Finished(NodeResult::Success));
    assert_eq!(probe.last_value(), Some(Value::Int(7)));
}

/// **Scenario**: a task failing asynchronously is a fault that fires `Failure`.
#[tokio::test]
async fn spawned_task_failure_fires_failure() {
    let probe = Probe::default();
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let t = graph.add_node("Broken", SpawnedTaskNode::new(Broken)).unwrap();
    let p = graph.add_node("OnFailure", probe.clone()).unwrap();
    graph.connect(s, "Out", t, "In").unwrap();
    graph.connect(t, "Failure", p, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    ctx.drive_for(Duration::from_millis(5), 200).await;

    assert!(ctx.is_finished());
    assert_eq!(probe.activations(), 1);
    assert_eq!(
        ctx.faults()[0].fault,
        NodeFault::Subsystem("service unavailable".to_string())
    );
}

/// **Scenario**: cancelling the context aborts the spawned future.
#[tokio::test]
async fn cancel_aborts_spawned_task() {
    let finished = Arc::new(AtomicBool::new(false));
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let t = graph
        .add_node(
            "Slow",
            SpawnedTaskNode::new(Slow {
                finished: Arc::clone(&finished),
            }),
        )
        .unwrap();
    graph.connect(s, "Out", t, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    tokio::time::sleep(Duration::from_millis(5)).await;
    ctx.cancel();
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(ctx.is_cancelled());
    assert!(!finished.load(Ordering::SeqCst));
}

/// **Scenario**: outside a tokio runtime the node faults instead of panicking.
#[test]
fn spawned_task_without_runtime_faults() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let t = graph.add_node("Lookup", SpawnedTaskNode::new(Lookup)).unwrap();
    graph.connect(s, "Out", t, "In").unwrap();
    let ctx = start(&finalize(graph));

    assert!(matches!(&ctx.faults()[0].fault, NodeFault::Subsystem(msg) if msg.contains("tokio")));
    assert_eq!(
        ctx.node_outputs(t).map(|f| f[0].pin.as_str()),
        Some("Failure")
    );
}

/// **Scenario**: the driver steps until a wait finishes; a tick limit stops it early.
#[tokio::test]
async fn driver_runs_until_terminal_or_limit() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let w = graph.add_node("Wait", WaitNode::seconds(0.03)).unwrap();
    graph.connect(s, "Out", w, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    let status = ctx.drive(Duration::from_millis(10)).await;
    assert_eq!(status, ContextStatus::Finished(NodeResult::Success));

    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let w = graph.add_node("Wait", WaitNode::seconds(60.0)).unwrap();
    graph.connect(s, "Out", w, "In").unwrap();
    let mut ctx = start(&finalize(graph));

    let status = ctx.drive_for(Duration::from_millis(1), 3).await;
    assert_eq!(status, ContextStatus::Running);
    assert_eq!(ctx.node_state(w), Some(NodeState::Running));
}

//! Faults caught at the scheduler boundary.

use std::sync::Arc;

use aiflow::ai::{AiRequest, AiSubsystem, TaskHandle};
use aiflow::context::Completer;
use aiflow::error::NodeFault;
use aiflow::graph::{FlowGraph, NodeResult, Outcome};
use aiflow::nodes::{AiTaskNode, SequenceNode, StartNode, TagConditionNode};
use aiflow::tags::{AllTagsPredicate, TagError, TagQuery};
use aiflow::value::{PinType, Value};
use aiflow::{ContextStatus, NodeState};

use crate::common::{
    finalize, start, with_keeper, ExternalTask, FailingEntry, Fires, Panicker, Probe,
};

/// **Scenario**: a panicking node finishes with Failure, the panic is reported
/// and the rest of the graph keeps running.
#[test]
fn panic_becomes_failure_and_run_continues() {
    let after = Probe::default();
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let seq = graph.add_node("Seq", SequenceNode::with_outputs(2)).unwrap();
    let bad = graph.add_node("Bad", Panicker).unwrap();
    let p = graph.add_node("After", after.clone()).unwrap();
    graph.connect(s, "Out", seq, "In").unwrap();
    graph.connect(seq, "Out0", bad, "In").unwrap();
    graph.connect(seq, "Out1", p, "In").unwrap();
    let ctx = start(&finalize(graph));

    assert_eq!(ctx.node_state(bad), Some(NodeState::Finished(NodeResult::Failure)));
    assert_eq!(after.activations(), 1);
    assert_eq!(ctx.result(), Some(NodeResult::Success));

    let faults = ctx.faults();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].node, bad);
    assert_eq!(faults[0].name, "Bad");
    assert!(matches!(&faults[0].fault, NodeFault::Panicked(msg) if msg.contains("kaboom")));
}

/// **Scenario**: the only entry faulting without a fault output fails the context.
#[test]
fn sole_entry_fault_fails_context() {
    let mut graph = FlowGraph::new();
    graph.add_node("Entry", FailingEntry).unwrap();
    let ctx = start(&finalize(graph));

    assert_eq!(ctx.status(), ContextStatus::Finished(NodeResult::Failure));
    assert_eq!(
        ctx.faults()[0].fault,
        NodeFault::Activation("entry failed".to_string())
    );
}

struct RejectingSubsystem;

impl AiSubsystem for RejectingSubsystem {
    fn issue(
        &self,
        request: &AiRequest,
        _completer: Completer,
    ) -> Result<Box<dyn TaskHandle>, NodeFault> {
        Err(NodeFault::Subsystem(format!("cannot {}", request.action)))
    }
}

/// **Scenario**: a rejected AI request fires the node's fault output.
#[test]
fn fault_output_fires_on_fault() {
    let handler = Probe::default();
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let task = graph
        .add_node(
            "MoveTo",
            AiTaskNode::new(Arc::new(RejectingSubsystem), AiRequest::new("move_to")),
        )
        .unwrap();
    let h = graph.add_node("Handler", handler.clone()).unwrap();
    graph.connect(s, "Out", task, "In").unwrap();
    graph.connect(task, "Failure", h, "In").unwrap();
    let ctx = start(&finalize(graph));

    assert_eq!(handler.activations(), 1);
    assert_eq!(
        ctx.faults()[0].fault,
        NodeFault::Subsystem("cannot move_to".to_string())
    );
    assert_eq!(
        ctx.node_outputs(task).map(|f| f[0].pin.as_str()),
        Some("Failure")
    );
}

/// **Scenario**: firing an undeclared pin is a fault and nothing is routed.
#[test]
fn unknown_output_is_a_fault() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let f = graph
        .add_node(
            "Fires",
            Fires {
                outcome: Outcome::success().fire("Nope"),
            },
        )
        .unwrap();
    graph.connect(s, "Out", f, "In").unwrap();
    let ctx = start(&finalize(graph));

    assert_eq!(ctx.faults()[0].fault, NodeFault::UnknownOutput("Nope".to_string()));
    assert_eq!(ctx.node_state(f), Some(NodeState::Finished(NodeResult::Failure)));
    assert_eq!(ctx.result(), Some(NodeResult::Failure));
}

/// **Scenario**: a value of the wrong type on a typed output is a fault.
#[test]
fn output_type_mismatch_is_a_fault() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let f = graph
        .add_node(
            "Fires",
            Fires {
                outcome: Outcome::success().fire_value("Count", Value::Bool(true)),
            },
        )
        .unwrap();
    graph.connect(s, "Out", f, "In").unwrap();
    let ctx = start(&finalize(graph));

    assert_eq!(
        ctx.faults()[0].fault,
        NodeFault::OutputTypeMismatch {
            pin: "Count".to_string(),
            expected: PinType::Int,
            actual: PinType::Bool,
        }
    );
}

/// **Scenario**: a tag evaluation error is a fault; the condition fires nothing.
#[test]
fn tag_error_is_a_fault() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let c = graph
        .add_node(
            "Check",
            TagConditionNode::new(Arc::new(AllTagsPredicate), TagQuery::new("!")),
        )
        .unwrap();
    graph.connect(s, "Out", c, "In").unwrap();
    let ctx = start(&finalize(graph));

    assert_eq!(
        ctx.faults()[0].fault,
        NodeFault::Tag(TagError::InvalidQuery("!".to_string()))
    );
    assert_eq!(ctx.node_outputs(c).map(|fired| fired.len()), Some(0));
}

/// **Scenario**: a completion carrying an old ticket is discarded; the current
/// activation keeps running until its own completer reports.
#[test]
fn stale_completion_is_rejected() {
    let ext = ExternalTask::default();
    let mut graph = FlowGraph::new();
    let seq = with_keeper(&mut graph);
    let e = graph.add_node("External", ext.clone()).unwrap();
    graph.connect(seq, "Out0", e, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    let first = ext.completer(0);
    first.complete(Outcome::success().fire("Out"));
    ctx.tick(0.1);
    assert_eq!(ctx.node_state(e), Some(NodeState::Finished(NodeResult::Success)));

    ctx.trigger(e, "In", None).unwrap();
    assert_eq!(ext.issued(), 2);

    // the first activation's completer reports again
    first.complete(Outcome::failure());
    ctx.tick(0.1);
    assert_eq!(ctx.node_state(e), Some(NodeState::Running));

    ext.completer(1).fail(NodeFault::activation("lost target"));
    ctx.tick(0.1);
    assert_eq!(ctx.node_state(e), Some(NodeState::Finished(NodeResult::Failure)));
    assert_eq!(ctx.faults().len(), 1);
}

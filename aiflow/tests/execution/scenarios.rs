//! End-to-end runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use aiflow::context::{event_channel, ContextEvent, ContextOptions, NodeContext};
use aiflow::error::NodeFault;
use aiflow::graph::{
    Activation, FiredPin, FlowGraph, FlowNode, InputValues, NodeInfo, NodeKind, NodeResult,
    Outcome, PinSpec,
};
use aiflow::nodes::{
    BranchNode, FinishNode, InvertNode, PassThroughNode, SequenceNode, StartNode, WaitNode,
};
use aiflow::value::Value;
use aiflow::{ContextStatus, ExecutionContext, NodeState};

use crate::common::{finalize, start, with_keeper, Probe, TickingTask};

/// **Scenario**: Start -> TaskA (two ticks) -> Branch(true) -> TaskB finishes with Success
/// once TaskA completes, and TaskB's output is recorded.
#[test]
fn task_branch_task_runs_to_success() {
    let task_a = TickingTask::new(2);
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let a = graph.add_node("TaskA", task_a.clone()).unwrap();
    let b = graph.add_node("Branch", BranchNode::constant(true)).unwrap();
    let t = graph.add_node("TaskB", PassThroughNode::default()).unwrap();
    graph.connect(s, "Out", a, "In").unwrap();
    graph.connect(a, "Out", b, "In").unwrap();
    graph.connect(b, "True", t, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    assert_eq!(ctx.node_state(a), Some(NodeState::Running));
    assert_eq!(ctx.tick(1.0), ContextStatus::Running);
    assert_eq!(ctx.tick(1.0), ContextStatus::Finished(NodeResult::Success));

    assert_eq!(ctx.result(), Some(NodeResult::Success));
    assert_eq!(
        ctx.node_outputs(t),
        Some(
            &[FiredPin {
                pin: "Out".to_string(),
                value: None
            }][..]
        )
    );
    assert_eq!(task_a.counters.activations(), 1);
    assert_eq!(task_a.counters.cancels(), 0);
    assert!(ctx.faults().is_empty());
}

/// **Scenario**: a terminal node finishes the context with its own result and
/// cancels the sibling that is still running.
#[test]
fn terminal_node_tears_down_running_nodes() {
    let long = TickingTask::new(100);
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let seq = graph.add_node("Seq", SequenceNode::with_outputs(2)).unwrap();
    let task = graph.add_node("Long", long.clone()).unwrap();
    let fail = graph.add_node("Fail", FinishNode::failure()).unwrap();
    graph.connect(s, "Out", seq, "In").unwrap();
    graph.connect(seq, "Out0", task, "In").unwrap();
    graph.connect(seq, "Out1", fail, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    assert_eq!(ctx.status(), ContextStatus::Finished(NodeResult::Failure));
    assert_eq!(long.counters.cancels(), 1);
    assert_eq!(ctx.node_state(task), Some(NodeState::Cancelled));

    // terminal contexts ignore further steps
    assert_eq!(ctx.tick(1.0), ContextStatus::Finished(NodeResult::Failure));
    assert_eq!(long.counters.cancels(), 1);
}

/// **Scenario**: with no terminal node the context finishes when it drains,
/// taking the result of the last node that finished.
#[test]
fn drained_context_takes_last_result() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let check = graph
        .add_node("NotTrue", InvertNode::new(BranchNode::constant(true)))
        .unwrap();
    graph.connect(s, "Out", check, "In").unwrap();
    let graph = finalize(graph);

    let ctx = start(&graph);
    assert_eq!(ctx.result(), Some(NodeResult::Failure));
    assert_eq!(
        ctx.node_outputs(check).map(|f| f[0].pin.as_str()),
        Some("False")
    );
}

/// **Scenario**: sequence outputs start their branches in pin order.
#[test]
fn sequence_starts_branches_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    struct Named(&'static str, Arc<Mutex<Vec<&'static str>>>);
    impl FlowNode for Named {
        fn info(&self) -> NodeInfo {
            NodeInfo::new(NodeKind::Action).input(PinSpec::input("In"))
        }
        fn on_activate(
            &self,
            _ctx: &mut NodeContext<'_>,
            _inputs: &InputValues,
        ) -> Result<Activation, NodeFault> {
            self.1.lock().unwrap().push(self.0);
            Ok(Outcome::success().into())
        }
    }

    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let seq = graph.add_node("Seq", SequenceNode::with_outputs(3)).unwrap();
    graph.connect(s, "Out", seq, "In").unwrap();
    for (i, name) in ["A", "B", "C"].into_iter().enumerate() {
        let n = graph.add_node(name, Named(name, Arc::clone(&order))).unwrap();
        graph
            .connect(seq, &SequenceNode::output_name(i), n, "In")
            .unwrap();
    }
    let ctx = start(&finalize(graph));

    assert!(ctx.is_finished());
    assert_eq!(*order.lock().unwrap(), vec!["A", "B", "C"]);
}

/// **Scenario**: entry activations receive the context's initial inputs.
#[test]
fn entry_receives_initial_inputs() {
    let probe = Probe::default();
    let mut graph = FlowGraph::new();
    let p = graph.add_node("Probe", probe.clone()).unwrap();
    graph.set_entry(p, true).unwrap();
    let graph = finalize(graph);

    let mut inputs = BTreeMap::new();
    inputs.insert("Speed".to_string(), Value::Float(2.5));
    let ctx = ExecutionContext::start(graph, inputs).unwrap();

    assert_eq!(ctx.result(), Some(NodeResult::Success));
    let seen = probe.seen.lock().unwrap();
    assert_eq!(seen[0].get("Speed"), Some(&Value::Float(2.5)));
    assert_eq!(seen[0].activating_pin(), None);
}

/// **Scenario**: a data value travels along the connection into the target's cache.
#[test]
fn data_values_reach_downstream_inputs() {
    let probe = Probe::default();
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let emit = graph
        .add_node(
            "Emit",
            crate::common::Fires {
                outcome: Outcome::success().fire_value("Count", 12),
            },
        )
        .unwrap();
    let p = graph.add_node("Probe", probe.clone()).unwrap();
    graph.connect(s, "Out", emit, "In").unwrap();
    graph.connect(emit, "Count", p, "Value").unwrap();
    graph.connect(emit, "Count", p, "In").unwrap();
    let ctx = start(&finalize(graph));

    // the data pin is fed first, so the value is cached before Probe activates
    assert!(ctx.is_finished());
    assert_eq!(probe.activations(), 1);
    assert_eq!(probe.last_value(), Some(Value::Int(12)));
}

/// **Scenario**: the event stream reports the run from start to finish.
#[test]
fn events_follow_the_run() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let f = graph.add_node("Done", FinishNode::success()).unwrap();
    graph.connect(s, "Out", f, "In").unwrap();
    let graph = finalize(graph);

    let (tx, stream) = event_channel();
    let ctx = ExecutionContext::start_with(
        graph,
        BTreeMap::new(),
        ContextOptions::default().with_agent("npc-7").with_events(tx),
    )
    .unwrap();
    assert!(ctx.is_finished());

    let mut rx = stream.into_inner();
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events.first(),
        Some(&ContextEvent::Started {
            agent: "npc-7".to_string()
        })
    );
    assert!(events.contains(&ContextEvent::Finished {
        node: s,
        name: "Start".to_string(),
        result: NodeResult::Success,
        fired: vec!["Out".to_string()],
    }));
    assert_eq!(
        events.last(),
        Some(&ContextEvent::ContextFinished(NodeResult::Success))
    );
}

/// **Scenario**: one graph template backs several independent contexts.
#[test]
fn contexts_share_a_graph() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let t = graph.add_node("Task", TickingTask::new(1)).unwrap();
    graph.connect(s, "Out", t, "In").unwrap();
    let graph = finalize(graph);

    let mut first = start(&graph);
    let second = start(&graph);
    first.tick(0.1);
    assert!(first.is_finished());
    assert_eq!(second.node_state(t), Some(NodeState::Running));
}

/// **Scenario**: an inverted finish is still terminal and ends the run with the
/// flipped result while the keeper would otherwise hold it open.
#[test]
fn inverted_finish_ends_the_run() {
    let mut graph = FlowGraph::new();
    let seq = with_keeper(&mut graph);
    let f = graph
        .add_node("Finish", InvertNode::new(FinishNode::success()))
        .unwrap();
    graph.connect(seq, "Out0", f, "In").unwrap();
    let graph = finalize(graph);

    let ctx = start(&graph);
    assert_eq!(ctx.result(), Some(NodeResult::Failure));
}

/// **Scenario**: an inverted start is still picked up as an entry node.
#[test]
fn inverted_start_is_an_entry() {
    let probe = Probe::default();
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", InvertNode::new(StartNode)).unwrap();
    let p = graph.add_node("Probe", probe.clone()).unwrap();
    graph.connect(s, "Out", p, "In").unwrap();
    assert!(graph.node(s).unwrap().is_entry());
    let graph = finalize(graph);

    let _ctx = start(&graph);
    assert_eq!(probe.activations(), 1);
}

/// **Scenario**: a wait whose duration is NaN finishes at once instead of
/// staying Running forever.
#[test]
fn nan_wait_finishes_immediately() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let w = graph.add_node("Wait", WaitNode::seconds(f32::NAN)).unwrap();
    let f = graph.add_node("Finish", FinishNode::success()).unwrap();
    graph.connect(s, "Out", w, "In").unwrap();
    graph.connect(w, "Out", f, "In").unwrap();
    let graph = finalize(graph);

    let ctx = start(&graph);
    assert_eq!(ctx.result(), Some(NodeResult::Success));
}

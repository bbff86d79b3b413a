//! Seeded random routing.

use std::sync::Arc;

use aiflow::graph::{FlowGraph, NodeResult};
use aiflow::nodes::{
    RollGuaranteedConfig, RollGuaranteedNode, RollWeightedNode, FAILURE_OUT, GUARANTEED_OUT,
};
use aiflow::{ExecutionContext, NodeId};

use crate::common::{finalize, start, with_keeper, Probe};

/// Keeper graph with `node` on `Out0`; returns the shared graph and the node id.
fn roll_graph<N: aiflow::FlowNode + 'static>(node: N, seed: u64) -> (Arc<FlowGraph>, NodeId) {
    let mut graph = FlowGraph::new();
    let seq = with_keeper(&mut graph);
    let roll = graph.add_node("Roll", node).unwrap();
    graph.connect(seq, "Out0", roll, "In").unwrap();
    graph.set_seed(seed).unwrap();
    (finalize(graph), roll)
}

/// Fired pin of each of `n` further activations of `roll`.
fn picks(ctx: &mut ExecutionContext, roll: NodeId, n: usize) -> Vec<String> {
    (0..n)
        .map(|_| {
            ctx.trigger(roll, "In", None).unwrap();
            ctx.node_outputs(roll)
                .and_then(|f| f.first())
                .map(|f| f.pin.clone())
                .unwrap_or_default()
        })
        .collect()
}

fn weighted() -> RollWeightedNode {
    RollWeightedNode::default()
        .option("Left", 1.0)
        .option("Right", 1.0)
        .option("Back", 2.0)
}

/// **Scenario**: the same seed yields the same picks in every context; the
/// picks only come from the configured options.
#[test]
fn weighted_roll_is_deterministic_per_seed() {
    let (graph, roll) = roll_graph(weighted(), 1234);
    let mut first = start(&graph);
    let mut second = start(&graph);

    let a = picks(&mut first, roll, 20);
    let b = picks(&mut second, roll, 20);
    assert_eq!(a, b);
    assert!(a.iter().all(|p| ["Left", "Right", "Back"].contains(&p.as_str())));
}

/// **Scenario**: options with zero or negative weight are never picked.
#[test]
fn weighted_roll_skips_non_positive_weights() {
    let node = RollWeightedNode::default()
        .option("Never", 0.0)
        .option("Always", 3.0)
        .option("Negative", -5.0);
    let (graph, roll) = roll_graph(node, 7);
    let mut ctx = start(&graph);

    assert!(picks(&mut ctx, roll, 10).iter().all(|p| p == "Always"));
}

/// **Scenario**: with no positive weight the roll fails and fires nothing.
#[test]
fn weighted_roll_without_weights_fails() {
    let (graph, roll) = roll_graph(RollWeightedNode::default().option("Only", 0.0), 7);
    let ctx = start(&graph);

    assert_eq!(
        ctx.node_state(roll),
        Some(aiflow::NodeState::Finished(NodeResult::Failure))
    );
    assert_eq!(ctx.node_outputs(roll).map(|f| f.len()), Some(0));
}

/// **Scenario**: a guaranteed roll succeeds exactly once per cycle of
/// `maximum_attempts` rolls.
#[test]
fn guaranteed_roll_succeeds_once_per_cycle() {
    let hits = Probe::default();
    let misses = Probe::default();
    let node = RollGuaranteedNode::new(RollGuaranteedConfig {
        maximum_attempts: 3,
        reset_on_success: false,
    });

    let mut graph = FlowGraph::new();
    let seq = with_keeper(&mut graph);
    let roll = graph.add_node("Roll", node).unwrap();
    let h = graph.add_node("Hit", hits.clone()).unwrap();
    let m = graph.add_node("Miss", misses.clone()).unwrap();
    graph.connect(seq, "Out0", roll, "Reset").unwrap();
    graph.connect(roll, GUARANTEED_OUT, h, "In").unwrap();
    graph.connect(roll, FAILURE_OUT, m, "In").unwrap();
    graph.set_seed(99).unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    for _ in 0..9 {
        ctx.trigger(roll, "In", None).unwrap();
    }
    assert_eq!(hits.activations(), 3);
    assert_eq!(misses.activations(), 6);
}

/// **Scenario**: `Reset` mid-cycle starts a fresh cycle, so the two attempts
/// after it always contain exactly one success, whatever the stray attempt before.
#[test]
fn guaranteed_roll_reset_starts_new_cycle() {
    let hits = Probe::default();
    let node = RollGuaranteedNode::new(RollGuaranteedConfig {
        maximum_attempts: 2,
        reset_on_success: false,
    });

    let mut graph = FlowGraph::new();
    let seq = with_keeper(&mut graph);
    let roll = graph.add_node("Roll", node).unwrap();
    let h = graph.add_node("Hit", hits.clone()).unwrap();
    graph.connect(seq, "Out0", roll, "Reset").unwrap();
    graph.connect(roll, GUARANTEED_OUT, h, "In").unwrap();
    let graph = finalize(graph);

    let mut ctx = start(&graph);
    for _ in 0..8 {
        ctx.trigger(roll, "In", None).unwrap();
        ctx.trigger(roll, "Reset", None).unwrap();
        let before = hits.activations();
        ctx.trigger(roll, "In", None).unwrap();
        ctx.trigger(roll, "In", None).unwrap();
        assert_eq!(hits.activations() - before, 1);
    }
}

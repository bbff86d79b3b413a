//! Graph building and finalize-time validation.

use std::collections::BTreeMap;
use std::sync::Arc;

use aiflow::graph::{FlowGraph, MergePolicy, PinSpec};
use aiflow::nodes::{
    BranchNode, FinishNode, GetBlackboardValuesNode, PassThroughNode, StartNode,
};
use aiflow::value::PinType;
use aiflow::{ExecutionContext, FlowError};

use crate::common::Probe;

/// **Scenario**: connecting pins of incompatible types fails with both pin labels.
#[test]
fn connect_rejects_type_mismatch() {
    let mut graph = FlowGraph::new();
    let get = graph
        .add_node("Get", GetBlackboardValuesNode::default().key("Ammo", PinType::Int))
        .unwrap();
    let branch = graph.add_node("Branch", BranchNode::constant(false)).unwrap();

    assert_eq!(
        graph.connect(get, "Ammo", branch, "Condition"),
        Err(FlowError::TypeMismatch {
            source_pin: "Get.Ammo".to_string(),
            source_type: PinType::Int,
            target_pin: "Branch.Condition".to_string(),
            target_type: PinType::Bool,
        })
    );
}

/// **Scenario**: pin direction, unknown pins and unknown nodes are reported distinctly.
#[test]
fn connect_reports_direction_and_missing_pins() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let b = graph.add_node("Branch", BranchNode::default()).unwrap();

    assert!(matches!(
        graph.connect(s, "Out", b, "True"),
        Err(FlowError::DirectionError(_))
    ));
    assert!(matches!(
        graph.connect(b, "In", s, "Out"),
        Err(FlowError::DirectionError(_))
    ));
    assert_eq!(
        graph.connect(s, "Out", b, "Whatever"),
        Err(FlowError::PinNotFound {
            node: "Branch".to_string(),
            pin: "Whatever".to_string(),
        })
    );

    graph.remove_node(b).unwrap();
    assert!(matches!(
        graph.connect(s, "Out", b, "In"),
        Err(FlowError::NodeNotFound(_))
    ));
}

/// **Scenario**: duplicate connections and a second feed into a single-input pin
/// are rejected; multi-input pins accept several feeds.
#[test]
fn connect_rejects_duplicates_and_double_feeds() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let s2 = graph.add_node("Start2", StartNode).unwrap();
    let b = graph.add_node("Branch", BranchNode::default()).unwrap();
    let j = graph
        .add_node("Join", PassThroughNode::join(MergePolicy::All))
        .unwrap();

    graph.connect(s, "Out", b, "In").unwrap();
    assert!(matches!(
        graph.connect(s, "Out", b, "In"),
        Err(FlowError::DuplicateConnection(_))
    ));
    assert_eq!(
        graph.connect(s2, "Out", b, "In"),
        Err(FlowError::InputAlreadyConnected("Branch.In".to_string()))
    );

    graph.connect(s, "Out", j, "In").unwrap();
    graph.connect(s2, "Out", j, "In").unwrap();
    assert!(matches!(
        graph.add_node("Join", StartNode),
        Err(FlowError::DuplicateNodeName(name)) if name == "Join"
    ));
}

/// **Scenario**: disconnect and remove_node drop connections; unknown pins are a no-op.
#[test]
fn disconnect_and_remove_node() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let p = graph.add_node("Probe", Probe::default()).unwrap();
    let f = graph.add_node("Done", FinishNode::success()).unwrap();
    graph.connect(s, "Out", p, "In").unwrap();
    let id = graph.connect(p, "Out", f, "In").unwrap();

    assert_eq!(graph.disconnect(s, "Out", p, "In"), Ok(true));
    assert_eq!(graph.disconnect(s, "Out", p, "In"), Ok(false));
    assert_eq!(graph.disconnect(s, "Nope", p, "In"), Ok(false));

    graph.remove_node(f).unwrap();
    assert!(graph.connection(id).is_none());
    assert!(graph.node(f).is_none());
    assert_eq!(graph.node_id("Done"), None);
    assert_eq!(graph.connections().count(), 0);
}

/// **Scenario**: a graph without entries does not finalize.
#[test]
fn finalize_requires_an_entry() {
    let mut graph = FlowGraph::new();
    graph.add_node("Lonely", PassThroughNode::default()).unwrap();
    assert_eq!(graph.finalize(), Err(FlowError::NoEntryNode));
}

/// **Scenario**: a reachable node with an unconnected required input fails finalize.
#[test]
fn finalize_rejects_unconnected_required_input() {
    struct NeedsTarget;
    impl aiflow::FlowNode for NeedsTarget {
        fn info(&self) -> aiflow::NodeInfo {
            aiflow::NodeInfo::new(aiflow::NodeKind::Task)
                .input(PinSpec::input("In").required())
                .input(PinSpec::data("Target", PinType::Any).required())
        }
        fn on_activate(
            &self,
            _ctx: &mut aiflow::NodeContext<'_>,
            _inputs: &aiflow::InputValues,
        ) -> Result<aiflow::Activation, aiflow::NodeFault> {
            Ok(aiflow::Outcome::success().into())
        }
    }

    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let n = graph.add_node("Needs", NeedsTarget).unwrap();
    graph.connect(s, "Out", n, "In").unwrap();
    assert_eq!(
        graph.finalize(),
        Err(FlowError::UnconnectedRequiredInput {
            node: "Needs".to_string(),
            pin: "Target".to_string(),
        })
    );
}

/// **Scenario**: a cycle through non-latched nodes is illegal and names its nodes;
/// the same cycle is accepted when loops are allowed or every node on it is latched.
#[test]
fn cycles_need_latched_nodes_or_allow_loops() {
    fn cyclic() -> (FlowGraph, aiflow::NodeId, aiflow::NodeId) {
        let mut graph = FlowGraph::new();
        let s = graph.add_node("Start", StartNode).unwrap();
        let a = graph.add_node("A", PassThroughNode::default()).unwrap();
        let b = graph.add_node("B", PassThroughNode::default()).unwrap();
        graph.connect(s, "Out", a, "In").unwrap();
        graph.connect(a, "Out", b, "In").unwrap();
        graph.connect(b, "Out", a, "In").unwrap();
        (graph, a, b)
    }

    let (mut graph, _, _) = cyclic();
    assert_eq!(
        graph.finalize(),
        Err(FlowError::IllegalCycle(vec![
            "A".to_string(),
            "B".to_string(),
            "A".to_string()
        ]))
    );

    let (mut graph, a, _) = cyclic();
    graph.set_latched(a, true).unwrap();
    assert!(matches!(graph.finalize(), Err(FlowError::IllegalCycle(_))));

    let (mut graph, a, b) = cyclic();
    graph.set_latched(a, true).unwrap();
    graph.set_latched(b, true).unwrap();
    assert_eq!(graph.finalize(), Ok(()));

    let (mut graph, _, _) = cyclic();
    graph.allow_loops(true).unwrap();
    assert_eq!(graph.finalize(), Ok(()));
}

/// **Scenario**: finalize is idempotent and freezes the graph; only finalized
/// graphs can start.
#[test]
fn finalize_freezes_graph() {
    let mut graph = FlowGraph::new();
    let s = graph.add_node("Start", StartNode).unwrap();
    let p = graph.add_node("Probe", Probe::default()).unwrap();
    graph.connect(s, "Out", p, "In").unwrap();

    let unfinished = Arc::new(FlowGraph::new());
    assert_eq!(
        ExecutionContext::start(unfinished, BTreeMap::new()).unwrap_err(),
        FlowError::GraphNotFinalized
    );

    graph.finalize().unwrap();
    assert!(graph.is_finalized());
    assert_eq!(graph.finalize(), Ok(()));
    assert_eq!(
        graph.add_node("Late", StartNode),
        Err(FlowError::GraphFrozen)
    );
    assert_eq!(graph.connect(p, "Out", s, "Out"), Err(FlowError::GraphFrozen));
    assert_eq!(graph.set_seed(9), Err(FlowError::GraphFrozen));
    assert_eq!(graph.remove_node(p), Err(FlowError::GraphFrozen));
}

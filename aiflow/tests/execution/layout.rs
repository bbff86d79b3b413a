//! Running graphs loaded from JSON layouts.

use std::sync::Arc;

use aiflow::graph::NodeResult;
use aiflow::layout::{load_graph, GraphLayout, LayoutError, NodeRegistry};
use aiflow::tags::{AllTagsPredicate, TagSet};
use aiflow::value::Value;
use aiflow::{ContextOptions, ExecutionContext, FlowError};

const PATROL: &str = r#"{
    "seed": 3,
    "nodes": [
        { "name": "Start", "kind": "start" },
        { "name": "Prime", "kind": "set_blackboard_values",
          "config": { "entries": [ { "key": "Ammo", "value": { "type": "int", "value": 4 } } ] } },
        { "name": "Alerted", "kind": "tag_condition", "config": { "query": "State.Alerted" } },
        { "name": "Armed", "kind": "compare_blackboard_value",
          "config": { "left": "Ammo", "operator": ">", "right": { "value": { "type": "int", "value": 0 } } } },
        { "name": "Engage", "kind": "wait", "config": { "seconds": 1.0 } },
        { "name": "Win", "kind": "finish" },
        { "name": "Idle", "kind": "finish", "config": { "succeed": false } }
    ],
    "connections": [
        { "from": "Start", "from_pin": "Out", "to": "Prime", "to_pin": "In" },
        { "from": "Prime", "from_pin": "Out", "to": "Alerted", "to_pin": "In" },
        { "from": "Alerted", "from_pin": "True", "to": "Armed", "to_pin": "In" },
        { "from": "Alerted", "from_pin": "False", "to": "Idle", "to_pin": "In" },
        { "from": "Armed", "from_pin": "True", "to": "Engage", "to_pin": "In" },
        { "from": "Armed", "from_pin": "False", "to": "Idle", "to_pin": "In" },
        { "from": "Engage", "from_pin": "Out", "to": "Win", "to_pin": "In" }
    ]
}"#;

fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::builtin();
    registry.register_tag_condition(Arc::new(AllTagsPredicate));
    registry
}

fn run(tags: &[&str]) -> ExecutionContext {
    let layout = GraphLayout::from_json(PATROL).unwrap();
    let mut graph = load_graph(&layout, &registry()).unwrap();
    graph.finalize().unwrap();
    let options = ContextOptions::default().with_tags(tags.iter().copied().collect::<TagSet>());
    ExecutionContext::start_with(Arc::new(graph), Default::default(), options).unwrap()
}

/// **Scenario**: an alerted, armed agent engages and wins after the wait.
#[test]
fn layout_runs_alerted_branch() {
    let mut ctx = run(&["State.Alerted"]);
    assert_eq!(ctx.blackboard().get("Ammo"), Some(&Value::Int(4)));
    assert!(!ctx.is_terminal());
    ctx.tick(1.0);
    assert_eq!(ctx.result(), Some(NodeResult::Success));
}

/// **Scenario**: without the tag the layout routes to the failing finish at once.
#[test]
fn layout_runs_idle_branch() {
    let ctx = run(&[]);
    assert_eq!(ctx.result(), Some(NodeResult::Failure));
}

/// **Scenario**: a tag_condition layout needs the predicate to be registered.
#[test]
fn layout_without_registered_kind_fails() {
    let layout = GraphLayout::from_json(PATROL).unwrap();
    let err = load_graph(&layout, &NodeRegistry::builtin()).unwrap_err();
    assert!(matches!(err, LayoutError::UnknownKind(kind) if kind == "tag_condition"));
}

/// **Scenario**: structural problems surface when the loaded graph is finalized.
#[test]
fn layout_validation_happens_at_finalize() {
    let layout = GraphLayout::from_json(
        r#"{ "nodes": [ { "name": "Wait", "kind": "wait" } ] }"#,
    )
    .unwrap();
    let mut graph = load_graph(&layout, &registry()).unwrap();
    assert_eq!(graph.finalize(), Err(FlowError::NoEntryNode));
}

//! Graph layouts: a JSON description of a graph plus the registry that turns
//! node kinds into [`FlowNode`] instances.
//!
//! ```json
//! {
//!   "seed": 7,
//!   "nodes": [
//!     { "name": "Start", "kind": "start" },
//!     { "name": "Wait", "kind": "wait", "config": { "seconds": 1.0 } },
//!     { "name": "Done", "kind": "finish" }
//!   ],
//!   "connections": [
//!     { "from": "Start", "from_pin": "Out", "to": "Wait", "to_pin": "In" },
//!     { "from": "Wait", "from_pin": "Out", "to": "Done", "to_pin": "In" }
//!   ]
//! }
//! ```
//!
//! [`load_graph`] returns the graph before `finalize`, so callers can still
//! adjust it (seed, extra nodes) and get validation errors from `finalize`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::AiSubsystem;
use crate::error::FlowError;
use crate::graph::{FlowGraph, FlowNode};
use crate::nodes::{
    AiTaskConfig, AiTaskNode, BranchConfig, BranchNode, CompareBlackboardValueConfig,
    CompareBlackboardValueNode, FinishConfig, FinishNode, GetBlackboardValuesConfig,
    GetBlackboardValuesNode, InvertNode, PassThroughConfig, PassThroughNode,
    RollGuaranteedConfig, RollGuaranteedNode, RollWeightedConfig, RollWeightedNode,
    SequenceConfig, SequenceNode, SetBlackboardValuesConfig, SetBlackboardValuesNode, StartNode,
    TagConditionConfig, TagConditionNode, WaitConfig, WaitNode,
};
use crate::tags::TagPredicate;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown node kind: {0}")]
    UnknownKind(String),
    #[error("invalid config for node {node}: {source}")]
    Config {
        node: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Flow(#[from] FlowError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphLayout {
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub allow_loops: bool,
    pub nodes: Vec<NodeLayout>,
    #[serde(default)]
    pub connections: Vec<ConnectionLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLayout {
    pub name: String,
    pub kind: String,
    /// Marks a non-entry-kind node as an entry as well.
    #[serde(default)]
    pub entry: bool,
    #[serde(default)]
    pub latched: bool,
    #[serde(default)]
    pub one_shot: bool,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionLayout {
    pub from: String,
    pub from_pin: String,
    pub to: String,
    pub to_pin: String,
}

impl GraphLayout {
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Shorthand for [`load_graph`].
    pub fn load(&self, registry: &NodeRegistry) -> Result<FlowGraph, LayoutError> {
        load_graph(self, registry)
    }
}

/// Builds a node from its JSON config. Config errors are reported as
/// [`LayoutError::Json`] and tagged with the node name by [`load_graph`].
pub type NodeFactory =
    Box<dyn Fn(&serde_json::Value, &NodeRegistry) -> Result<Box<dyn FlowNode>, LayoutError> + Send + Sync>;

/// Maps node kind names to factories.
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

/// Config of an `invert` node: the wrapped node's kind and config.
#[derive(Debug, Deserialize)]
struct InvertConfig {
    child: ChildLayout,
}

#[derive(Debug, Deserialize)]
struct ChildLayout {
    kind: String,
    #[serde(default)]
    config: serde_json::Value,
}

/// Deserializes a node config; a missing config reads as `{}`.
fn parse<T: DeserializeOwned>(config: &serde_json::Value) -> Result<T, LayoutError> {
    let parsed = if config.is_null() {
        serde_json::from_value(serde_json::Value::Object(Default::default()))
    } else {
        T::deserialize(config)
    };
    Ok(parsed?)
}

impl NodeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in node that needs no external collaborator.
    ///
    /// `tag_condition` and `ai_task` are added with
    /// [`register_tag_condition`](Self::register_tag_condition) and
    /// [`register_ai_task`](Self::register_ai_task).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("start", |_, _| Ok(Box::new(StartNode)));
        registry.register("pass_through", |c, _| {
            Ok(Box::new(PassThroughNode::new(parse::<PassThroughConfig>(c)?)))
        });
        registry.register("finish", |c, _| {
            Ok(Box::new(FinishNode::new(parse::<FinishConfig>(c)?)))
        });
        registry.register("branch", |c, _| {
            Ok(Box::new(BranchNode::new(parse::<BranchConfig>(c)?)))
        });
        registry.register("sequence", |c, _| {
            Ok(Box::new(SequenceNode::new(parse::<SequenceConfig>(c)?)))
        });
        registry.register("wait", |c, _| {
            Ok(Box::new(WaitNode::new(parse::<WaitConfig>(c)?)))
        });
        registry.register("invert", |c, registry| {
            let config: InvertConfig = parse(c)?;
            let child = registry.build(&config.child.kind, &config.child.config)?;
            Ok(Box::new(InvertNode::boxed(child)))
        });
        registry.register("set_blackboard_values", |c, _| {
            Ok(Box::new(SetBlackboardValuesNode::new(
                parse::<SetBlackboardValuesConfig>(c)?,
            )))
        });
        registry.register("get_blackboard_values", |c, _| {
            Ok(Box::new(GetBlackboardValuesNode::new(
                parse::<GetBlackboardValuesConfig>(c)?,
            )))
        });
        registry.register("compare_blackboard_value", |c, _| {
            Ok(Box::new(CompareBlackboardValueNode::new(
                parse::<CompareBlackboardValueConfig>(c)?,
            )))
        });
        registry.register("roll_weighted", |c, _| {
            Ok(Box::new(RollWeightedNode::new(parse::<RollWeightedConfig>(c)?)))
        });
        registry.register("roll_guaranteed", |c, _| {
            Ok(Box::new(RollGuaranteedNode::new(
                parse::<RollGuaranteedConfig>(c)?,
            )))
        });
        registry
    }

    /// Adds or replaces the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value, &NodeRegistry) -> Result<Box<dyn FlowNode>, LayoutError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    /// Registers `tag_condition`, evaluated with `predicate`.
    pub fn register_tag_condition(&mut self, predicate: Arc<dyn TagPredicate>) {
        self.register("tag_condition", move |c, _| {
            let config: TagConditionConfig = parse(c)?;
            Ok(Box::new(TagConditionNode::new(
                Arc::clone(&predicate),
                config.query,
            )))
        });
    }

    /// Registers `ai_task`, issuing requests to `subsystem`.
    pub fn register_ai_task(&mut self, subsystem: Arc<dyn AiSubsystem>) {
        self.register("ai_task", move |c, _| {
            let config: AiTaskConfig = parse(c)?;
            Ok(Box::new(AiTaskNode::from_config(
                Arc::clone(&subsystem),
                config,
            )))
        });
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn build(
        &self,
        kind: &str,
        config: &serde_json::Value,
    ) -> Result<Box<dyn FlowNode>, LayoutError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| LayoutError::UnknownKind(kind.to_string()))?;
        factory(config, self)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Builds the (not yet finalized) graph described by `layout`.
///
/// Nodes keep their layout order, so node ids follow declaration order.
pub fn load_graph(layout: &GraphLayout, registry: &NodeRegistry) -> Result<FlowGraph, LayoutError> {
    let mut graph = FlowGraph::new();
    graph.set_seed(layout.seed)?;
    graph.allow_loops(layout.allow_loops)?;

    for spec in &layout.nodes {
        let node = registry
            .build(&spec.kind, &spec.config)
            .map_err(|e| match e {
                LayoutError::Json(source) => LayoutError::Config {
                    node: spec.name.clone(),
                    source,
                },
                other => other,
            })?;
        let id = graph.add_boxed(spec.name.clone(), node)?;
        if spec.entry {
            graph.set_entry(id, true)?;
        }
        if spec.latched {
            graph.set_latched(id, true)?;
        }
        if spec.one_shot {
            graph.set_one_shot(id, true)?;
        }
    }

    for c in &layout.connections {
        let from = graph
            .node_id(&c.from)
            .ok_or_else(|| FlowError::NodeNotFound(c.from.clone()))?;
        let to = graph
            .node_id(&c.to)
            .ok_or_else(|| FlowError::NodeNotFound(c.to.clone()))?;
        graph.connect(from, &c.from_pin, to, &c.to_pin)?;
    }
    Ok(graph)
}

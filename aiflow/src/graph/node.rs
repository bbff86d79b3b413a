//! Node trait: the unit of behavior in a flow graph.
//!
//! A node is an immutable template. Everything that changes while a graph runs
//! (activation count, cached inputs, task handles) lives in the execution
//! context and reaches the node through [`NodeContext`], so one graph can back
//! many concurrent contexts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::value::Value;

use super::pin::PinSpec;

/// Arena index of a node inside its graph. Stable for the graph's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Capability class of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Activated by `start`; the graph marks these as entry nodes automatically.
    Entry,
    /// Long-running work that usually returns [`Activation::Running`].
    Task,
    /// Evaluates a predicate and routes to `True` / `False`.
    Condition,
    Composite,
    /// Wraps another node and adjusts its outcome.
    Decorator,
    /// Picks among outputs (random or stateful routing).
    Routing,
    /// Immediate side effect (blackboard writes, pass-through).
    Action,
    /// Finishes the whole context with its own outcome.
    Terminal,
}

/// Static description of a node: pins and kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub inputs: Vec<PinSpec>,
    pub outputs: Vec<PinSpec>,
    /// Output fired when a callback of this node faults.
    pub fault_output: Option<String>,
}

impl NodeInfo {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            fault_output: None,
        }
    }

    pub fn input(mut self, pin: PinSpec) -> Self {
        self.inputs.push(pin);
        self
    }

    pub fn output(mut self, pin: PinSpec) -> Self {
        self.outputs.push(pin);
        self
    }

    pub fn fault_output(mut self, pin: impl Into<String>) -> Self {
        self.fault_output = Some(pin.into());
        self
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == name)
    }

    pub fn has_required_inputs(&self) -> bool {
        self.inputs.iter().any(|p| p.required)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeResult {
    Success,
    Failure,
}

impl NodeResult {
    pub fn inverted(self) -> Self {
        match self {
            NodeResult::Success => NodeResult::Failure,
            NodeResult::Failure => NodeResult::Success,
        }
    }
}

impl fmt::Display for NodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeResult::Success => f.write_str("success"),
            NodeResult::Failure => f.write_str("failure"),
        }
    }
}

/// An output pin fired by a finished activation, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredPin {
    pub pin: String,
    pub value: Option<Value>,
}

/// Result of one activation: Success or Failure plus the pins to fire, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub result: NodeResult,
    pub fired: Vec<FiredPin>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            result: NodeResult::Success,
            fired: Vec::new(),
        }
    }

    pub fn failure() -> Self {
        Self {
            result: NodeResult::Failure,
            fired: Vec::new(),
        }
    }

    /// Fires a signal on `pin`.
    pub fn fire(mut self, pin: impl Into<String>) -> Self {
        self.fired.push(FiredPin {
            pin: pin.into(),
            value: None,
        });
        self
    }

    /// Fires `value` on `pin`.
    pub fn fire_value(mut self, pin: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fired.push(FiredPin {
            pin: pin.into(),
            value: Some(value.into()),
        });
        self
    }

    pub fn is_success(&self) -> bool {
        self.result == NodeResult::Success
    }
}

/// What `on_activate` decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Finished(Outcome),
    /// The node completes later, from `on_tick` or through a
    /// [`Completer`](crate::context::Completer).
    Running,
}

impl From<Outcome> for Activation {
    fn from(outcome: Outcome) -> Self {
        Activation::Finished(outcome)
    }
}

/// Input values delivered to `on_activate`, keyed by pin name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputValues {
    activating_pin: Option<String>,
    values: BTreeMap<String, Value>,
}

impl InputValues {
    pub fn new(activating_pin: Option<String>, values: BTreeMap<String, Value>) -> Self {
        Self {
            activating_pin,
            values,
        }
    }

    /// The input pin whose arrival triggered this activation; `None` when the
    /// node was started as an entry.
    pub fn activating_pin(&self) -> Option<&str> {
        self.activating_pin.as_deref()
    }

    pub fn get(&self, pin: &str) -> Option<&Value> {
        self.values.get(pin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A node template.
///
/// Implementations are shared by every context running the graph and must not
/// keep per-run state in `self`; use [`NodeContext::memory_mut`] instead.
///
/// Errors and panics from `on_activate` / `on_tick` are caught by the
/// scheduler and turn into a Failure outcome for this node.
pub trait FlowNode: Send + Sync {
    /// Pins and kind. Called once, when the node is added to a graph.
    fn info(&self) -> NodeInfo;

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        inputs: &InputValues,
    ) -> Result<Activation, NodeFault>;

    /// Called every step while Running. `Some` finishes the activation.
    fn on_tick(&self, _ctx: &mut NodeContext<'_>, _dt: f32) -> Result<Option<Outcome>, NodeFault> {
        Ok(None)
    }

    /// Maps an outcome delivered through a [`Completer`](crate::context::Completer)
    /// before it is applied. Identity by default.
    fn on_complete(
        &self,
        _ctx: &mut NodeContext<'_>,
        outcome: Outcome,
    ) -> Result<Outcome, NodeFault> {
        Ok(outcome)
    }

    /// Releases outstanding external work. Must be a no-op when nothing is pending.
    fn on_cancel(&self, _ctx: &mut NodeContext<'_>) {}
}

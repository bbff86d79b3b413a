//! Pin declarations.
//!
//! A node declares its input and output pins once, through [`NodeInfo`](super::NodeInfo);
//! the graph caches the declaration when the node is added. Pins are addressed
//! by name in the authoring API and by index inside the engine.

use serde::{Deserialize, Serialize};

use crate::value::{PinType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinDirection {
    Input,
    Output,
}

/// How a multi-input pin combines its feeding connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Satisfied once every feeding connection has signalled in the same generation.
    #[default]
    All,
    /// Satisfied by the first arrival; later arrivals in that generation are ignored.
    Any,
}

/// Declaration of one pin.
#[derive(Debug, Clone, PartialEq)]
pub struct PinSpec {
    pub name: String,
    pub direction: PinDirection,
    pub ty: PinType,
    /// Value delivered when no feeding connection or external input supplied one.
    pub default: Option<Value>,
    /// Input only: the node cannot activate until this pin is satisfied, and a
    /// reachable node must have it connected.
    pub required: bool,
    /// Input only: an arrival on this pin may activate the node. Data pins
    /// leave this off and only cache the latest value.
    pub activates: bool,
    /// Input only: more than one connection may feed this pin.
    pub multi_input: bool,
    pub merge: MergePolicy,
    /// Input only: seconds a partially satisfied `All` join waits before it
    /// resets. `None` waits indefinitely.
    pub merge_window: Option<f32>,
}

impl PinSpec {
    /// Signal-only input that activates its node.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PinDirection::Input,
            ty: PinType::Signal,
            default: None,
            required: false,
            activates: true,
            multi_input: false,
            merge: MergePolicy::All,
            merge_window: None,
        }
    }

    /// Typed input that only caches its value.
    pub fn data(name: impl Into<String>, ty: PinType) -> Self {
        Self {
            ty,
            activates: false,
            ..Self::input(name)
        }
    }

    /// Signal-only output.
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PinDirection::Output,
            ty: PinType::Signal,
            default: None,
            required: false,
            activates: false,
            multi_input: false,
            merge: MergePolicy::All,
            merge_window: None,
        }
    }

    /// Output carrying values of `ty`.
    pub fn data_output(name: impl Into<String>, ty: PinType) -> Self {
        Self {
            ty,
            ..Self::output(name)
        }
    }

    pub fn typed(mut self, ty: PinType) -> Self {
        self.ty = ty;
        self
    }

    /// Marks an input as required; required inputs always activate.
    pub fn required(mut self) -> Self {
        self.required = true;
        self.activates = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn multi(mut self, merge: MergePolicy) -> Self {
        self.multi_input = true;
        self.merge = merge;
        self
    }

    pub fn with_merge_window(mut self, seconds: f32) -> Self {
        self.merge_window = Some(seconds);
        self
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }
}

//! Blackboard nodes: set values, read values, compare a key.

use serde::Deserialize;

use crate::blackboard::CompareOperator;
use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};
use crate::value::{PinType, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlackboardEntry {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetBlackboardValuesConfig {
    pub entries: Vec<BlackboardEntry>,
}

/// Writes its configured entries, then fires `Out`.
#[derive(Debug, Clone, Default)]
pub struct SetBlackboardValuesNode {
    config: SetBlackboardValuesConfig,
}

impl SetBlackboardValuesNode {
    pub fn new(config: SetBlackboardValuesConfig) -> Self {
        Self { config }
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.entries.push(BlackboardEntry {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

impl FlowNode for SetBlackboardValuesNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Action)
            .input(PinSpec::input("In"))
            .output(PinSpec::output("Out"))
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let blackboard = ctx.blackboard_mut();
        for entry in &self.config.entries {
            blackboard.set(entry.key.clone(), entry.value.clone());
        }
        Ok(Outcome::success().fire("Out").into())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlackboardKey {
    pub key: String,
    #[serde(rename = "type", default = "any_type")]
    pub ty: PinType,
}

fn any_type() -> PinType {
    PinType::Any
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetBlackboardValuesConfig {
    pub keys: Vec<BlackboardKey>,
}

/// Reads its configured keys and fires each value on the pin named after the
/// key, then `Out`. A missing key is a fault.
#[derive(Debug, Clone, Default)]
pub struct GetBlackboardValuesNode {
    config: GetBlackboardValuesConfig,
}

impl GetBlackboardValuesNode {
    pub fn new(config: GetBlackboardValuesConfig) -> Self {
        Self { config }
    }

    pub fn key(mut self, key: impl Into<String>, ty: PinType) -> Self {
        self.config.keys.push(BlackboardKey {
            key: key.into(),
            ty,
        });
        self
    }
}

impl FlowNode for GetBlackboardValuesNode {
    fn info(&self) -> NodeInfo {
        let info = NodeInfo::new(NodeKind::Action)
            .input(PinSpec::input("In"))
            .output(PinSpec::output("Out"));
        self.config.keys.iter().fold(info, |info, k| {
            info.output(PinSpec::data_output(k.key.as_str(), k.ty))
        })
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let blackboard = ctx.blackboard();
        let mut outcome = Outcome::success();
        for k in &self.config.keys {
            let value = blackboard.require(&k.key)?;
            outcome = outcome.fire_value(k.key.as_str(), value.clone());
        }
        Ok(outcome.fire("Out").into())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Key(String),
    Value(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareBlackboardValueConfig {
    pub left: String,
    #[serde(rename = "operator")]
    pub op: CompareOperator,
    pub right: Operand,
}

/// Compares a blackboard key with another key or an explicit value and fires
/// `True` or `False`. Missing keys and mismatched types are faults.
#[derive(Debug, Clone)]
pub struct CompareBlackboardValueNode {
    config: CompareBlackboardValueConfig,
}

impl CompareBlackboardValueNode {
    pub fn new(config: CompareBlackboardValueConfig) -> Self {
        Self { config }
    }

    pub fn with_value(left: impl Into<String>, op: CompareOperator, right: Value) -> Self {
        Self::new(CompareBlackboardValueConfig {
            left: left.into(),
            op,
            right: Operand::Value(right),
        })
    }

    pub fn with_key(left: impl Into<String>, op: CompareOperator, right: impl Into<String>) -> Self {
        Self::new(CompareBlackboardValueConfig {
            left: left.into(),
            op,
            right: Operand::Key(right.into()),
        })
    }
}

impl FlowNode for CompareBlackboardValueNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Condition)
            .input(PinSpec::input("In"))
            .output(PinSpec::output("True"))
            .output(PinSpec::output("False"))
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let blackboard = ctx.blackboard();
        let left = blackboard.require(&self.config.left)?;
        let right = match &self.config.right {
            Operand::Key(key) => blackboard.require(key)?,
            Operand::Value(value) => value,
        };
        let pin = if self.config.op.compare(left, right)? {
            "True"
        } else {
            "False"
        };
        Ok(Outcome::success().fire(pin).into())
    }
}

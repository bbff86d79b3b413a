//! Branch: routes `In` to `True` or `False`.
//!
//! The condition comes from the `Condition` data pin when something fed it,
//! otherwise from the configured constant.

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};
use crate::value::{PinType, Value};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    pub condition: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchNode {
    config: BranchConfig,
}

impl BranchNode {
    pub fn new(config: BranchConfig) -> Self {
        Self { config }
    }

    pub fn constant(condition: bool) -> Self {
        Self::new(BranchConfig { condition })
    }
}

impl FlowNode for BranchNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Condition)
            .input(PinSpec::input("In"))
            .input(
                PinSpec::data("Condition", PinType::Bool)
                    .with_default(Value::Bool(self.config.condition)),
            )
            .output(PinSpec::output("True"))
            .output(PinSpec::output("False"))
    }

    fn on_activate(
        &self,
        _ctx: &mut NodeContext<'_>,
        inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let condition = match inputs.get("Condition") {
            Some(value) => value.as_bool().ok_or_else(|| {
                NodeFault::activation(format!("Condition expects bool, got {}", value))
            })?,
            None => self.config.condition,
        };
        let pin = if condition { "True" } else { "False" };
        Ok(Outcome::success().fire(pin).into())
    }
}

//! Sequence: fires `Out0`, `Out1`, ... in order on each activation.
//!
//! Downstream signals are queued in pin order, so the branches start in that
//! order within the same propagation pass.

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub outputs: usize,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self { outputs: 2 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceNode {
    config: SequenceConfig,
}

impl SequenceNode {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    pub fn with_outputs(outputs: usize) -> Self {
        Self::new(SequenceConfig { outputs })
    }

    pub fn output_name(index: usize) -> String {
        format!("Out{}", index)
    }
}

impl FlowNode for SequenceNode {
    fn info(&self) -> NodeInfo {
        (0..self.config.outputs).fold(
            NodeInfo::new(NodeKind::Composite).input(PinSpec::input("In")),
            |info, i| info.output(PinSpec::output(Self::output_name(i))),
        )
    }

    fn on_activate(
        &self,
        _ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let outcome = (0..self.config.outputs)
            .fold(Outcome::success(), |o, i| o.fire(Self::output_name(i)));
        Ok(outcome.into())
    }
}

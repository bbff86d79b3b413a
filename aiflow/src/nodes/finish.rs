//! Finish: terminal node. Ends the whole context with its configured result
//! and cancels whatever is still running.

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{
    Activation, FlowNode, InputValues, MergePolicy, NodeInfo, NodeKind, Outcome, PinSpec,
};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FinishConfig {
    pub succeed: bool,
}

impl Default for FinishConfig {
    fn default() -> Self {
        Self { succeed: true }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FinishNode {
    config: FinishConfig,
}

impl FinishNode {
    pub fn new(config: FinishConfig) -> Self {
        Self { config }
    }

    pub fn success() -> Self {
        Self::new(FinishConfig { succeed: true })
    }

    pub fn failure() -> Self {
        Self::new(FinishConfig { succeed: false })
    }
}

impl FlowNode for FinishNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Terminal).input(PinSpec::input("In").multi(MergePolicy::Any))
    }

    fn on_activate(
        &self,
        _ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let outcome = if self.config.succeed {
            Outcome::success()
        } else {
            Outcome::failure()
        };
        Ok(outcome.into())
    }
}

//! Pass-through: finishes immediately and fires `Out`.
//!
//! `In` accepts any number of feeding connections. With the default `Any`
//! policy it activates on the first arrival of each generation; as an `All`
//! join it waits for every feeding connection, optionally giving up after a
//! merge window.

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{
    Activation, FlowNode, InputValues, MergePolicy, NodeInfo, NodeKind, Outcome, PinSpec,
};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PassThroughConfig {
    pub merge: Option<MergePolicy>,
    /// Seconds before a partial `All` join resets.
    pub merge_window: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughNode {
    config: PassThroughConfig,
}

impl PassThroughNode {
    pub fn new(config: PassThroughConfig) -> Self {
        Self { config }
    }

    /// Pass-through whose `In` pin merges with `merge`.
    pub fn join(merge: MergePolicy) -> Self {
        Self::new(PassThroughConfig {
            merge: Some(merge),
            merge_window: None,
        })
    }

    pub fn with_merge_window(mut self, seconds: f32) -> Self {
        self.config.merge_window = Some(seconds);
        self
    }
}

impl FlowNode for PassThroughNode {
    fn info(&self) -> NodeInfo {
        let mut input = PinSpec::input("In").multi(self.config.merge.unwrap_or(MergePolicy::Any));
        if let Some(window) = self.config.merge_window {
            input = input.with_merge_window(window);
        }
        NodeInfo::new(NodeKind::Action)
            .input(input)
            .output(PinSpec::output("Out"))
    }

    fn on_activate(
        &self,
        _ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        Ok(Outcome::success().fire("Out").into())
    }
}

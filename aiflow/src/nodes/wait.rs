//! Wait: stays Running for a fixed time, then fires `Out`.

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub seconds: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaitNode {
    config: WaitConfig,
}

/// Seconds elapsed in the current activation.
#[derive(Debug, Default)]
struct Elapsed(f32);

impl WaitNode {
    pub fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    pub fn seconds(seconds: f32) -> Self {
        Self::new(WaitConfig { seconds })
    }
}

impl FlowNode for WaitNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Task)
            .input(PinSpec::input("In"))
            .output(PinSpec::output("Out"))
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        // NaN and infinite durations finish at once like zero
        if !self.config.seconds.is_finite() || self.config.seconds <= 0.0 {
            return Ok(Outcome::success().fire("Out").into());
        }
        ctx.memory_mut::<Elapsed>().0 = 0.0;
        Ok(Activation::Running)
    }

    fn on_tick(&self, ctx: &mut NodeContext<'_>, dt: f32) -> Result<Option<Outcome>, NodeFault> {
        let elapsed = ctx.memory_mut::<Elapsed>();
        elapsed.0 += dt;
        if elapsed.0 + f32::EPSILON >= self.config.seconds {
            return Ok(Some(Outcome::success().fire("Out")));
        }
        Ok(None)
    }
}

//! Start: the entry node. Fires `Out` when the context starts.

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};

#[derive(Debug, Clone, Copy, Default)]
pub struct StartNode;

impl FlowNode for StartNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Entry).output(PinSpec::output("Out"))
    }

    fn on_activate(
        &self,
        _ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        Ok(Outcome::success().fire("Out").into())
    }
}

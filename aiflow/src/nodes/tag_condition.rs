//! Tag condition: evaluates a tag query against the agent's tags.
//!
//! Fires `True` or `False`. An evaluation error is a fault, so the node
//! finishes with Failure and fires nothing.

use std::sync::Arc;

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};
use crate::tags::{TagPredicate, TagQuery};

#[derive(Debug, Clone, Deserialize)]
pub struct TagConditionConfig {
    pub query: TagQuery,
}

pub struct TagConditionNode {
    predicate: Arc<dyn TagPredicate>,
    query: TagQuery,
}

impl TagConditionNode {
    pub fn new(predicate: Arc<dyn TagPredicate>, query: TagQuery) -> Self {
        Self { predicate, query }
    }
}

impl FlowNode for TagConditionNode {
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
        let matched = self.predicate.evaluate(ctx.tags(), &self.query)?;
        let pin = if matched { "True" } else { "False" };
        Ok(Outcome::success().fire(pin).into())
    }
}

//! Invert: decorator that flips the outcome of the node it wraps.
//!
//! Success and Failure swap, and so do the `True`/`False` and
//! `Success`/`Failure` output pairs when the child declares both pins of a
//! pair. Applies to immediate, ticked and out-of-band completions alike.

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome};

const SWAPPED_PAIRS: [(&str, &str); 2] = [("True", "False"), ("Success", "Failure")];

pub struct InvertNode {
    child: Box<dyn FlowNode>,
    /// Pairs the child declares, fixed at construction.
    pairs: Vec<(&'static str, &'static str)>,
}

impl InvertNode {
    pub fn new(child: impl FlowNode + 'static) -> Self {
        Self::boxed(Box::new(child))
    }

    pub fn boxed(child: Box<dyn FlowNode>) -> Self {
        let info = child.info();
        let pairs = SWAPPED_PAIRS
            .iter()
            .copied()
            .filter(|(a, b)| info.output_index(a).is_some() && info.output_index(b).is_some())
            .collect();
        Self { child, pairs }
    }

    fn invert(&self, mut outcome: Outcome) -> Outcome {
        outcome.result = outcome.result.inverted();
        for fired in &mut outcome.fired {
            for &(a, b) in &self.pairs {
                if fired.pin == a {
                    fired.pin = b.to_string();
                } else if fired.pin == b {
                    fired.pin = a.to_string();
                }
            }
        }
        outcome
    }
}

impl FlowNode for InvertNode {
    /// The child's pins. Entry and terminal children keep their kind so the
    /// wrapper still starts or ends the run.
    fn info(&self) -> NodeInfo {
        let info = self.child.info();
        let kind = match info.kind {
            NodeKind::Entry | NodeKind::Terminal => info.kind,
            _ => NodeKind::Decorator,
        };
        NodeInfo { kind, ..info }
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        Ok(match self.child.on_activate(ctx, inputs)? {
            Activation::Finished(outcome) => Activation::Finished(self.invert(outcome)),
            Activation::Running => Activation::Running,
        })
    }

    fn on_tick(&self, ctx: &mut NodeContext<'_>, dt: f32) -> Result<Option<Outcome>, NodeFault> {
        Ok(self.child.on_tick(ctx, dt)?.map(|o| self.invert(o)))
    }

    fn on_complete(&self, ctx: &mut NodeContext<'_>, outcome: Outcome) -> Result<Outcome, NodeFault> {
        Ok(self.invert(self.child.on_complete(ctx, outcome)?))
    }

    fn on_cancel(&self, ctx: &mut NodeContext<'_>) {
        self.child.on_cancel(ctx);
    }
}

//! Random routing: weighted choice and guaranteed-within-N-attempts.
//!
//! Both draw from the activation's seeded generator, so a graph with a fixed
//! seed routes the same way on every run.

use serde::Deserialize;

use crate::context::NodeContext;
use crate::error::NodeFault;
use crate::graph::{Activation, FlowNode, InputValues, NodeInfo, NodeKind, Outcome, PinSpec};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeightedOption {
    pub output: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RollWeightedConfig {
    pub options: Vec<WeightedOption>,
}

/// Fires one of its outputs with probability proportional to its weight.
/// Negative weights count as zero; with no positive weight nothing fires and
/// the node fails.
#[derive(Debug, Clone, Default)]
pub struct RollWeightedNode {
    config: RollWeightedConfig,
}

impl RollWeightedNode {
    pub fn new(config: RollWeightedConfig) -> Self {
        Self { config }
    }

    pub fn option(mut self, output: impl Into<String>, weight: f32) -> Self {
        self.config.options.push(WeightedOption {
            output: output.into(),
            weight,
        });
        self
    }

    fn pick(&self, roll: f32) -> Option<&str> {
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for option in &self.config.options {
            if option.weight <= 0.0 {
                continue;
            }
            cumulative += option.weight;
            last_positive = Some(option.output.as_str());
            if roll < cumulative {
                return last_positive;
            }
        }
        // float rounding can leave roll == total
        last_positive
    }
}

impl FlowNode for RollWeightedNode {
    fn info(&self) -> NodeInfo {
        self.config.options.iter().fold(
            NodeInfo::new(NodeKind::Routing).input(PinSpec::input("In")),
            |info, o| info.output(PinSpec::output(o.output.as_str())),
        )
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        _inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        let total: f32 = self
            .config
            .options
            .iter()
            .map(|o| o.weight.max(0.0))
            .sum();
        if total <= 0.0 {
            return Ok(Outcome::failure().into());
        }
        let roll = ctx.rng().range_f32(total);
        Ok(match self.pick(roll) {
            Some(pin) => Outcome::success().fire(pin),
            None => Outcome::failure(),
        }
        .into())
    }
}

pub const GUARANTEED_OUT: &str = "Guaranteed Out";
pub const FAILURE_OUT: &str = "Failure Out";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RollGuaranteedConfig {
    /// Attempts within which exactly one roll succeeds; at least 2.
    pub maximum_attempts: u32,
    /// Start a new cycle right after the success instead of after the last attempt.
    pub reset_on_success: bool,
}

impl Default for RollGuaranteedConfig {
    fn default() -> Self {
        Self {
            maximum_attempts: 2,
            reset_on_success: false,
        }
    }
}

/// Attempts and success flag of the current cycle.
#[derive(Debug, Default)]
struct RollCycle {
    attempts: u32,
    rolled: bool,
}

/// Succeeds exactly once every `maximum_attempts` rolls.
///
/// Each `In` is an attempt. Once a cycle has succeeded every further attempt
/// fires `Failure Out`; otherwise the attempt succeeds when a uniform draw in
/// `[0, maximum_attempts - attempts]` is zero, so the last attempt of a cycle
/// always succeeds. `Reset` starts a new cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollGuaranteedNode {
    config: RollGuaranteedConfig,
}

impl RollGuaranteedNode {
    pub fn new(config: RollGuaranteedConfig) -> Self {
        Self {
            config: RollGuaranteedConfig {
                maximum_attempts: config.maximum_attempts.max(2),
                ..config
            },
        }
    }
}

impl FlowNode for RollGuaranteedNode {
    fn info(&self) -> NodeInfo {
        NodeInfo::new(NodeKind::Routing)
            .input(PinSpec::input("In"))
            .input(PinSpec::input("Reset"))
            .output(PinSpec::output(GUARANTEED_OUT))
            .output(PinSpec::output(FAILURE_OUT))
    }

    fn on_activate(
        &self,
        ctx: &mut NodeContext<'_>,
        inputs: &InputValues,
    ) -> Result<Activation, NodeFault> {
        if inputs.activating_pin() == Some("Reset") {
            *ctx.memory_mut::<RollCycle>() = RollCycle::default();
            return Ok(Outcome::success().into());
        }

        let max = self.config.maximum_attempts;
        let remaining = {
            let cycle = ctx.memory_mut::<RollCycle>();
            cycle.attempts += 1;
            if cycle.rolled {
                if cycle.attempts >= max {
                    *cycle = RollCycle::default();
                }
                return Ok(Outcome::success().fire(FAILURE_OUT).into());
            }
            max.saturating_sub(cycle.attempts)
        };

        let draw = ctx.rng().range_inclusive(remaining);
        let cycle = ctx.memory_mut::<RollCycle>();
        if draw == 0 {
            cycle.rolled = true;
            if self.config.reset_on_success || cycle.attempts >= max {
                *cycle = RollCycle::default();
            }
            Ok(Outcome::success().fire(GUARANTEED_OUT).into())
        } else {
            Ok(Outcome::success().fire(FAILURE_OUT).into())
        }
    }
}

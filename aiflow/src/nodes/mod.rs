//! Built-in nodes.
//!
//! Each node is a [`FlowNode`](crate::graph::FlowNode) template with an
//! optional serde config, so graphs can be assembled in code or loaded from a
//! [`GraphLayout`](crate::layout::GraphLayout).
//!
//! | Node | Kind | Inputs | Outputs |
//! |------|------|--------|---------|
//! | [`StartNode`] | entry | | `Out` |
//! | [`PassThroughNode`] | action | `In` (multi) | `Out` |
//! | [`FinishNode`] | terminal | `In` (multi) | |
//! | [`BranchNode`] | condition | `In`, `Condition` | `True`, `False` |
//! | [`SequenceNode`] | composite | `In` | `Out0`..`OutN` |
//! | [`WaitNode`] | task | `In` | `Out` |
//! | [`InvertNode`] | decorator | child's | child's, swapped |
//! | [`AiTaskNode`] | task | `In`, `Target` | `Success`, `Failure` |
//! | [`SpawnedTaskNode`] | task | `In` | configurable |
//! | [`TagConditionNode`] | condition | `In` | `True`, `False` |
//! | [`SetBlackboardValuesNode`] | action | `In` | `Out` |
//! | [`GetBlackboardValuesNode`] | action | `In` | `Out`, one per key |
//! | [`CompareBlackboardValueNode`] | condition | `In` | `True`, `False` |
//! | [`RollWeightedNode`] | routing | `In` | one per option |
//! | [`RollGuaranteedNode`] | routing | `In`, `Reset` | `Guaranteed Out`, `Failure Out` |

mod ai_task;
mod blackboard;
mod branch;
mod finish;
mod invert;
mod pass;
mod roll;
mod sequence;
mod spawned_task;
mod start;
mod tag_condition;
mod wait;

pub use ai_task::{AiTaskConfig, AiTaskNode};
pub use blackboard::{
    BlackboardEntry, BlackboardKey, CompareBlackboardValueConfig, CompareBlackboardValueNode,
    GetBlackboardValuesConfig, GetBlackboardValuesNode, Operand, SetBlackboardValuesConfig,
    SetBlackboardValuesNode,
};
pub use branch::{BranchConfig, BranchNode};
pub use finish::{FinishConfig, FinishNode};
pub use invert::InvertNode;
pub use pass::{PassThroughConfig, PassThroughNode};
pub use roll::{
    RollGuaranteedConfig, RollGuaranteedNode, RollWeightedConfig, RollWeightedNode,
    WeightedOption, FAILURE_OUT, GUARANTEED_OUT,
};
pub use sequence::{SequenceConfig, SequenceNode};
pub use spawned_task::SpawnedTaskNode;
pub use start::StartNode;
pub use tag_condition::{TagConditionConfig, TagConditionNode};
pub use wait::{WaitConfig, WaitNode};

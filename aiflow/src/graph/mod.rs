//! Flow graph: typed pins, connections, node trait, validation.
//!
//! Build a [`FlowGraph`], `finalize` it, then run it with an
//! [`ExecutionContext`](crate::context::ExecutionContext).

mod connection;
mod flow_graph;
pub mod logging;
mod node;
mod pin;
mod validate;

pub use connection::{Connection, ConnectionId};
pub use flow_graph::{FlowGraph, GraphNode};
pub use node::{
    Activation, FiredPin, FlowNode, InputValues, NodeId, NodeInfo, NodeKind, NodeResult, Outcome,
};
pub use pin::{MergePolicy, PinDirection, PinSpec};

//! Error types for graph authoring, finalize and node execution.
//!
//! [`FlowError`] covers structural failures raised while authoring or
//! finalizing a graph (recoverable by correcting the graph) plus misuse of a
//! terminal context. [`NodeFault`] is raised by node callbacks; the scheduler
//! converts it into a Failure outcome for that node and never lets it escape
//! the propagation loop.

use thiserror::Error;

use crate::blackboard::BlackboardError;
use crate::tags::TagError;
use crate::value::PinType;

/// Structural or context-level error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    /// Connected pins declare incompatible types and neither is signal-only.
    #[error("type mismatch: {source_pin} ({source_type}) -> {target_pin} ({target_type})")]
    TypeMismatch {
        source_pin: String,
        source_type: PinType,
        target_pin: String,
        target_type: PinType,
    },

    /// Source is not an output pin or target is not an input pin.
    #[error("direction error: {0}")]
    DirectionError(String),

    /// The identical (source pin, target pin) pair already exists.
    #[error("duplicate connection: {0}")]
    DuplicateConnection(String),

    /// Target input is not multi-input and already has a feeding connection.
    #[error("input pin already connected and not multi-input: {0}")]
    InputAlreadyConnected(String),

    /// A cycle through at least one non-latched node while loops are not allowed.
    #[error("illegal cycle through nodes: {}", .0.join(" -> "))]
    IllegalCycle(Vec<String>),

    /// The graph was finalized; it can no longer be mutated.
    #[error("graph is finalized and cannot be mutated")]
    GraphFrozen,

    /// A node id or name that is not part of the graph.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A pin name that the node does not declare.
    #[error("pin not found: {node}.{pin}")]
    PinNotFound { node: String, pin: String },

    /// Node names must be unique within a graph.
    #[error("duplicate node name: {0}")]
    DuplicateNodeName(String),

    /// A connection references a node that is no longer in the graph.
    #[error("dangling connection #{0}")]
    DanglingConnection(usize),

    /// A required input on a reachable node has no feeding connection.
    #[error("required input {node}.{pin} is not connected")]
    UnconnectedRequiredInput { node: String, pin: String },

    /// The graph has no entry node.
    #[error("graph has no entry node")]
    NoEntryNode,

    /// An execution context was requested for a graph that is not finalized.
    #[error("graph must be finalized before it can be executed")]
    GraphNotFinalized,

    /// The context already finished or was cancelled.
    #[error("execution context is terminated")]
    ContextTerminated,
}

/// Fault raised by a node callback.
///
/// Converted to `Finished(Failure)` for that node and reported on the fault
/// channel; never fatal to the context except on a sole entry node without a
/// fault output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeFault {
    /// The node reported a failure while activating or ticking.
    #[error("activation fault: {0}")]
    Activation(String),

    /// The node panicked; the payload message is preserved when it is a string.
    #[error("node panicked: {0}")]
    Panicked(String),

    /// The node fired an output pin it does not declare.
    #[error("fired unknown output pin: {0}")]
    UnknownOutput(String),

    /// The node fired a value the output pin's declared type does not accept.
    #[error("output {pin} expects {expected}, got {actual}")]
    OutputTypeMismatch {
        pin: String,
        expected: PinType,
        actual: PinType,
    },

    /// Tag predicate evaluation failed.
    #[error("tag predicate: {0}")]
    Tag(#[from] TagError),

    /// Blackboard lookup or comparison failed.
    #[error("blackboard: {0}")]
    Blackboard(#[from] BlackboardError),

    /// The AI subsystem rejected or failed a request.
    #[error("ai subsystem: {0}")]
    Subsystem(String),
}

impl NodeFault {
    pub fn activation(msg: impl Into<String>) -> Self {
        NodeFault::Activation(msg.into())
    }
}

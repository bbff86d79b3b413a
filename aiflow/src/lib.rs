//! # aiflow
//!
//! A typed node-graph execution engine for AI behavior. Tasks, conditions,
//! blackboard manipulation and random routing are authored as nodes in a
//! directed graph and driven at runtime by agents.
//!
//! ## Design Principles
//!
//! - **Template vs run**: a [`FlowGraph`] is built, validated by `finalize`,
//!   then shared through `Arc`. Each agent gets its own [`ExecutionContext`]
//!   holding all mutable run state, so one graph backs many concurrent runs.
//! - **Cooperative stepping**: a context advances only in `start`, `tick` and
//!   `trigger`. Work finished elsewhere (another thread, a tokio task) reports
//!   back through a [`Completer`] and is applied at the next tick.
//! - **Signals, not calls**: fired outputs become signals processed FIFO, with
//!   merge policies for joins, generation counters for loops and explicit
//!   re-entrancy rules for nodes that are still running.
//!
//! ## Main Modules
//!
//! - [`graph`]: `FlowGraph`, `FlowNode`, pins, connections, validation.
//! - [`context`]: `ExecutionContext`, the scheduler, completions, events and
//!   the tokio driver.
//! - [`nodes`]: built-in nodes (start, branch, sequence, wait, AI task,
//!   blackboard, roll, ...).
//! - [`layout`]: JSON graph layouts and the node registry that loads them.
//! - [`ai`], [`tags`]: interfaces to the engine's AI and tag subsystems.
//! - [`blackboard`], [`rng`], [`value`]: per-run data, seeded randomness and
//!   pin payloads.
//!
//! ## Features
//!
//! - `tracing` (default): structured logs through `tracing`; stderr otherwise.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use aiflow::nodes::{BranchNode, FinishNode, StartNode, WaitNode};
//! use aiflow::{ContextStatus, ExecutionContext, FlowGraph, NodeResult};
//!
//! let mut graph = FlowGraph::new();
//! let start = graph.add_node("Start", StartNode).unwrap();
//! let wait = graph.add_node("Wait", WaitNode::seconds(1.0)).unwrap();
//! let branch = graph.add_node("Branch", BranchNode::constant(true)).unwrap();
//! let done = graph.add_node("Done", FinishNode::success()).unwrap();
//! graph.connect(start, "Out", wait, "In").unwrap();
//! graph.connect(wait, "Out", branch, "In").unwrap();
//! graph.connect(branch, "True", done, "In").unwrap();
//! graph.finalize().unwrap();
//!
//! let mut ctx = ExecutionContext::start(Arc::new(graph), BTreeMap::new()).unwrap();
//! assert_eq!(ctx.tick(0.5), ContextStatus::Running);
//! assert_eq!(ctx.tick(0.5), ContextStatus::Finished(NodeResult::Success));
//! ```

pub mod ai;
pub mod blackboard;
pub mod context;
pub mod error;
pub mod graph;
pub mod layout;
pub mod nodes;
pub mod rng;
pub mod tags;
pub mod value;

pub use ai::{AiRequest, AiSubsystem, AsyncTask, TaskHandle, TaskOutcome};
pub use blackboard::{Blackboard, BlackboardError, CompareOperator};
pub use context::{
    event_channel, CancelHandle, Completer, ContextEvent, ContextOptions, ContextStatus,
    EventSender, EventStream, ExecutionContext, FaultReport, NodeContext, NodeState,
};
pub use error::{FlowError, NodeFault};
pub use graph::{
    Activation, Connection, ConnectionId, FiredPin, FlowGraph, FlowNode, GraphNode, InputValues,
    MergePolicy, NodeId, NodeInfo, NodeKind, NodeResult, Outcome, PinDirection, PinSpec,
};
pub use layout::{load_graph, GraphLayout, LayoutError, NodeRegistry};
pub use rng::FlowRng;
pub use tags::{AllTagsPredicate, TagError, TagPredicate, TagQuery, TagSet};
pub use value::{PinType, Value};

//! Execution context: per-run state, scheduler, completions and events.
//!
//! A [`FlowGraph`](crate::graph::FlowGraph) is a template; an
//! [`ExecutionContext`] is one run of it for one agent. Node callbacks receive
//! a [`NodeContext`] scoped to that run.

mod completion;
mod driver;
mod events;
mod execution;
mod node_context;
mod options;
mod runtime;
mod scheduler;

pub use completion::{CancelHandle, Completer};
pub use events::{event_channel, ContextEvent, EventSender, EventStream, FaultReport};
pub use execution::{ContextStatus, ExecutionContext};
pub use node_context::NodeContext;
pub use options::{ContextOptions, DEFAULT_MAX_SIGNALS_PER_STEP};
pub use runtime::NodeState;

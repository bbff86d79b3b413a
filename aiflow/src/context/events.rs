//! Observable context events and the fault channel.
//!
//! A context configured with an event sender reports every lifecycle
//! transition. [`event_channel`] returns the sender together with a
//! `Stream` over the events.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::NodeFault;
use crate::graph::{NodeId, NodeResult};

/// A fault caught at the scheduler boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultReport {
    pub node: NodeId,
    pub name: String,
    pub generation: u64,
    pub fault: NodeFault,
}

/// Event emitted while a context runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    Started {
        agent: String,
    },
    Activated {
        node: NodeId,
        name: String,
        generation: u64,
    },
    /// `on_activate` returned Running.
    Running {
        node: NodeId,
        name: String,
    },
    Finished {
        node: NodeId,
        name: String,
        result: NodeResult,
        fired: Vec<String>,
    },
    Fault(FaultReport),
    /// A signal reached a Running latched node and was merged.
    Merged {
        node: NodeId,
        name: String,
        pin: String,
    },
    /// A signal reached a Running non-latched node and was queued.
    Deferred {
        node: NodeId,
        name: String,
        pin: String,
    },
    /// A partial `All` join was reset by its merge window.
    JoinExpired {
        node: NodeId,
        name: String,
        pin: String,
    },
    ContextFinished(NodeResult),
    Cancelled,
}

pub type EventSender = mpsc::UnboundedSender<ContextEvent>;
pub type EventStream = UnboundedReceiverStream<ContextEvent>;

/// Creates a sender for [`ContextOptions::events`](super::ContextOptions) and
/// the stream that receives from it.
pub fn event_channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}

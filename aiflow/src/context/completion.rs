//! Out-of-band completion and cancellation.
//!
//! Work that finishes on another thread never touches per-run state directly:
//! it sends a [`Completion`] through the context's channel, and the context
//! drains that channel at the start of its next step. Each activation gets a
//! ticket; a completion whose ticket no longer matches is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::NodeFault;
use crate::graph::{NodeId, Outcome};

/// Message sent by a [`Completer`].
#[derive(Debug)]
pub(crate) struct Completion {
    pub node: NodeId,
    pub ticket: u64,
    pub result: Result<Outcome, NodeFault>,
}

/// Completes one Running activation from any thread.
///
/// Obtained from [`NodeContext::completer`](super::NodeContext::completer).
/// Sending after the context ended is silently ignored.
#[derive(Debug, Clone)]
pub struct Completer {
    tx: mpsc::UnboundedSender<Completion>,
    node: NodeId,
    ticket: u64,
}

impl Completer {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Completion>, node: NodeId, ticket: u64) -> Self {
        Self { tx, node, ticket }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Finishes the activation with `outcome`.
    pub fn complete(&self, outcome: impl Into<Outcome>) {
        let _ = self.tx.send(Completion {
            node: self.node,
            ticket: self.ticket,
            result: Ok(outcome.into()),
        });
    }

    /// Finishes the activation with a fault.
    pub fn fail(&self, fault: NodeFault) {
        let _ = self.tx.send(Completion {
            node: self.node,
            ticket: self.ticket,
            result: Err(fault),
        });
    }
}

/// Thread-safe cancellation request for one context.
///
/// The context observes it at the start of each step and before every node
/// callback.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

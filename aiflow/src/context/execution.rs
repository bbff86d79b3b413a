//! Execution context: one live run of a finalized graph.
//!
//! Created by `start`, advanced by `tick` and `trigger`, ended by a terminal
//! node, by draining, or by `cancel`. The graph is shared read-only; all
//! mutable run state lives here. The propagation algorithm itself is in
//! `scheduler.rs`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::blackboard::Blackboard;
use crate::error::FlowError;
use crate::graph::{logging, FiredPin, FlowGraph, NodeId, NodeResult};
use crate::tags::TagSet;
use crate::value::Value;

use super::completion::{CancelHandle, Completion};
use super::events::{ContextEvent, EventSender, FaultReport};
use super::options::ContextOptions;
use super::runtime::{NodeRuntime, NodeState, Signal, SignalSource};

/// Terminal flag of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStatus {
    Running,
    Finished(NodeResult),
    Cancelled,
}

/// One run of a [`FlowGraph`] bound to an agent.
///
/// Single-threaded: every method takes `&mut self`. Cross-thread interaction
/// goes through a [`Completer`](super::Completer) or a [`CancelHandle`].
/// Dropping a running context cancels it.
pub struct ExecutionContext {
    pub(super) graph: Arc<FlowGraph>,
    pub(super) runtimes: Vec<NodeRuntime>,
    pub(super) queue: VecDeque<Signal>,
    pub(super) generation: u64,
    pub(super) status: ContextStatus,
    pub(super) blackboard: Blackboard,
    pub(super) tags: TagSet,
    pub(super) initial_inputs: BTreeMap<String, Value>,
    pub(super) faults: Vec<FaultReport>,
    pub(super) outputs: BTreeMap<NodeId, Vec<FiredPin>>,
    pub(super) last_result: Option<NodeResult>,
    pub(super) completion_tx: mpsc::UnboundedSender<Completion>,
    pub(super) completion_rx: mpsc::UnboundedReceiver<Completion>,
    pub(super) cancel: CancelHandle,
    pub(super) events: Option<EventSender>,
    pub(super) agent: String,
    pub(super) max_signals_per_step: usize,
}

impl ExecutionContext {
    /// Starts a run with default options.
    pub fn start(
        graph: Arc<FlowGraph>,
        inputs: BTreeMap<String, Value>,
    ) -> Result<Self, FlowError> {
        Self::start_with(graph, inputs, ContextOptions::default())
    }

    /// Creates per-run state, signals every entry node in generation 1 and
    /// propagates until the queue is empty or the context ends.
    pub fn start_with(
        graph: Arc<FlowGraph>,
        inputs: BTreeMap<String, Value>,
        options: ContextOptions,
    ) -> Result<Self, FlowError> {
        let entries = graph
            .topology()
            .ok_or(FlowError::GraphNotFinalized)?
            .entries
            .clone();

        let runtimes = (0..graph.node_capacity())
            .map(|i| NodeRuntime::new(graph.node(NodeId(i))))
            .collect();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let mut ctx = Self {
            graph,
            runtimes,
            queue: VecDeque::new(),
            generation: 1,
            status: ContextStatus::Running,
            blackboard: options.blackboard,
            tags: options.tags,
            initial_inputs: inputs,
            faults: Vec::new(),
            outputs: BTreeMap::new(),
            last_result: None,
            completion_tx,
            completion_rx,
            cancel: CancelHandle::new(),
            events: options.events,
            agent: options.agent,
            max_signals_per_step: options.max_signals_per_step.max(1),
        };

        logging::log_context_start(&ctx.agent, ctx.graph.nodes().count());
        ctx.emit(ContextEvent::Started {
            agent: ctx.agent.clone(),
        });

        for entry in entries {
            ctx.queue.push_back(Signal {
                target: entry,
                pin: None,
                source: SignalSource::External,
                generation: 1,
                value: None,
            });
        }
        ctx.propagate();
        ctx.check_drained();
        Ok(ctx)
    }

    /// One scheduler step: observe cancellation, drain completions, tick
    /// Running nodes, expire merge windows, propagate, check for drain.
    ///
    /// No-op on a terminal context.
    pub fn tick(&mut self, dt: f32) -> ContextStatus {
        if self.observe_cancel() {
            return self.status;
        }
        self.drain_completions();
        if !self.is_terminal() {
            self.tick_running(dt);
        }
        if !self.is_terminal() {
            self.expire_merge_windows(dt);
        }
        self.propagate();
        self.check_drained();
        self.status
    }

    /// Signals `node`'s input `pin` from outside the graph and propagates.
    pub fn trigger(
        &mut self,
        node: NodeId,
        pin: &str,
        value: Option<Value>,
    ) -> Result<(), FlowError> {
        if self.observe_cancel() {
            return Err(FlowError::ContextTerminated);
        }
        let target = self.graph.graph_node(node)?;
        let pin_index = target
            .info()
            .input_index(pin)
            .ok_or_else(|| FlowError::PinNotFound {
                node: target.name().to_string(),
                pin: pin.to_string(),
            })?;
        self.queue.push_back(Signal {
            target: node,
            pin: Some(pin_index),
            source: SignalSource::External,
            generation: self.generation,
            value,
        });
        self.propagate();
        self.check_drained();
        Ok(())
    }

    /// Cancels the run: `on_cancel` once for every Activated/Running node,
    /// then per-run state is released. No-op on a terminal context.
    pub fn cancel(&mut self) {
        if !self.is_terminal() {
            self.cancel_now();
        }
    }

    /// Handle that requests cancellation from any thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn status(&self) -> ContextStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, ContextStatus::Finished(_))
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ContextStatus::Cancelled
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ContextStatus::Running
    }

    /// Outcome of a finished context; `None` while running or after cancel.
    pub fn result(&self) -> Option<NodeResult> {
        match self.status {
            ContextStatus::Finished(result) => Some(result),
            _ => None,
        }
    }

    pub fn faults(&self) -> &[FaultReport] {
        &self.faults
    }

    pub fn node_state(&self, node: NodeId) -> Option<NodeState> {
        self.graph.node(node)?;
        self.runtimes.get(node.0).map(|rt| rt.state)
    }

    /// Pins fired by the node's most recent finish.
    pub fn node_outputs(&self, node: NodeId) -> Option<&[FiredPin]> {
        self.outputs.get(&node).map(Vec::as_slice)
    }

    /// Nodes currently Running, in id order.
    pub fn running_nodes(&self) -> Vec<NodeId> {
        self.runtimes
            .iter()
            .enumerate()
            .filter(|(_, rt)| rt.state == NodeState::Running)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Signals waiting for the next step.
    pub fn pending_signals(&self) -> usize {
        self.queue.len()
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Replaces the agent's tags; conditions see them from the next activation on.
    pub fn set_tags(&mut self, tags: TagSet) {
        self.tags = tags;
    }

    /// Highest generation issued so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn graph(&self) -> &Arc<FlowGraph> {
        &self.graph
    }

    pub(super) fn emit(&self, event: ContextEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        if !self.is_terminal() {
            self.cancel_now();
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("agent", &self.agent)
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("pending", &self.queue.len())
            .field("faults", &self.faults.len())
            .finish()
    }
}

//! Context passed into node callbacks.
//!
//! Gives a node access to the per-run state it is allowed to touch: the
//! blackboard, the agent's tags, its own memory slot, a seeded RNG and a
//! completer for out-of-band completion.

use std::any::Any;
use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::blackboard::Blackboard;
use crate::graph::NodeId;
use crate::rng::{derive_seed, FlowRng};
use crate::tags::TagSet;
use crate::value::Value;

use super::completion::{Completer, Completion};

pub struct NodeContext<'a> {
    node: NodeId,
    name: &'a str,
    agent: &'a str,
    generation: u64,
    blackboard: &'a mut Blackboard,
    tags: &'a TagSet,
    initial_inputs: &'a BTreeMap<String, Value>,
    memory: &'a mut Option<Box<dyn Any + Send>>,
    completion_tx: &'a mpsc::UnboundedSender<Completion>,
    ticket: u64,
    rng: FlowRng,
}

impl<'a> NodeContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        node: NodeId,
        name: &'a str,
        agent: &'a str,
        generation: u64,
        blackboard: &'a mut Blackboard,
        tags: &'a TagSet,
        initial_inputs: &'a BTreeMap<String, Value>,
        memory: &'a mut Option<Box<dyn Any + Send>>,
        completion_tx: &'a mpsc::UnboundedSender<Completion>,
        ticket: u64,
        seed: (u64, u64),
    ) -> Self {
        Self {
            node,
            name,
            agent,
            generation,
            blackboard,
            tags,
            initial_inputs,
            memory,
            completion_tx,
            ticket,
            rng: FlowRng::new(derive_seed(seed.0, node.0 as u64, seed.1)),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn node_name(&self) -> &str {
        self.name
    }

    pub fn agent(&self) -> &str {
        self.agent
    }

    /// Generation of the activation being processed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn blackboard(&self) -> &Blackboard {
        &*self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut *self.blackboard
    }

    pub fn tags(&self) -> &TagSet {
        self.tags
    }

    /// Value passed to `start` under `key`.
    pub fn initial_input(&self, key: &str) -> Option<&Value> {
        self.initial_inputs.get(key)
    }

    /// Generator seeded from the graph seed, this node and its activation count.
    pub fn rng(&mut self) -> &mut FlowRng {
        &mut self.rng
    }

    /// Handle that finishes the current activation from any thread.
    pub fn completer(&self) -> Completer {
        Completer::new(self.completion_tx.clone(), self.node, self.ticket)
    }

    /// This node's per-run memory, created with `T::default()` on first use
    /// (or when it held a different type). Released when the context ends.
    pub fn memory_mut<T: Default + Send + 'static>(&mut self) -> &mut T {
        let slot = &mut *self.memory;
        if !matches!(slot, Some(m) if m.is::<T>()) {
            *slot = Some(Box::new(T::default()));
        }
        match slot.as_mut().and_then(|m| m.downcast_mut::<T>()) {
            Some(value) => value,
            None => unreachable!("memory slot was just initialised with this type"),
        }
    }

    /// Takes this node's memory if it holds a `T`.
    pub fn take_memory<T: Send + 'static>(&mut self) -> Option<T> {
        match self.memory.take()?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                *self.memory = Some(other);
                None
            }
        }
    }

    pub fn clear_memory(&mut self) {
        *self.memory = None;
    }
}

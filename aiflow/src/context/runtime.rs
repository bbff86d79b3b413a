//! Per-run node state owned by an execution context.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::graph::{ConnectionId, GraphNode, MergePolicy, NodeId, NodeResult};
use crate::value::Value;

/// Lifecycle state of one node within one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    /// Inside `on_activate`.
    Activated,
    Running,
    Finished(NodeResult),
    Cancelled,
}

/// Where a signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalSource {
    Connection(ConnectionId),
    /// `trigger` or entry start.
    External,
}

/// One queued activation signal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Signal {
    pub target: NodeId,
    /// Input pin index; `None` activates the node directly (entry start).
    pub pin: Option<usize>,
    pub source: SignalSource,
    pub generation: u64,
    pub value: Option<Value>,
}

/// Generations a pin remembers as already satisfied.
const TRACKED_GENERATIONS: usize = 64;

/// A partial `All` join: connections that arrived, with their generations.
#[derive(Debug, Default)]
pub(crate) struct JoinWave {
    pub arrived: Vec<(ConnectionId, u64)>,
    /// Seconds since the first arrival.
    pub elapsed: f32,
}

impl JoinWave {
    fn has(&self, cid: ConnectionId) -> bool {
        self.arrived.iter().any(|(c, _)| *c == cid)
    }

    /// Newest generation among the arrivals.
    fn generation(&self) -> u64 {
        self.arrived.iter().map(|(_, g)| *g).max().unwrap_or(0)
    }
}

/// Result of recording one arrival on a multi-input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arrival {
    /// The pin is satisfied; activate in this generation.
    Satisfied(u64),
    /// Part of an `All` join that is still waiting for other connections.
    Pending,
    /// The pin was already satisfied in this generation.
    Duplicate,
}

/// Arrival bookkeeping for one input pin.
///
/// `All` joins pair arrivals first come, first served: a connection's
/// arrival fills the oldest open wave it has not filled yet. Arrivals from
/// older generations are never discarded, so a branch that outlives a loop
/// elsewhere in the graph still reaches its join.
#[derive(Debug, Default)]
pub(crate) struct PinJoin {
    /// Satisfied and waiting to be consumed by an activation.
    pub satisfied: bool,
    /// Open `All` waves, oldest first.
    pub waves: VecDeque<JoinWave>,
    /// Generations in which this multi-input pin was already satisfied.
    pub consumed: BTreeSet<u64>,
    /// Latest value per feeding connection; survives generations.
    pub values: BTreeMap<ConnectionId, Value>,
    pub external: Option<Value>,
}

impl PinJoin {
    /// Records a connection arrival on a multi-input pin fed by `feeding`
    /// connections.
    pub fn arrive(
        &mut self,
        merge: MergePolicy,
        feeding: usize,
        cid: ConnectionId,
        generation: u64,
    ) -> Arrival {
        if self.consumed.contains(&generation) {
            return Arrival::Duplicate;
        }
        if merge == MergePolicy::Any {
            self.consume([generation]);
            return Arrival::Satisfied(generation);
        }

        let index = match self.waves.iter().position(|w| !w.has(cid)) {
            Some(index) => index,
            None => {
                self.waves.push_back(JoinWave::default());
                self.waves.len() - 1
            }
        };
        self.waves[index].arrived.push((cid, generation));
        if self.waves[index].arrived.len() < feeding {
            return Arrival::Pending;
        }
        let Some(wave) = self.waves.remove(index) else {
            return Arrival::Pending;
        };
        let generation = wave.generation();
        self.consume(wave.arrived.iter().map(|(_, g)| *g));
        Arrival::Satisfied(generation)
    }

    fn consume(&mut self, generations: impl IntoIterator<Item = u64>) {
        self.satisfied = true;
        self.consumed.extend(generations);
        while self.consumed.len() > TRACKED_GENERATIONS {
            self.consumed.pop_first();
        }
    }

    /// An `All` join has arrivals that still wait for other connections.
    pub fn is_partial(&self) -> bool {
        !self.waves.is_empty()
    }

    /// Advances every open wave by `dt` and drops those older than `window`.
    /// Returns how many expired.
    pub fn expire(&mut self, dt: f32, window: f32) -> usize {
        let before = self.waves.len();
        self.waves.retain_mut(|wave| {
            wave.elapsed += dt;
            wave.elapsed < window
        });
        before - self.waves.len()
    }

    /// Value delivered for this pin: latest-declared connection, then the
    /// external value.
    pub fn current_value(&self) -> Option<&Value> {
        self.values
            .iter()
            .next_back()
            .map(|(_, v)| v)
            .or(self.external.as_ref())
    }
}

/// Mutable state of one node for one run.
pub(crate) struct NodeRuntime {
    pub state: NodeState,
    pub joins: Vec<PinJoin>,
    /// Signals that arrived while a non-latched activation was Running.
    pub deferred: VecDeque<Signal>,
    /// Identifies the current activation for out-of-band completion.
    pub ticket: u64,
    pub activations: u64,
    /// Generation of the current (or last) activation.
    pub generation: u64,
    pub finished_once: bool,
    pub memory: Option<Box<dyn Any + Send>>,
}

impl NodeRuntime {
    pub fn new(node: Option<&GraphNode>) -> Self {
        let inputs = node.map(|n| n.info().inputs.len()).unwrap_or(0);
        Self {
            state: NodeState::Idle,
            joins: (0..inputs).map(|_| PinJoin::default()).collect(),
            deferred: VecDeque::new(),
            ticket: 0,
            activations: 0,
            generation: 0,
            finished_once: false,
            memory: None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, NodeState::Activated | NodeState::Running)
    }

    /// Drops everything the run accumulated except the lifecycle state.
    pub fn release(&mut self) {
        self.joins.iter_mut().for_each(|j| *j = PinJoin::default());
        self.deferred.clear();
        self.memory = None;
    }
}

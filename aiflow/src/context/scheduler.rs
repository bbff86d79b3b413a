//! Signal propagation.
//!
//! The queue holds `(target node, input pin, source, generation, value)`
//! signals and is processed FIFO. Node callbacks run behind a panic boundary;
//! a fault or panic becomes a Failure outcome for that node and never leaves
//! this module.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::NodeFault;
use crate::graph::{
    logging, Activation, FlowNode, InputValues, NodeId, NodeKind, NodeResult, Outcome,
};
use crate::value::PinType;

use super::events::{ContextEvent, FaultReport};
use super::execution::{ContextStatus, ExecutionContext};
use super::node_context::NodeContext;
use super::runtime::{Arrival, NodeState, Signal, SignalSource};

impl ExecutionContext {
    /// Applies a pending cancel request. Returns whether the context is terminal.
    pub(super) fn observe_cancel(&mut self) -> bool {
        if !self.is_terminal() && self.cancel.is_cancelled() {
            self.cancel_now();
        }
        self.is_terminal()
    }

    pub(super) fn cancel_now(&mut self) {
        let running = self.teardown();
        self.status = ContextStatus::Cancelled;
        logging::log_context_cancel(&self.agent, running);
        self.emit(ContextEvent::Cancelled);
    }

    pub(super) fn finish_context(&mut self, result: NodeResult) {
        if self.is_terminal() {
            return;
        }
        self.teardown();
        self.status = ContextStatus::Finished(result);
        logging::log_context_finish(&self.agent, result);
        self.emit(ContextEvent::ContextFinished(result));
    }

    /// Cancels every live node once, then releases per-run state.
    /// Returns how many nodes were cancelled.
    fn teardown(&mut self) -> usize {
        let live: Vec<NodeId> = self
            .runtimes
            .iter()
            .enumerate()
            .filter(|(_, rt)| rt.is_live())
            .map(|(i, _)| NodeId(i))
            .collect();
        for &id in &live {
            let generation = self.runtimes[id.0].generation;
            if let Err(fault) = self.invoke(id, |node, ctx| node.on_cancel(ctx)) {
                self.record_fault(id, fault, generation);
            }
            self.runtimes[id.0].state = NodeState::Cancelled;
        }
        self.queue.clear();
        self.runtimes.iter_mut().for_each(|rt| rt.release());
        live.len()
    }

    /// Applies completions sent by completers since the last step.
    pub(super) fn drain_completions(&mut self) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.observe_cancel() {
                return;
            }
            let id = completion.node;
            let Some(rt) = self.runtimes.get(id.0) else {
                continue;
            };
            if rt.state != NodeState::Running || rt.ticket != completion.ticket {
                logging::log_stale_completion(self.graph.node_name(id), completion.ticket);
                continue;
            }
            let generation = rt.generation;
            let result = completion.result.and_then(|outcome| {
                self.invoke(id, |node, ctx| node.on_complete(ctx, outcome))?
            });
            match result {
                Ok(outcome) => self.finish_node(id, outcome, generation),
                Err(fault) => self.fault_node(id, fault, generation),
            }
            if self.is_terminal() {
                return;
            }
        }
    }

    /// Calls `on_tick` on every Running node in id order.
    pub(super) fn tick_running(&mut self, dt: f32) {
        for id in self.running_nodes() {
            if self.observe_cancel() {
                return;
            }
            // an earlier node in this pass may have ended the context or this node
            if self.runtimes[id.0].state != NodeState::Running {
                continue;
            }
            let generation = self.runtimes[id.0].generation;
            match self.invoke(id, |node, ctx| node.on_tick(ctx, dt)) {
                Ok(Ok(None)) => {}
                Ok(Ok(Some(outcome))) => self.finish_node(id, outcome, generation),
                Ok(Err(fault)) | Err(fault) => self.fault_node(id, fault, generation),
            }
        }
    }

    /// Advances merge windows of partial `All` joins and resets expired ones.
    pub(super) fn expire_merge_windows(&mut self, dt: f32) {
        let graph = Arc::clone(&self.graph);
        for (id, node) in graph.nodes() {
            for (pin, spec) in node.info().inputs.iter().enumerate() {
                let Some(window) = spec.merge_window else {
                    continue;
                };
                if !spec.multi_input {
                    continue;
                }
                let expired = self.runtimes[id.0].joins[pin].expire(dt, window);
                for _ in 0..expired {
                    logging::log_join_expired(node.name(), &spec.name);
                    self.emit(ContextEvent::JoinExpired {
                        node: id,
                        name: node.name().to_string(),
                        pin: spec.name.clone(),
                    });
                }
            }
        }
    }

    /// Processes queued signals FIFO, up to the per-step budget.
    pub(super) fn propagate(&mut self) {
        let mut processed = 0;
        loop {
            if self.observe_cancel() {
                return;
            }
            if self.queue.is_empty() {
                return;
            }
            if processed >= self.max_signals_per_step {
                logging::log_step_budget_exhausted(&self.agent, self.queue.len());
                return;
            }
            let Some(signal) = self.queue.pop_front() else {
                return;
            };
            processed += 1;
            self.process_signal(signal);
        }
    }

    /// Finishes the context when nothing is queued, running or half-joined.
    pub(super) fn check_drained(&mut self) {
        if self.is_terminal() || !self.queue.is_empty() {
            return;
        }
        if self.runtimes.iter().any(|rt| rt.is_live()) {
            return;
        }
        if self.has_partial_joins() {
            return;
        }
        let result = self.last_result.unwrap_or(NodeResult::Success);
        self.finish_context(result);
    }

    fn has_partial_joins(&self) -> bool {
        self.graph.nodes().any(|(id, node)| {
            let rt = &self.runtimes[id.0];
            let inputs = &node.info().inputs;
            let multi_partial = inputs
                .iter()
                .zip(&rt.joins)
                .any(|(spec, join)| spec.multi_input && join.is_partial());
            let required = inputs.iter().filter(|p| p.required).count();
            let satisfied = inputs
                .iter()
                .zip(&rt.joins)
                .filter(|(p, j)| p.required && j.satisfied)
                .count();
            multi_partial || (satisfied > 0 && satisfied < required)
        })
    }

    fn process_signal(&mut self, signal: Signal) {
        let graph = Arc::clone(&self.graph);
        let id = signal.target;
        let Some(node) = graph.node(id) else {
            return;
        };
        let info = node.info();
        let pin_name = signal
            .pin
            .and_then(|p| info.inputs.get(p))
            .map(|p| p.name.as_str())
            .unwrap_or("<entry>");

        let rt = &mut self.runtimes[id.0];
        if node.is_one_shot() && rt.finished_once {
            logging::log_signal_dropped(node.name(), "one-shot node already finished");
            return;
        }

        if rt.is_live() {
            if node.is_latched() {
                if let (Some(pin), Some(value)) = (signal.pin, signal.value) {
                    let join = &mut rt.joins[pin];
                    match signal.source {
                        SignalSource::Connection(cid) => {
                            join.values.insert(cid, value);
                        }
                        SignalSource::External => join.external = Some(value),
                    }
                }
                logging::log_signal_merged(node.name(), pin_name);
                self.emit(ContextEvent::Merged {
                    node: id,
                    name: node.name().to_string(),
                    pin: pin_name.to_string(),
                });
            } else {
                logging::log_signal_deferred(node.name(), pin_name);
                let pin = pin_name.to_string();
                rt.deferred.push_back(signal);
                self.emit(ContextEvent::Deferred {
                    node: id,
                    name: node.name().to_string(),
                    pin,
                });
            }
            return;
        }

        let Some(pin) = signal.pin else {
            self.activate(id, None, signal.generation);
            return;
        };
        let Some(spec) = info.inputs.get(pin) else {
            return;
        };
        let feeding = graph
            .topology()
            .map(|t| t.feeding[id.0][pin].len())
            .unwrap_or(0);

        let join = &mut rt.joins[pin];
        if spec.ty != PinType::Signal {
            if let Some(value) = signal.value {
                match signal.source {
                    SignalSource::Connection(cid) => {
                        join.values.insert(cid, value);
                    }
                    SignalSource::External => join.external = Some(value),
                }
            }
        }

        let mut generation = signal.generation;
        match (spec.multi_input, signal.source) {
            (true, SignalSource::Connection(cid)) => {
                match join.arrive(spec.merge, feeding, cid, signal.generation) {
                    Arrival::Satisfied(g) => generation = g,
                    Arrival::Pending => return,
                    Arrival::Duplicate => {
                        logging::log_signal_dropped(
                            node.name(),
                            "input already satisfied this generation",
                        );
                        return;
                    }
                }
            }
            _ => join.satisfied = true,
        }

        let ready = if info.has_required_inputs() {
            spec.required
                && info
                    .inputs
                    .iter()
                    .zip(&rt.joins)
                    .all(|(p, j)| !p.required || j.satisfied)
        } else {
            spec.activates && rt.joins[pin].satisfied
        };
        if ready {
            self.activate(id, Some(pin), generation);
        }
    }

    fn activate(&mut self, id: NodeId, activating_pin: Option<usize>, generation: u64) {
        if self.observe_cancel() {
            return;
        }
        let graph = Arc::clone(&self.graph);
        let Some(node) = graph.node(id) else {
            return;
        };
        let info = node.info();

        let rt = &mut self.runtimes[id.0];
        let mut values = BTreeMap::new();
        if activating_pin.is_none() {
            values.extend(
                self.initial_inputs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }
        for (spec, join) in info.inputs.iter().zip(rt.joins.iter_mut()) {
            let value = join.current_value().cloned().or_else(|| spec.default.clone());
            if let Some(value) = value {
                values.insert(spec.name.clone(), value);
            }
            join.satisfied = false;
        }
        let inputs = InputValues::new(
            activating_pin.and_then(|p| info.inputs.get(p)).map(|p| p.name.clone()),
            values,
        );

        rt.state = NodeState::Activated;
        rt.activations += 1;
        rt.ticket += 1;
        rt.generation = generation;

        logging::log_node_activate(node.name(), generation);
        self.emit(ContextEvent::Activated {
            node: id,
            name: node.name().to_string(),
            generation,
        });

        match self.invoke(id, |n, ctx| n.on_activate(ctx, &inputs)) {
            Ok(Ok(Activation::Finished(outcome))) => self.finish_node(id, outcome, generation),
            Ok(Ok(Activation::Running)) => {
                if self.runtimes[id.0].state == NodeState::Activated {
                    self.runtimes[id.0].state = NodeState::Running;
                    self.emit(ContextEvent::Running {
                        node: id,
                        name: node.name().to_string(),
                    });
                }
            }
            Ok(Err(fault)) | Err(fault) => self.fault_node(id, fault, generation),
        }
    }

    /// Checks fired pins against the node's declared outputs, then completes it.
    fn finish_node(&mut self, id: NodeId, outcome: Outcome, generation: u64) {
        let graph = Arc::clone(&self.graph);
        let Some(node) = graph.node(id) else {
            return;
        };
        let info = node.info();
        for fired in &outcome.fired {
            let Some(index) = info.output_index(&fired.pin) else {
                return self.fault_node(id, NodeFault::UnknownOutput(fired.pin.clone()), generation);
            };
            let spec = &info.outputs[index];
            if let Some(value) = &fired.value {
                if !spec.ty.accepts(value) {
                    let fault = NodeFault::OutputTypeMismatch {
                        pin: fired.pin.clone(),
                        expected: spec.ty,
                        actual: value.pin_type(),
                    };
                    return self.fault_node(id, fault, generation);
                }
            }
        }
        self.complete_node(id, outcome, generation);
    }

    /// Records a fault and finishes the node with Failure, firing its fault
    /// output when declared.
    fn fault_node(&mut self, id: NodeId, fault: NodeFault, generation: u64) {
        let graph = Arc::clone(&self.graph);
        let Some(node) = graph.node(id) else {
            return;
        };
        self.record_fault(id, fault, generation);

        let info = node.info();
        let fault_pin = info
            .fault_output
            .as_ref()
            .filter(|pin| info.output_index(pin).is_some());
        let mut outcome = Outcome::failure();
        if let Some(pin) = fault_pin {
            outcome = outcome.fire(pin.clone());
        }

        let sole_entry = graph
            .topology()
            .map(|t| t.entries.len() == 1 && t.entries[0] == id)
            .unwrap_or(false);
        self.complete_node(id, outcome, generation);
        if sole_entry && fault_pin.is_none() {
            self.finish_context(NodeResult::Failure);
        }
    }

    fn record_fault(&mut self, id: NodeId, fault: NodeFault, generation: u64) {
        let name = self.graph.node_name(id).to_string();
        logging::log_node_fault(&name, &fault);
        let report = FaultReport {
            node: id,
            name,
            generation,
            fault,
        };
        self.emit(ContextEvent::Fault(report.clone()));
        self.faults.push(report);
    }

    /// Marks the node Finished and routes its fired pins.
    fn complete_node(&mut self, id: NodeId, outcome: Outcome, generation: u64) {
        let graph = Arc::clone(&self.graph);
        let Some(node) = graph.node(id) else {
            return;
        };
        let info = node.info();

        let rt = &mut self.runtimes[id.0];
        rt.state = NodeState::Finished(outcome.result);
        rt.finished_once = true;
        let deferred: Vec<Signal> = rt.deferred.drain(..).collect();
        self.last_result = Some(outcome.result);

        logging::log_node_finish(node.name(), outcome.result, outcome.fired.len());
        self.emit(ContextEvent::Finished {
            node: id,
            name: node.name().to_string(),
            result: outcome.result,
            fired: outcome.fired.iter().map(|f| f.pin.clone()).collect(),
        });
        self.outputs.insert(id, outcome.fired.clone());

        if info.kind == NodeKind::Terminal {
            self.finish_context(outcome.result);
            return;
        }

        self.queue.extend(deferred);

        let Some(topology) = graph.topology() else {
            return;
        };
        for fired in outcome.fired {
            let Some(index) = info.output_index(&fired.pin) else {
                continue;
            };
            for &cid in &topology.outbound[id.0][index] {
                let Some(connection) = graph.connection(cid) else {
                    continue;
                };
                let signal_generation = if topology.back_edges.contains(&cid) {
                    self.generation += 1;
                    self.generation
                } else {
                    generation
                };
                self.queue.push_back(Signal {
                    target: connection.target,
                    pin: Some(connection.target_pin),
                    source: SignalSource::Connection(cid),
                    generation: signal_generation,
                    value: fired.value.clone(),
                });
            }
        }
    }

    /// Runs a node callback behind a panic boundary with a fresh `NodeContext`.
    fn invoke<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&dyn FlowNode, &mut NodeContext<'_>) -> R,
    ) -> Result<R, NodeFault> {
        let graph = Arc::clone(&self.graph);
        let node = graph
            .node(id)
            .ok_or_else(|| NodeFault::activation(format!("node {} was removed", id)))?;
        let rt = &mut self.runtimes[id.0];
        let mut ctx = NodeContext::new(
            id,
            node.name(),
            &self.agent,
            rt.generation,
            &mut self.blackboard,
            &self.tags,
            &self.initial_inputs,
            &mut rt.memory,
            &self.completion_tx,
            rt.ticket,
            (graph.seed(), rt.activations),
        );
        panic::catch_unwind(AssertUnwindSafe(|| f(node.node(), &mut ctx)))
            .map_err(|payload| NodeFault::Panicked(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

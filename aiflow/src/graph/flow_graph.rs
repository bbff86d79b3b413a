//! Flow graph: nodes + typed connections, finalized into an immutable template.
//!
//! Add nodes with `add_node`, link pins with `connect`, mark entries, then
//! `finalize`. A finalized graph is shared through `Arc` by any number of
//! [`ExecutionContext`](crate::context::ExecutionContext)s.

use std::collections::HashMap;

use crate::error::FlowError;

use super::connection::{Connection, ConnectionId};
use super::node::{FlowNode, NodeId, NodeInfo, NodeKind};
use super::pin::PinSpec;
use super::validate::{self, Topology};

/// A node stored in the graph, with its cached declaration and flags.
pub struct GraphNode {
    pub(crate) name: String,
    pub(crate) node: Box<dyn FlowNode>,
    pub(crate) info: NodeInfo,
    pub(crate) entry: bool,
    pub(crate) latched: bool,
    pub(crate) one_shot: bool,
}

impl GraphNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn node(&self) -> &dyn FlowNode {
        self.node.as_ref()
    }

    pub fn is_entry(&self) -> bool {
        self.entry
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("name", &self.name)
            .field("kind", &self.info.kind)
            .field("entry", &self.entry)
            .field("latched", &self.latched)
            .field("one_shot", &self.one_shot)
            .finish()
    }
}

/// Graph of flow nodes.
///
/// Node and connection ids are arena indices; removed slots stay empty so ids
/// never shift. Every mutator fails with [`FlowError::GraphFrozen`] once the
/// graph is finalized.
#[derive(Debug, Default)]
pub struct FlowGraph {
    nodes: Vec<Option<GraphNode>>,
    connections: Vec<Option<Connection>>,
    names: HashMap<String, NodeId>,
    seed: u64,
    allow_loops: bool,
    /// Present once finalized.
    topology: Option<Topology>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_mutable(&self) -> Result<(), FlowError> {
        if self.topology.is_some() {
            return Err(FlowError::GraphFrozen);
        }
        Ok(())
    }

    /// Adds a node under a unique name. Entry-kind nodes are marked as entries.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        node: impl FlowNode + 'static,
    ) -> Result<NodeId, FlowError> {
        self.add_boxed(name, Box::new(node))
    }

    pub fn add_boxed(
        &mut self,
        name: impl Into<String>,
        node: Box<dyn FlowNode>,
    ) -> Result<NodeId, FlowError> {
        self.ensure_mutable()?;
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(FlowError::DuplicateNodeName(name));
        }
        let info = node.info();
        let id = NodeId(self.nodes.len());
        self.names.insert(name.clone(), id);
        self.nodes.push(Some(GraphNode {
            name,
            entry: info.kind == NodeKind::Entry,
            node,
            info,
            latched: false,
            one_shot: false,
        }));
        Ok(id)
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), FlowError> {
        self.ensure_mutable()?;
        let removed = self
            .nodes
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| FlowError::NodeNotFound(id.to_string()))?;
        self.names.remove(&removed.name);
        for slot in self.connections.iter_mut() {
            if matches!(slot, Some(c) if c.source == id || c.target == id) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Connects `source.source_pin` (output) to `target.target_pin` (input).
    pub fn connect(
        &mut self,
        source: NodeId,
        source_pin: &str,
        target: NodeId,
        target_pin: &str,
    ) -> Result<ConnectionId, FlowError> {
        self.ensure_mutable()?;
        let src = self.graph_node(source)?;
        let dst = self.graph_node(target)?;

        let (src_index, src_spec) = find_pin(src, source_pin, true)?;
        let (dst_index, dst_spec) = find_pin(dst, target_pin, false)?;

        let src_label = format!("{}.{}", src.name, source_pin);
        let dst_label = format!("{}.{}", dst.name, target_pin);

        if !src_spec.ty.is_compatible_with(dst_spec.ty) {
            return Err(FlowError::TypeMismatch {
                source_pin: src_label,
                source_type: src_spec.ty,
                target_pin: dst_label,
                target_type: dst_spec.ty,
            });
        }

        let connection = Connection {
            source,
            source_pin: src_index,
            target,
            target_pin: dst_index,
        };
        if self.connections.iter().flatten().any(|c| *c == connection) {
            return Err(FlowError::DuplicateConnection(format!(
                "{} -> {}",
                src_label, dst_label
            )));
        }
        if !dst_spec.multi_input
            && self
                .connections
                .iter()
                .flatten()
                .any(|c| c.target == target && c.target_pin == dst_index)
        {
            return Err(FlowError::InputAlreadyConnected(dst_label));
        }

        let id = ConnectionId(self.connections.len());
        self.connections.push(Some(connection));
        Ok(id)
    }

    /// Removes the connection between the given pins. Returns whether one existed.
    pub fn disconnect(
        &mut self,
        source: NodeId,
        source_pin: &str,
        target: NodeId,
        target_pin: &str,
    ) -> Result<bool, FlowError> {
        self.ensure_mutable()?;
        let src = self
            .node(source)
            .and_then(|n| n.info.output_index(source_pin));
        let dst = self
            .node(target)
            .and_then(|n| n.info.input_index(target_pin));
        let (Some(src), Some(dst)) = (src, dst) else {
            return Ok(false);
        };
        let wanted = Connection {
            source,
            source_pin: src,
            target,
            target_pin: dst,
        };
        let slot = self
            .connections
            .iter_mut()
            .find(|slot| matches!(slot, Some(c) if *c == wanted));
        match slot {
            Some(slot) => {
                *slot = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a connection by id. Returns whether it existed.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<bool, FlowError> {
        self.ensure_mutable()?;
        Ok(self
            .connections
            .get_mut(id.0)
            .and_then(Option::take)
            .is_some())
    }

    pub fn set_entry(&mut self, id: NodeId, entry: bool) -> Result<(), FlowError> {
        self.ensure_mutable()?;
        self.graph_node_mut(id)?.entry = entry;
        Ok(())
    }

    /// Latched nodes accept signals while Running (merged, not queued) and may
    /// form cycles.
    pub fn set_latched(&mut self, id: NodeId, latched: bool) -> Result<(), FlowError> {
        self.ensure_mutable()?;
        self.graph_node_mut(id)?.latched = latched;
        Ok(())
    }

    /// One-shot nodes ignore every signal after their first finish.
    pub fn set_one_shot(&mut self, id: NodeId, one_shot: bool) -> Result<(), FlowError> {
        self.ensure_mutable()?;
        self.graph_node_mut(id)?.one_shot = one_shot;
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u64) -> Result<(), FlowError> {
        self.ensure_mutable()?;
        self.seed = seed;
        Ok(())
    }

    /// Permits arbitrary cycles (behavior loops).
    pub fn allow_loops(&mut self, allow: bool) -> Result<(), FlowError> {
        self.ensure_mutable()?;
        self.allow_loops = allow;
        Ok(())
    }

    /// Validates structure and freezes the graph. Idempotent.
    pub fn finalize(&mut self) -> Result<(), FlowError> {
        if self.topology.is_some() {
            return Ok(());
        }
        let topology = validate::validate(self)?;
        self.topology = Some(topology);
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.topology.is_some()
    }

    pub(crate) fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeId(i), n)))
    }

    /// Number of node slots, including removed ones. Per-run state is sized by this.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.0).and_then(Option::as_ref)
    }

    /// Live connections in declaration order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (ConnectionId(i), c)))
    }

    pub fn entries(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().filter(|(_, n)| n.entry).map(|(id, _)| id)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn loops_allowed(&self) -> bool {
        self.allow_loops
    }

    pub(crate) fn graph_node(&self, id: NodeId) -> Result<&GraphNode, FlowError> {
        self.node(id)
            .ok_or_else(|| FlowError::NodeNotFound(id.to_string()))
    }

    fn graph_node_mut(&mut self, id: NodeId) -> Result<&mut GraphNode, FlowError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| FlowError::NodeNotFound(id.to_string()))
    }

    pub(crate) fn node_name(&self, id: NodeId) -> &str {
        self.node(id).map(|n| n.name.as_str()).unwrap_or("<removed>")
    }
}

/// Looks up a pin by name, checking its direction against the connection role.
fn find_pin<'a>(
    node: &'a GraphNode,
    pin: &str,
    as_source: bool,
) -> Result<(usize, &'a PinSpec), FlowError> {
    let (own, other) = if as_source {
        (&node.info.outputs, &node.info.inputs)
    } else {
        (&node.info.inputs, &node.info.outputs)
    };
    if let Some(index) = own.iter().position(|p| p.name == pin) {
        return Ok((index, &own[index]));
    }
    if other.iter().any(|p| p.name == pin) {
        let role = if as_source {
            "source must be an output pin"
        } else {
            "target must be an input pin"
        };
        return Err(FlowError::DirectionError(format!(
            "{}.{}: {}",
            node.name, pin, role
        )));
    }
    Err(FlowError::PinNotFound {
        node: node.name.clone(),
        pin: pin.to_string(),
    })
}

//! Finalize-time validation and topology.
//!
//! Checks run in a fixed order (dangling connections, entries, required
//! inputs, cycles) so the first structural problem is always the one reported.

use std::collections::{HashSet, VecDeque};

use crate::error::FlowError;

use super::connection::ConnectionId;
use super::flow_graph::FlowGraph;
use super::node::NodeId;

/// Adjacency computed at finalize and used by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Topology {
    /// `[node][output pin]` -> outbound connections in declaration order.
    pub outbound: Vec<Vec<Vec<ConnectionId>>>,
    /// `[node][input pin]` -> feeding connections in declaration order.
    pub feeding: Vec<Vec<Vec<ConnectionId>>>,
    /// Edges that close a cycle in depth-first order from the entries.
    pub back_edges: HashSet<ConnectionId>,
    pub entries: Vec<NodeId>,
}

pub(crate) fn validate(graph: &FlowGraph) -> Result<Topology, FlowError> {
    let capacity = graph.node_capacity();

    let mut outbound: Vec<Vec<Vec<ConnectionId>>> = vec![Vec::new(); capacity];
    let mut feeding: Vec<Vec<Vec<ConnectionId>>> = vec![Vec::new(); capacity];
    for (id, node) in graph.nodes() {
        outbound[id.0] = vec![Vec::new(); node.info.outputs.len()];
        feeding[id.0] = vec![Vec::new(); node.info.inputs.len()];
    }

    // successors per node: (connection, target) in declaration order
    let mut successors: Vec<Vec<(ConnectionId, NodeId)>> = vec![Vec::new(); capacity];
    for (cid, c) in graph.connections() {
        let (Some(src), Some(dst)) = (graph.node(c.source), graph.node(c.target)) else {
            return Err(FlowError::DanglingConnection(cid.0));
        };
        if c.source_pin >= src.info.outputs.len() || c.target_pin >= dst.info.inputs.len() {
            return Err(FlowError::DanglingConnection(cid.0));
        }
        outbound[c.source.0][c.source_pin].push(cid);
        feeding[c.target.0][c.target_pin].push(cid);
        successors[c.source.0].push((cid, c.target));
    }

    let entries: Vec<NodeId> = graph.entries().collect();
    if entries.is_empty() {
        return Err(FlowError::NoEntryNode);
    }

    let reachable = reachable_from(&entries, &successors, capacity);
    for (id, node) in graph.nodes() {
        if !reachable[id.0] {
            continue;
        }
        for (pin_index, pin) in node.info.inputs.iter().enumerate() {
            if pin.required && feeding[id.0][pin_index].is_empty() {
                return Err(FlowError::UnconnectedRequiredInput {
                    node: node.name.clone(),
                    pin: pin.name.clone(),
                });
            }
        }
    }

    if !graph.loops_allowed() {
        for (id, node) in graph.nodes() {
            if node.latched {
                continue;
            }
            if let Some(cycle) = cycle_through(id, &successors, capacity) {
                let names = cycle
                    .into_iter()
                    .map(|n| graph.node_name(n).to_string())
                    .collect();
                return Err(FlowError::IllegalCycle(names));
            }
        }
    }

    let back_edges = back_edges(graph, &entries, &successors, capacity);

    Ok(Topology {
        outbound,
        feeding,
        back_edges,
        entries,
    })
}

fn reachable_from(
    entries: &[NodeId],
    successors: &[Vec<(ConnectionId, NodeId)>],
    capacity: usize,
) -> Vec<bool> {
    let mut seen = vec![false; capacity];
    let mut queue: VecDeque<NodeId> = entries.iter().copied().collect();
    for e in entries {
        seen[e.0] = true;
    }
    while let Some(n) = queue.pop_front() {
        for &(_, next) in &successors[n.0] {
            if !seen[next.0] {
                seen[next.0] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Shortest cycle `start -> ... -> start`, if `start` lies on one.
fn cycle_through(
    start: NodeId,
    successors: &[Vec<(ConnectionId, NodeId)>],
    capacity: usize,
) -> Option<Vec<NodeId>> {
    let mut parent: Vec<Option<NodeId>> = vec![None; capacity];
    let mut seen = vec![false; capacity];
    let mut queue = VecDeque::new();
    for &(_, next) in &successors[start.0] {
        if next == start {
            return Some(vec![start, start]);
        }
        if !seen[next.0] {
            seen[next.0] = true;
            parent[next.0] = Some(start);
            queue.push_back(next);
        }
    }
    while let Some(n) = queue.pop_front() {
        for &(_, next) in &successors[n.0] {
            if next == start {
                let mut chain = Vec::new();
                let mut cur = n;
                while cur != start {
                    chain.push(cur);
                    cur = parent[cur.0].unwrap_or(start);
                }
                chain.reverse();
                let mut path = vec![start];
                path.extend(chain);
                path.push(start);
                return Some(path);
            }
            if !seen[next.0] {
                seen[next.0] = true;
                parent[next.0] = Some(n);
                queue.push_back(next);
            }
        }
    }
    None
}

fn back_edges(
    graph: &FlowGraph,
    entries: &[NodeId],
    successors: &[Vec<(ConnectionId, NodeId)>],
    capacity: usize,
) -> HashSet<ConnectionId> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let mut color = vec![WHITE; capacity];
    let mut back = HashSet::new();
    let roots = entries
        .iter()
        .copied()
        .chain(graph.nodes().map(|(id, _)| id));

    for root in roots {
        if color[root.0] != WHITE {
            continue;
        }
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        color[root.0] = GRAY;
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let edge = successors[node.0].get(top.1).copied();
            top.1 += 1;
            match edge {
                Some((cid, target)) => match color[target.0] {
                    WHITE => {
                        color[target.0] = GRAY;
                        stack.push((target, 0));
                    }
                    GRAY => {
                        back.insert(cid);
                    }
                    _ => {}
                },
                None => {
                    color[node.0] = BLACK;
                    stack.pop();
                }
            }
        }
    }
    back
}

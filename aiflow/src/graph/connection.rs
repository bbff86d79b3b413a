//! Directed links between an output pin and an input pin.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Stable identity of a connection; ids follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub usize);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// `(source, output pin) -> (target, input pin)`; pins are indices into the
/// node's declared outputs and inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: NodeId,
    pub source_pin: usize,
    pub target: NodeId,
    pub target_pin: usize,
}

//! Connection model for the dataflow graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a specific port on a specific node.
///
/// Every node has exactly one output port (index 0); input ports are
/// indexed 0..arity.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortId {
    pub node_id: Uuid,
    pub port: usize,
}

impl PortId {
    pub fn new(node_id: Uuid, port: usize) -> Self {
        Self { node_id, port }
    }
}

/// A directed edge from one node's output port to another node's input port.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: Uuid,
    /// Source port (output).
    pub from: PortId,
    /// Destination port (input).
    pub to: PortId,
}

impl Connection {
    pub fn new(from: PortId, to: PortId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
        }
    }
}

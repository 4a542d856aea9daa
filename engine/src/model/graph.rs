//! Graph store: nodes, edges, and the structural edits over them.
//!
//! The store enforces the structural invariants on every edit: at most one
//! incoming connection per input port, no out-of-range ports, and no cycles.
//! A failed edit leaves the store untouched.

use std::collections::HashMap;

use log::debug;
use uuid::Uuid;

use crate::error::GraphError;
use crate::model::connection::{Connection, PortId};
use crate::model::graph_analysis::would_create_cycle;
use crate::model::matrix::Matrix;
use crate::model::node::{Node, NodeKind};

#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    nodes: HashMap<Uuid, Node>,
    connections: Vec<Connection>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: Uuid) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The connection feeding a specific input port, if any.
    pub fn input_connection(&self, to: PortId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.to == to)
    }

    /// All connections leaving a node's output port (fan-out).
    pub fn output_connections(&self, node_id: Uuid) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.from.node_id == node_id)
    }

    pub(crate) fn add_node(&mut self, node: Node) -> Uuid {
        let id = node.id;
        debug!("add node {} ({})", id, node.name);
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and every connection touching it.
    pub(crate) fn remove_node(&mut self, id: Uuid) -> Result<Node, GraphError> {
        let node = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
        self.connections
            .retain(|c| c.from.node_id != id && c.to.node_id != id);
        debug!("removed node {} ({})", id, node.name);
        Ok(node)
    }

    /// Add an edge from `src`'s output to `dst`'s input port `dst_port`.
    ///
    /// Validation order: node existence, port range, port occupancy, then
    /// the cycle check (reachability from `dst` back to `src`). Nothing is
    /// committed unless every check passes.
    pub(crate) fn connect(
        &mut self,
        src: Uuid,
        dst: Uuid,
        dst_port: usize,
    ) -> Result<Uuid, GraphError> {
        if !self.contains(src) {
            return Err(GraphError::NodeNotFound(src));
        }
        let dst_node = self.node(dst).ok_or(GraphError::NodeNotFound(dst))?;
        if dst_port >= dst_node.input_count() {
            return Err(GraphError::InvalidPort {
                node: dst,
                port: dst_port,
            });
        }
        let to = PortId::new(dst, dst_port);
        if self.input_connection(to).is_some() {
            return Err(GraphError::PortOccupied {
                node: dst,
                port: dst_port,
            });
        }
        if would_create_cycle(self, src, dst) {
            return Err(GraphError::CycleDetected);
        }
        let conn = Connection::new(PortId::new(src, 0), to);
        let conn_id = conn.id;
        debug!("connect {} -> {}:{}", src, dst, dst_port);
        self.connections.push(conn);
        Ok(conn_id)
    }

    /// Remove the edge into `dst_port` of `dst`. No-op when unconnected.
    pub(crate) fn disconnect(
        &mut self,
        dst: Uuid,
        dst_port: usize,
    ) -> Result<Option<Connection>, GraphError> {
        if !self.contains(dst) {
            return Err(GraphError::NodeNotFound(dst));
        }
        let to = PortId::new(dst, dst_port);
        let index = self.connections.iter().position(|c| c.to == to);
        Ok(index.map(|i| {
            let conn = self.connections.remove(i);
            debug!("disconnect {}:{}", dst, dst_port);
            conn
        }))
    }

    /// Replace a data node's literal matrix.
    pub(crate) fn set_literal(&mut self, id: Uuid, value: Matrix) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        match &mut node.kind {
            NodeKind::Data { value: literal } => {
                *literal = value;
                Ok(())
            }
            NodeKind::Operator { .. } => Err(GraphError::NotADataNode(id)),
        }
    }

    pub(crate) fn set_name(&mut self, id: Uuid, name: &str) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.name = name.to_string();
        Ok(())
    }
}

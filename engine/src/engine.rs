//! MatrixEngine — the sole mutation and query surface for collaborators.
//!
//! Every edit validates structure, marks the affected subgraph dirty, and
//! runs an evaluation pass to completion on the calling thread before
//! returning. Collaborators (canvas, inspector, sidebar) never reach node
//! internals: they edit through this API and read records back out.

use log::debug;
use uuid::Uuid;

use crate::error::GraphError;
use crate::evaluation::cache::ResultCache;
use crate::evaluation::record::EvaluationRecord;
use crate::evaluation::scheduler;
use crate::model::connection::Connection;
use crate::model::graph::GraphStore;
use crate::model::graph_analysis::downstream_of;
use crate::model::matrix::{Matrix, Shape};
use crate::model::node::{Node, NodeKind, OperatorKind};
use crate::model::snapshot::GraphSnapshot;

#[derive(Default)]
pub struct MatrixEngine {
    store: GraphStore,
    cache: ResultCache,
}

impl MatrixEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Edit API ---

    /// Add a data node holding a literal matrix. Always succeeds.
    pub fn add_data_node(&mut self, name: &str, value: Matrix) -> Uuid {
        let id = self.store.add_node(Node::data(name, value));
        self.cache.insert_unset(id);
        self.run_pass();
        id
    }

    /// Add an operator node. Always succeeds; with no inputs connected it
    /// settles as a missing-input error until wired up.
    pub fn add_operator_node(&mut self, name: &str, op: OperatorKind) -> Uuid {
        let id = self.store.add_node(Node::operator(name, op));
        self.cache.insert_unset(id);
        self.run_pass();
        id
    }

    /// Remove a node, every connection touching it, and its record.
    /// Consumers of its output are left dirty and recompute immediately
    /// (typically to a missing-input error).
    pub fn remove_node(&mut self, id: Uuid) -> Result<(), GraphError> {
        if !self.store.contains(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let affected = downstream_of(&self.store, id);
        self.store.remove_node(id)?;
        self.cache.remove(id);
        for node in affected {
            self.cache.mark_dirty(node);
        }
        self.run_pass();
        Ok(())
    }

    /// Connect `src`'s output to `dst`'s input port `dst_port`.
    /// Returns the new connection's id.
    pub fn connect(&mut self, src: Uuid, dst: Uuid, dst_port: usize) -> Result<Uuid, GraphError> {
        let conn_id = self.store.connect(src, dst, dst_port)?;
        self.mark_dirty_from(dst);
        self.run_pass();
        Ok(conn_id)
    }

    /// Remove the connection into `dst`'s input port, if any.
    pub fn disconnect(&mut self, dst: Uuid, dst_port: usize) -> Result<(), GraphError> {
        let removed = self.store.disconnect(dst, dst_port)?;
        if removed.is_some() {
            self.mark_dirty_from(dst);
            self.run_pass();
        }
        Ok(())
    }

    /// Replace a data node's literal matrix.
    pub fn set_literal_value(&mut self, id: Uuid, value: Matrix) -> Result<(), GraphError> {
        self.store.set_literal(id, value)?;
        self.mark_dirty_from(id);
        self.run_pass();
        Ok(())
    }

    /// Rename a node. Names are labels, not inputs: nothing recomputes.
    pub fn set_node_name(&mut self, id: Uuid, name: &str) -> Result<(), GraphError> {
        self.store.set_name(id, name)
    }

    // --- Query API ---

    /// The cached evaluation record. Never fails: unknown nodes read as
    /// `Unset`.
    pub fn evaluation_record(&self, id: Uuid) -> EvaluationRecord {
        self.cache.get(id)
    }

    /// Shape of the node's current output value, when it has one.
    pub fn output_shape(&self, id: Uuid) -> Option<Shape> {
        self.cache.get(id).shape()
    }

    /// Every node reachable forward from `id`.
    pub fn downstream_of(&self, id: Uuid) -> Vec<Uuid> {
        downstream_of(&self.store, id)
    }

    pub fn node(&self, id: Uuid) -> Option<&Node> {
        self.store.node(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.store.nodes()
    }

    pub fn connections(&self) -> &[Connection] {
        self.store.connections()
    }

    // --- Persistence boundary ---

    /// Capture structure and literals; records are derived and not included.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.store)
    }

    /// Rebuild an engine from a snapshot, re-validating structure edge by
    /// edge, then evaluate everything once. A restored engine matches one
    /// built by replaying the original edits.
    pub fn restore(snapshot: GraphSnapshot) -> Result<Self, GraphError> {
        let mut engine = Self::new();
        for node in &snapshot.nodes {
            let built = match node.op {
                Some(op) => Node::operator_with_id(node.id, &node.name, op),
                None => {
                    let literal = snapshot
                        .literals
                        .iter()
                        .find(|l| l.node == node.id)
                        .ok_or_else(|| {
                            GraphError::Snapshot(format!("data node {} has no literal", node.id))
                        })?;
                    Node::data_with_id(node.id, &node.name, literal.value.clone())
                }
            };
            engine.store.add_node(built);
            engine.cache.insert_unset(node.id);
        }
        for literal in &snapshot.literals {
            let node = engine
                .store
                .node(literal.node)
                .ok_or_else(|| GraphError::Snapshot(format!("unknown node {}", literal.node)))?;
            if !matches!(node.kind, NodeKind::Data { .. }) {
                return Err(GraphError::Snapshot(format!(
                    "literal attached to operator node {}",
                    literal.node
                )));
            }
        }
        for edge in &snapshot.edges {
            engine.store.connect(edge.from, edge.to, edge.to_port)?;
        }
        engine.run_pass();
        Ok(engine)
    }

    // --- Internals ---

    /// Dirty `id` and everything reachable forward from it.
    fn mark_dirty_from(&mut self, id: Uuid) {
        self.cache.mark_dirty(id);
        for node in downstream_of(&self.store, id) {
            self.cache.mark_dirty(node);
        }
    }

    fn run_pass(&mut self) {
        debug!("running evaluation pass");
        scheduler::evaluate(&self.store, &mut self.cache);
    }
}

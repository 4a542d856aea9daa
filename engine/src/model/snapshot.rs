//! Serializable snapshot of the graph for the persistence boundary.
//!
//! The snapshot carries structure and literals only — evaluation records are
//! derived state and are rebuilt on restore. The exact wire encoding is owned
//! by the persistence collaborator; JSON helpers are provided for
//! convenience.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::graph::GraphStore;
use crate::model::matrix::Matrix;
use crate::model::node::{NodeKind, OperatorKind};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnapshotNode {
    pub id: Uuid,
    pub name: String,
    /// `None` marks a data node; its matrix lives in `literals`.
    pub op: Option<OperatorKind>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnapshotEdge {
    pub from: Uuid,
    pub to: Uuid,
    pub to_port: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnapshotLiteral {
    pub node: Uuid,
    pub value: Matrix,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
    pub literals: Vec<SnapshotLiteral>,
}

impl GraphSnapshot {
    /// Capture the current structure of a store.
    pub(crate) fn capture(store: &GraphStore) -> Self {
        let mut nodes: Vec<SnapshotNode> = Vec::with_capacity(store.node_count());
        let mut literals = Vec::new();
        for node in store.nodes() {
            match &node.kind {
                NodeKind::Data { value } => {
                    nodes.push(SnapshotNode {
                        id: node.id,
                        name: node.name.clone(),
                        op: None,
                    });
                    literals.push(SnapshotLiteral {
                        node: node.id,
                        value: value.clone(),
                    });
                }
                NodeKind::Operator { op } => {
                    nodes.push(SnapshotNode {
                        id: node.id,
                        name: node.name.clone(),
                        op: Some(*op),
                    });
                }
            }
        }
        // Deterministic output regardless of map iteration order.
        nodes.sort_by_key(|n| n.id);
        literals.sort_by_key(|l| l.node);

        let edges = store
            .connections()
            .iter()
            .map(|c| SnapshotEdge {
                from: c.from.node_id,
                to: c.to.node_id,
                to_port: c.to.port,
            })
            .collect();

        Self {
            nodes,
            edges,
            literals,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! Error taxonomy for the evaluation engine.
//!
//! `GraphError` covers structural edit failures: they are returned
//! synchronously from the edit API and never enter the result cache.
//! `EvalError` covers evaluation outcomes: they are data, stored in a node's
//! evaluation record and propagated downstream, never thrown.

use thiserror::Error;
use uuid::Uuid;

use crate::model::matrix::Shape;
use crate::model::node::OperatorKind;

/// Edit-time failures. The store is left exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(Uuid),
    #[error("port {port} is out of range for node {node}")]
    InvalidPort { node: Uuid, port: usize },
    #[error("input port {port} of node {node} already has a connection")]
    PortOccupied { node: Uuid, port: usize },
    #[error("connection would create a cycle")]
    CycleDetected,
    #[error("node {0} is not a data node")]
    NotADataNode(Uuid),
    #[error("snapshot is inconsistent: {0}")]
    Snapshot(String),
}

/// Evaluation failures, cached per node and propagated to descendants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("input port {port} has no connection")]
    MissingInput { port: usize },
    #[error("{op} is not defined for input shapes [{}]", fmt_shapes(.inputs))]
    ShapeMismatch {
        op: OperatorKind,
        inputs: Vec<Shape>,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("matrix is singular within tolerance")]
    SingularMatrix,
    #[error("decomposition did not converge to a real result")]
    NoConvergence,
    #[error("result contains non-finite values")]
    NonFiniteResult,
    #[error("upstream node {origin} failed: {cause}")]
    Upstream { origin: Uuid, cause: Box<EvalError> },
}

fn fmt_shapes(shapes: &[Shape]) -> String {
    shapes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

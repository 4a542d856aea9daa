//! Graph node model: literal data holders and matrix operators.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::matrix::Matrix;

/// The closed set of operator node kinds.
///
/// Adding an operator means adding one variant here plus one match arm in
/// the shape validator and one in the kernel library.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    // Arithmetic (2 inputs)
    Add,
    Subtract,
    ScalarMultiply,
    ElementMultiply,
    ElementDivide,
    // Linear algebra (2 inputs)
    DotProduct,
    CrossProduct,
    Solve,
    // Single-input operations
    Transpose,
    Inverse,
    PseudoInverse,
    Determinant,
    Trace,
    Rank,
    Eigenvalues,
    Eigenvectors,
    Svd,
    // Terminal pass-through
    ResultDisplay,
}

impl OperatorKind {
    /// Number of input ports this operator exposes.
    pub fn arity(&self) -> usize {
        use OperatorKind::*;
        match self {
            Add | Subtract | ScalarMultiply | ElementMultiply | ElementDivide | DotProduct
            | CrossProduct | Solve => 2,
            Transpose | Inverse | PseudoInverse | Determinant | Trace | Rank | Eigenvalues
            | Eigenvectors | Svd | ResultDisplay => 1,
        }
    }

    /// Name shown in menus and inspectors.
    pub fn display_name(&self) -> &'static str {
        use OperatorKind::*;
        match self {
            Add => "Add",
            Subtract => "Subtract",
            ScalarMultiply => "Scalar Multiply",
            ElementMultiply => "Element Multiply",
            ElementDivide => "Element Divide",
            DotProduct => "Dot Product",
            CrossProduct => "Cross Product",
            Solve => "Solve (Ax=B)",
            Transpose => "Transpose",
            Inverse => "Inverse",
            PseudoInverse => "Pseudo-Inverse",
            Determinant => "Determinant",
            Trace => "Trace",
            Rank => "Rank",
            Eigenvalues => "Eigenvalues",
            Eigenvectors => "Eigenvectors",
            Svd => "SVD (Singular Values)",
            ResultDisplay => "Result Display",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What a node is: a literal matrix holder or an operator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "node_kind", rename_all = "snake_case")]
pub enum NodeKind {
    Data { value: Matrix },
    Operator { op: OperatorKind },
}

/// A unit of the dataflow graph.
///
/// Data nodes own a literal matrix set by external edits. Operator nodes
/// compute; their output lives in the result cache, never on the node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: Uuid,
    pub name: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn data(name: &str, value: Matrix) -> Self {
        Self::data_with_id(Uuid::new_v4(), name, value)
    }

    pub fn data_with_id(id: Uuid, name: &str, value: Matrix) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: NodeKind::Data { value },
        }
    }

    pub fn operator(name: &str, op: OperatorKind) -> Self {
        Self::operator_with_id(Uuid::new_v4(), name, op)
    }

    pub fn operator_with_id(id: Uuid, name: &str, op: OperatorKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: NodeKind::Operator { op },
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self.kind, NodeKind::Data { .. })
    }

    /// The operator of an operator node.
    pub fn operator_kind(&self) -> Option<OperatorKind> {
        match &self.kind {
            NodeKind::Operator { op } => Some(*op),
            NodeKind::Data { .. } => None,
        }
    }

    /// The literal of a data node.
    pub fn literal(&self) -> Option<&Matrix> {
        match &self.kind {
            NodeKind::Data { value } => Some(value),
            NodeKind::Operator { .. } => None,
        }
    }

    /// Number of input ports (0 for data nodes).
    pub fn input_count(&self) -> usize {
        match &self.kind {
            NodeKind::Data { .. } => 0,
            NodeKind::Operator { op } => op.arity(),
        }
    }
}

//! Dataflow evaluation engine for a node-based matrix calculator.
//!
//! The engine stores a directed acyclic graph of matrix-valued nodes,
//! validates every structural edit, recomputes only the affected subgraph
//! in topological order, and caches each node's value or error for display.
//! Editing surfaces and inspectors are external collaborators: they mutate
//! through [`MatrixEngine`]'s edit API and read evaluation records back.

pub mod error;
pub mod evaluation;
pub mod model;

mod engine;

pub use engine::MatrixEngine;
pub use error::{EvalError, GraphError};
pub use evaluation::record::{EvalResult, EvaluationRecord};
pub use model::connection::{Connection, PortId};
pub use model::matrix::{Matrix, MatrixError, Shape};
pub use model::node::{Node, NodeKind, OperatorKind};
pub use model::snapshot::GraphSnapshot;

//! Evaluation scheduler — recomputes the dirty subgraph in dependency order.
//!
//! A node is picked up only once every node feeding it is terminal for this
//! pass (clean with a value or an error), so the pass is a single Kahn walk
//! over the dirty set. Ancestors of the dirty set are never touched, and a
//! clean sibling branch keeps its cached record bit-for-bit.

use std::collections::HashSet;

use log::{debug, trace};
use uuid::Uuid;

use crate::error::EvalError;
use crate::evaluation::cache::ResultCache;
use crate::evaluation::record::EvalResult;
use crate::evaluation::{kernels, validator};
use crate::model::connection::PortId;
use crate::model::graph::GraphStore;
use crate::model::graph_analysis::topological_sort;
use crate::model::matrix::Matrix;
use crate::model::node::NodeKind;

/// Run one evaluation pass: every dirty node is recomputed exactly once, in
/// topological order, and settles clean.
pub(crate) fn evaluate(store: &GraphStore, cache: &mut ResultCache) {
    let dirty: HashSet<Uuid> = cache
        .dirty_nodes()
        .into_iter()
        .filter(|id| store.contains(*id))
        .collect();
    if dirty.is_empty() {
        return;
    }

    let order = topological_sort(store, &dirty);
    debug!("evaluation pass over {} dirty nodes", order.len());

    for id in order {
        let result = evaluate_node(store, cache, id);
        trace!("node {} -> {:?}", id, result);
        cache.write(id, result);
    }
}

fn evaluate_node(store: &GraphStore, cache: &ResultCache, id: Uuid) -> EvalResult {
    let Some(node) = store.node(id) else {
        // Filtered above; records of removed nodes are dropped with them.
        return EvalResult::Unset;
    };

    let op = match &node.kind {
        // Data nodes have no pending state: the literal is the value.
        NodeKind::Data { value } => return EvalResult::Value(value.clone()),
        NodeKind::Operator { op } => *op,
    };

    let mut inputs: Vec<Matrix> = Vec::with_capacity(op.arity());
    for port in 0..op.arity() {
        let Some(conn) = store.input_connection(PortId::new(id, port)) else {
            return EvalResult::Error(EvalError::MissingInput { port });
        };
        let source = conn.from.node_id;
        match cache.record(source).map(|r| &r.result) {
            Some(EvalResult::Value(value)) => inputs.push(value.clone()),
            // An errored input short-circuits the node: no validation, no
            // kernel call, just verbatim propagation.
            Some(EvalResult::Error(error)) => {
                return EvalResult::Error(propagate(source, error));
            }
            Some(EvalResult::Unset) | None => {
                return EvalResult::Error(EvalError::MissingInput { port });
            }
        }
    }

    let shapes: Vec<_> = inputs.iter().map(|m| m.shape()).collect();
    if let Err(error) = validator::output_shape(op, &shapes) {
        return EvalResult::Error(error);
    }

    let refs: Vec<&Matrix> = inputs.iter().collect();
    match kernels::execute(op, &refs) {
        Ok(value) => EvalResult::Value(value),
        Err(error) => EvalResult::Error(error),
    }
}

/// Wrap an input's failure for its consumer, keeping the original origin:
/// a chain of descendants all report the node where the error arose.
fn propagate(source: Uuid, error: &EvalError) -> EvalError {
    match error {
        EvalError::Upstream { .. } => error.clone(),
        other => EvalError::Upstream {
            origin: source,
            cause: Box::new(other.clone()),
        },
    }
}

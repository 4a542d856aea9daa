//! Evaluation record — the cached output state of a single node.

use crate::error::EvalError;
use crate::model::matrix::{Matrix, Shape};

/// What the last evaluation of a node produced.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum EvalResult {
    /// Never evaluated.
    #[default]
    Unset,
    Value(Matrix),
    Error(EvalError),
}

/// Per-node cached state, owned exclusively by the engine.
///
/// A record starts `Unset`/dirty, turns dirty whenever any upstream value,
/// the node's own literal, or its incoming wiring changes, and settles with
/// `dirty == false` once the scheduler recomputes it.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationRecord {
    pub dirty: bool,
    pub result: EvalResult,
}

impl Default for EvaluationRecord {
    fn default() -> Self {
        Self {
            dirty: true,
            result: EvalResult::Unset,
        }
    }
}

impl EvaluationRecord {
    pub fn is_unset(&self) -> bool {
        matches!(self.result, EvalResult::Unset)
    }

    pub fn value(&self) -> Option<&Matrix> {
        match &self.result {
            EvalResult::Value(m) => Some(m),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EvalError> {
        match &self.result {
            EvalResult::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Shape of the cached value, when one exists.
    pub fn shape(&self) -> Option<Shape> {
        self.value().map(|m| m.shape())
    }
}

//! Result cache — the single source of truth for computed outputs.

use std::collections::HashMap;

use uuid::Uuid;

use crate::evaluation::record::{EvalResult, EvaluationRecord};

/// Keyed store `NodeId -> EvaluationRecord`.
///
/// Records live exactly as long as their node: inserted on node creation,
/// dropped on node removal, never evicted in between.
#[derive(Clone, Debug, Default)]
pub struct ResultCache {
    records: HashMap<Uuid, EvaluationRecord>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never fails: unknown or never-evaluated nodes read as `Unset`.
    pub fn get(&self, id: Uuid) -> EvaluationRecord {
        self.records.get(&id).cloned().unwrap_or_default()
    }

    pub fn is_dirty(&self, id: Uuid) -> bool {
        self.records.get(&id).map(|r| r.dirty).unwrap_or(false)
    }

    pub(crate) fn record(&self, id: Uuid) -> Option<&EvaluationRecord> {
        self.records.get(&id)
    }

    pub(crate) fn insert_unset(&mut self, id: Uuid) {
        self.records.insert(id, EvaluationRecord::default());
    }

    pub(crate) fn remove(&mut self, id: Uuid) {
        self.records.remove(&id);
    }

    /// Flag a node stale, keeping its previous result until recomputation.
    pub(crate) fn mark_dirty(&mut self, id: Uuid) {
        if let Some(record) = self.records.get_mut(&id) {
            record.dirty = true;
        }
    }

    /// Settle a node with a fresh result.
    pub(crate) fn write(&mut self, id: Uuid, result: EvalResult) {
        self.records.insert(
            id,
            EvaluationRecord {
                dirty: false,
                result,
            },
        );
    }

    pub(crate) fn dirty_nodes(&self) -> Vec<Uuid> {
        self.records
            .iter()
            .filter(|(_, r)| r.dirty)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::matrix::Matrix;

    #[test]
    fn test_unknown_node_reads_as_unset() {
        let cache = ResultCache::new();
        let record = cache.get(Uuid::new_v4());
        assert!(record.is_unset());
        assert!(record.dirty);
    }

    #[test]
    fn test_mark_dirty_keeps_previous_result() {
        let mut cache = ResultCache::new();
        let id = Uuid::new_v4();
        cache.insert_unset(id);
        let value = Matrix::identity(2).unwrap();
        cache.write(id, EvalResult::Value(value.clone()));
        cache.mark_dirty(id);
        let record = cache.get(id);
        assert!(record.dirty);
        assert_eq!(record.value(), Some(&value));
    }
}

//! Graph analysis utilities: cycle checks, reachability, topological order.
//!
//! These are the read-only traversals the store and scheduler build on.
//! All of them iterate the edge list keyed by node id; nodes never hold
//! references to each other.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::model::graph::GraphStore;

/// Check if adding an edge `src -> dst` would create a cycle.
///
/// BFS forward from `dst`: if `src` is reachable (including `src == dst`),
/// the new edge would close a loop.
pub fn would_create_cycle(store: &GraphStore, src: Uuid, dst: Uuid) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(dst);

    while let Some(current) = queue.pop_front() {
        if current == src {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        for conn in store.output_connections(current) {
            queue.push_back(conn.to.node_id);
        }
    }
    false
}

/// Every node reachable forward from `id`, excluding `id` itself.
pub fn downstream_of(store: &GraphStore, id: Uuid) -> Vec<Uuid> {
    let mut downstream = Vec::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<Uuid> = store.output_connections(id).map(|c| c.to.node_id).collect();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        downstream.push(current);
        for conn in store.output_connections(current) {
            queue.push_back(conn.to.node_id);
        }
    }
    downstream
}

/// Topologically order the induced subgraph over `subset` (Kahn's algorithm).
///
/// Only edges with both endpoints in `subset` constrain the order; producers
/// outside the subset are already terminal and impose nothing. Ties are
/// broken by node id so the order is deterministic. The store's acyclicity
/// invariant guarantees every member is emitted.
pub fn topological_sort(store: &GraphStore, subset: &HashSet<Uuid>) -> Vec<Uuid> {
    let mut in_degree: HashMap<Uuid, usize> = subset.iter().map(|&id| (id, 0)).collect();
    for conn in store.connections() {
        if subset.contains(&conn.from.node_id) && subset.contains(&conn.to.node_id) {
            *in_degree.get_mut(&conn.to.node_id).unwrap() += 1;
        }
    }

    let mut ready: BTreeSet<Uuid> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut sorted = Vec::with_capacity(subset.len());
    while let Some(node) = ready.pop_first() {
        sorted.push(node);
        for conn in store.output_connections(node) {
            if let Some(deg) = in_degree.get_mut(&conn.to.node_id) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(conn.to.node_id);
                }
            }
        }
    }

    debug_assert_eq!(sorted.len(), subset.len(), "store must stay acyclic");
    sorted
}

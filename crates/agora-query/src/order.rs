use std::cmp::Ordering;
use std::collections::HashSet;

use agora_links::IndexedLink;

use crate::types::OrderingMode;

/// Sort a base's edges into the replica's total order.
pub fn sort_edges(edges: &mut [IndexedLink], mode: OrderingMode) {
    match mode {
        OrderingMode::Causal => edges.sort_by(causal_cmp),
        OrderingMode::Arrival => edges.sort_by_key(|e| e.arrival),
    }
}

/// Keep only the first edge per target in already-sorted `edges`.
///
/// Replicas that create the same content concurrently each link it; after
/// convergence every replica keeps the same winner, so an address names one
/// position in the order and cursors stay unambiguous.
pub fn dedup_targets(edges: &mut Vec<IndexedLink>) {
    let mut seen = HashSet::with_capacity(edges.len());
    edges.retain(|e| seen.insert(e.link.target));
}

fn causal_cmp(a: &IndexedLink, b: &IndexedLink) -> Ordering {
    let (a, b) = (&a.link, &b.link);
    a.stamp
        .cmp(&b.stamp)
        .then_with(|| a.origin.cmp(&b.origin))
        .then(a.sequence.cmp(&b.sequence))
        // Unreachable for a conflict-free index; keeps the sort total anyway.
        .then_with(|| a.target.cmp(&b.target))
}

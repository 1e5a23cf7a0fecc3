//! In-memory link index.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use agora_types::AgentId;
use tracing::debug;

use crate::error::{LinkError, LinkResult};
use crate::link::{IndexedLink, Link, LinkId};
use crate::traits::LinkIndex;

#[derive(Default)]
struct IndexState {
    /// Edges per base, in arrival order.
    by_base: HashMap<String, Vec<IndexedLink>>,
    /// Link id -> (base, position in `by_base[base]`).
    by_id: HashMap<LinkId, (String, usize)>,
    /// Sequence slots claimed by each origin.
    by_slot: HashMap<(AgentId, u64), LinkId>,
    next_arrival: u64,
}

/// An in-memory implementation of [`LinkIndex`].
///
/// All state lives behind one `RwLock`, so an insert and its arrival index
/// are assigned atomically.
pub struct InMemoryLinkIndex {
    state: RwLock<IndexState>,
}

impl InMemoryLinkIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
        }
    }

    /// Total number of links across all bases.
    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every base with at least one link, sorted.
    pub fn bases(&self) -> Vec<String> {
        let state = self.state.read().expect("lock poisoned");
        let set: BTreeSet<&String> = state.by_base.keys().collect();
        set.into_iter().cloned().collect()
    }

    /// Every link, in local arrival order.
    pub fn all_links(&self) -> Vec<IndexedLink> {
        let state = self.state.read().expect("lock poisoned");
        let mut all: Vec<IndexedLink> = state.by_base.values().flatten().cloned().collect();
        all.sort_by_key(|l| l.arrival);
        all
    }

    /// Highest sequence number seen from `origin`, if any.
    pub fn max_sequence(&self, origin: &AgentId) -> Option<u64> {
        let state = self.state.read().expect("lock poisoned");
        state
            .by_slot
            .keys()
            .filter(|(o, _)| o == origin)
            .map(|(_, seq)| *seq)
            .max()
    }
}

impl Default for InMemoryLinkIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkIndex for InMemoryLinkIndex {
    fn add_link(&self, link: &Link) -> LinkResult<bool> {
        if link.base.is_empty() {
            return Err(LinkError::EmptyBase);
        }
        let id = link.id();
        let mut state = self.state.write().expect("lock poisoned");

        if state.by_id.contains_key(&id) {
            return Ok(false);
        }
        let slot = (link.origin.clone(), link.sequence);
        if state.by_slot.contains_key(&slot) {
            return Err(LinkError::ConcurrentSequenceConflict {
                origin: link.origin.clone(),
                sequence: link.sequence,
            });
        }

        let arrival = state.next_arrival;
        state.next_arrival += 1;

        let edges = state.by_base.entry(link.base.clone()).or_default();
        let position = edges.len();
        edges.push(IndexedLink {
            link: link.clone(),
            arrival,
        });
        state.by_id.insert(id, (link.base.clone(), position));
        state.by_slot.insert(slot, id);

        debug!(
            %id,
            base = %link.base,
            target = %link.target.short(),
            origin = %link.origin,
            sequence = link.sequence,
            arrival,
            "link indexed"
        );
        Ok(true)
    }

    fn edges_for(&self, base: &str) -> LinkResult<Vec<IndexedLink>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state.by_base.get(base).cloned().unwrap_or_default())
    }

    fn get(&self, id: &LinkId) -> LinkResult<Option<Link>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .by_id
            .get(id)
            .and_then(|(base, pos)| state.by_base.get(base).and_then(|v| v.get(*pos)))
            .map(|indexed| indexed.link.clone()))
    }

    fn link_ids(&self) -> LinkResult<Vec<LinkId>> {
        let state = self.state.read().expect("lock poisoned");
        let mut ids: Vec<LinkId> = state.by_id.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryLinkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLinkIndex")
            .field("link_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{Address, TemporalAnchor};

    fn link(base: &str, target: &[u8], origin: &str, seq: u64) -> Link {
        Link {
            base: base.into(),
            target: Address::digest_of(target),
            sequence: seq,
            origin: AgentId::named(origin),
            stamp: TemporalAnchor::new(1000 + seq, 0, 1),
        }
    }

    fn edge_set(index: &InMemoryLinkIndex, base: &str) -> BTreeSet<LinkId> {
        index
            .edges_for(base)
            .unwrap()
            .iter()
            .map(|e| e.link.id())
            .collect()
    }

    #[test]
    fn add_and_list() {
        let index = InMemoryLinkIndex::new();
        assert!(index.add_link(&link("c1", b"p1", "alice", 1)).unwrap());
        assert!(index.add_link(&link("c1", b"p2", "alice", 2)).unwrap());
        assert!(index.add_link(&link("c2", b"p3", "alice", 3)).unwrap());

        assert_eq!(index.edges_for("c1").unwrap().len(), 2);
        assert_eq!(index.edges_for("c2").unwrap().len(), 1);
        assert_eq!(index.len(), 3);
        assert_eq!(index.bases(), vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let index = InMemoryLinkIndex::new();
        let l = link("c1", b"p1", "alice", 1);
        assert!(index.add_link(&l).unwrap());
        assert!(!index.add_link(&l).unwrap());
        assert_eq!(index.edges_for("c1").unwrap().len(), 1);
    }

    #[test]
    fn insertion_order_does_not_change_edge_set() {
        let links = vec![
            link("c1", b"p1", "alice", 1),
            link("c1", b"p2", "bob", 1),
            link("c1", b"p3", "alice", 2),
        ];
        let forward = InMemoryLinkIndex::new();
        for l in &links {
            forward.add_link(l).unwrap();
        }
        let backward = InMemoryLinkIndex::new();
        for l in links.iter().rev() {
            backward.add_link(l).unwrap();
            backward.add_link(l).unwrap();
        }
        assert_eq!(edge_set(&forward, "c1"), edge_set(&backward, "c1"));
    }

    #[test]
    fn arrival_records_first_observation() {
        let index = InMemoryLinkIndex::new();
        index.add_link(&link("c1", b"late", "alice", 2)).unwrap();
        index.add_link(&link("c1", b"early", "alice", 1)).unwrap();
        index.add_link(&link("c1", b"late", "alice", 2)).unwrap();

        let edges = index.edges_for("c1").unwrap();
        assert_eq!(edges[0].arrival, 0);
        assert_eq!(edges[0].link.sequence, 2);
        assert_eq!(edges[1].arrival, 1);
    }

    #[test]
    fn conflicting_sequence_slot_is_rejected() {
        let index = InMemoryLinkIndex::new();
        index.add_link(&link("c1", b"p1", "alice", 1)).unwrap();
        let err = index.add_link(&link("c1", b"other", "alice", 1)).unwrap_err();
        assert_eq!(
            err,
            LinkError::ConcurrentSequenceConflict {
                origin: AgentId::named("alice"),
                sequence: 1
            }
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn same_sequence_from_different_origins_is_fine() {
        let index = InMemoryLinkIndex::new();
        assert!(index.add_link(&link("c1", b"p1", "alice", 1)).unwrap());
        assert!(index.add_link(&link("c1", b"p1", "bob", 1)).unwrap());
        assert_eq!(index.edges_for("c1").unwrap().len(), 2);
    }

    #[test]
    fn empty_base_is_rejected() {
        let index = InMemoryLinkIndex::new();
        assert_eq!(
            index.add_link(&link("", b"p", "alice", 1)),
            Err(LinkError::EmptyBase)
        );
    }

    #[test]
    fn unknown_base_has_no_edges() {
        let index = InMemoryLinkIndex::new();
        assert!(index.edges_for("nowhere").unwrap().is_empty());
    }

    #[test]
    fn get_and_link_ids() {
        let index = InMemoryLinkIndex::new();
        let l = link("c1", b"p1", "alice", 1);
        index.add_link(&l).unwrap();
        assert_eq!(index.get(&l.id()).unwrap(), Some(l.clone()));
        assert!(index.contains(&l.id()).unwrap());
        assert_eq!(index.link_ids().unwrap(), vec![l.id()]);
    }

    #[test]
    fn max_sequence_per_origin() {
        let index = InMemoryLinkIndex::new();
        index.add_link(&link("c1", b"a", "alice", 1)).unwrap();
        index.add_link(&link("c1", b"b", "alice", 5)).unwrap();
        index.add_link(&link("c1", b"c", "bob", 9)).unwrap();
        assert_eq!(index.max_sequence(&AgentId::named("alice")), Some(5));
        assert_eq!(index.max_sequence(&AgentId::named("carol")), None);
    }

    #[test]
    fn all_links_in_arrival_order() {
        let index = InMemoryLinkIndex::new();
        index.add_link(&link("c2", b"a", "alice", 1)).unwrap();
        index.add_link(&link("c1", b"b", "alice", 2)).unwrap();
        index.add_link(&link("c2", b"c", "alice", 3)).unwrap();
        let arrivals: Vec<u64> = index.all_links().iter().map(|l| l.arrival).collect();
        assert_eq!(arrivals, vec![0, 1, 2]);
    }

    #[test]
    fn concurrent_inserts_assign_unique_arrivals() {
        use std::sync::Arc;
        use std::thread;

        let index = Arc::new(InMemoryLinkIndex::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for seq in 1..=25u64 {
                        let origin = format!("agent-{t}");
                        index
                            .add_link(&link("c1", format!("{t}-{seq}").as_bytes(), &origin, seq))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut arrivals: Vec<u64> = index
            .edges_for("c1")
            .unwrap()
            .iter()
            .map(|e| e.arrival)
            .collect();
        arrivals.sort();
        assert_eq!(arrivals, (0..100).collect::<Vec<u64>>());
    }
}

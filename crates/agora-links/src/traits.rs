use crate::error::LinkResult;
use crate::link::{IndexedLink, Link, LinkId};

/// Append-only edge store keyed by base.
///
/// Implementations must make `add_link` commutative and idempotent: applying
/// the same set of links in any order, with any number of duplicates, yields
/// the same edge set. Links are never removed.
pub trait LinkIndex: Send + Sync {
    /// Insert a link. Returns `true` if it was not present before.
    fn add_link(&self, link: &Link) -> LinkResult<bool>;

    /// All edges held locally for `base`, in local arrival order.
    fn edges_for(&self, base: &str) -> LinkResult<Vec<IndexedLink>>;

    /// Look up a link by id.
    fn get(&self, id: &LinkId) -> LinkResult<Option<Link>>;

    /// Check whether a link is held locally.
    fn contains(&self, id: &LinkId) -> LinkResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Ids of every link held locally, sorted.
    fn link_ids(&self) -> LinkResult<Vec<LinkId>>;
}

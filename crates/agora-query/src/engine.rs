//! The query engine.

use agora_crypto::base_anchor;
use agora_links::{IndexedLink, LinkIndex};
use agora_store::ContentStore;
use agora_types::Address;
use tracing::{debug, warn};

use crate::error::{QueryError, QueryResult};
use crate::order::{dedup_targets, sort_edges};
use crate::types::{MissingContentPolicy, PostsPage, QueryConfig, QueryOptions};

/// Read-only view over one replica's post store and link index.
///
/// Borrowing rather than owning keeps the engine free to construct per call;
/// the SDK builds one for every read.
pub struct QueryEngine<'a, S: ContentStore + ?Sized, L: LinkIndex + ?Sized> {
    store: &'a S,
    links: &'a L,
    config: QueryConfig,
}

impl<'a, S: ContentStore + ?Sized, L: LinkIndex + ?Sized> QueryEngine<'a, S, L> {
    pub fn new(store: &'a S, links: &'a L, config: QueryConfig) -> Self {
        Self {
            store,
            links,
            config,
        }
    }

    pub fn config(&self) -> QueryConfig {
        self.config
    }

    /// Edges of `base` in this replica's total order, one per target.
    pub fn ordered_edges(&self, base: &str) -> QueryResult<Vec<IndexedLink>> {
        let mut edges = self.links.edges_for(base)?;
        sort_edges(&mut edges, self.config.ordering);
        dedup_targets(&mut edges);
        Ok(edges)
    }

    /// `(anchor(base), target)` for every edge of `base`, in order.
    ///
    /// An unknown base yields an empty list.
    pub fn adjacency_list_for_base(&self, base: &str) -> QueryResult<Vec<(Address, Address)>> {
        let anchor = base_anchor(base);
        Ok(self
            .ordered_edges(base)?
            .into_iter()
            .map(|e| (anchor, e.link.target))
            .collect())
    }

    /// One page of the posts linked into `base`.
    ///
    /// The window starts strictly after `options.since` (or at the first
    /// edge) and covers at most `options.limit` edges. `more` reports whether
    /// edges remain after the window.
    pub fn all_for_base(&self, base: &str, options: &QueryOptions) -> QueryResult<PostsPage> {
        let edges = self.ordered_edges(base)?;

        let start = match options.since {
            None => 0,
            Some(since) => match edges.iter().position(|e| e.link.target == since) {
                Some(pos) => pos + 1,
                None => return Err(self.cursor_error(base, since)?),
            },
        };

        let remaining = edges.len().saturating_sub(start);
        let take = options
            .limit
            .map_or(remaining, |k| remaining.min(k as usize));
        let window = &edges[start..start + take];
        let more = start + take < edges.len();

        let mut page = PostsPage {
            posts: Vec::with_capacity(window.len()),
            more,
            unresolved: Vec::new(),
        };
        for edge in window {
            let target = edge.link.target;
            match self.store.get(&target)? {
                Some(post) => page
                    .posts
                    .push(post.with_address(target, edge.link.origin.clone())),
                None => match self.config.missing_content {
                    MissingContentPolicy::Error => return Err(QueryError::Unresolved(target)),
                    MissingContentPolicy::Omit => {
                        warn!(base, address = %target.short(), "linked post not stored locally, omitting");
                        page.unresolved.push(target);
                    }
                },
            }
        }

        debug!(
            base,
            start,
            returned = page.posts.len(),
            unresolved = page.unresolved.len(),
            more,
            "posts page"
        );
        Ok(page)
    }

    /// A cursor absent from the base's edges is `NotFound` when the post is
    /// stored here for this base (its link is still in flight), and
    /// `InvalidCursor` otherwise.
    fn cursor_error(&self, base: &str, since: Address) -> QueryResult<QueryError> {
        let known_here = self
            .store
            .get(&since)?
            .is_some_and(|post| post.base == base);
        Ok(if known_here {
            QueryError::NotFound(since)
        } else {
            QueryError::InvalidCursor {
                base: base.to_string(),
                since,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_links::{InMemoryLinkIndex, Link};
    use agora_store::{InMemoryContentStore, Post};
    use agora_types::{AgentId, TemporalAnchor};
    use proptest::prelude::*;

    const BASE: &str = "community1";

    fn post(title: &str, base: &str) -> Post {
        Post {
            title: title.into(),
            details: "details".into(),
            post_type: "a type".into(),
            announcement: false,
            timestamp: String::new(),
            base: base.into(),
        }
    }

    /// Store `n` posts in BASE and link each, alternating two origins.
    fn populated(n: u64) -> (InMemoryContentStore, InMemoryLinkIndex, Vec<Address>) {
        let store = InMemoryContentStore::new();
        let links = InMemoryLinkIndex::new();
        let mut addresses = Vec::new();
        for i in 0..n {
            let address = store.put(&post(&format!("post {i}"), BASE)).unwrap();
            let origin = if i % 2 == 0 { "alice" } else { "bob" };
            links
                .add_link(&Link {
                    base: BASE.into(),
                    target: address,
                    sequence: i / 2 + 1,
                    origin: AgentId::named(origin),
                    stamp: TemporalAnchor::new(1000 + i, 0, (i % 2) as u16),
                })
                .unwrap();
            addresses.push(address);
        }
        (store, links, addresses)
    }

    fn engine<'a>(
        store: &'a InMemoryContentStore,
        links: &'a InMemoryLinkIndex,
    ) -> QueryEngine<'a, InMemoryContentStore, InMemoryLinkIndex> {
        QueryEngine::new(store, links, QueryConfig::default())
    }

    // -----------------------------------------------------------------------
    // Adjacency
    // -----------------------------------------------------------------------

    #[test]
    fn adjacency_pairs_share_the_base_anchor() {
        let (store, links, addresses) = populated(4);
        let adjacency = engine(&store, &links).adjacency_list_for_base(BASE).unwrap();
        assert_eq!(adjacency.len(), 4);
        assert!(adjacency.iter().all(|(from, _)| *from == base_anchor(BASE)));
        let targets: Vec<Address> = adjacency.iter().map(|(_, to)| *to).collect();
        assert_eq!(targets, addresses);
    }

    #[test]
    fn duplicate_edges_to_one_target_page_as_one_post() {
        let (store, links, mut addresses) = populated(3);
        let repeated = addresses[1];
        links
            .add_link(&Link {
                base: BASE.into(),
                target: repeated,
                sequence: 9,
                origin: AgentId::named("carol"),
                stamp: TemporalAnchor::new(5000, 0, 3),
            })
            .unwrap();
        let extra = store.put(&post("after the repeat", BASE)).unwrap();
        links
            .add_link(&Link {
                base: BASE.into(),
                target: extra,
                sequence: 10,
                origin: AgentId::named("carol"),
                stamp: TemporalAnchor::new(6000, 0, 3),
            })
            .unwrap();
        addresses.push(extra);

        let engine = engine(&store, &links);
        let full = engine.all_for_base(BASE, &QueryOptions::all()).unwrap();
        assert_eq!(full.addresses(), addresses);
        assert_eq!(engine.adjacency_list_for_base(BASE).unwrap().len(), 4);

        for k in 1..=addresses.len() {
            let head = engine.all_for_base(BASE, &QueryOptions::all().limit(k as u32)).unwrap();
            let tail = engine
                .all_for_base(BASE, &QueryOptions::all().since(addresses[k - 1]))
                .unwrap();
            let mut joined = head.addresses();
            joined.extend(tail.addresses());
            assert_eq!(joined, addresses, "k = {k}");
            assert_eq!(head.more, k < addresses.len());
        }
    }

    #[test]
    fn unknown_base_is_empty_not_an_error() {
        let (store, links, _) = populated(2);
        let engine = engine(&store, &links);
        assert!(engine.adjacency_list_for_base("nowhere").unwrap().is_empty());
        let page = engine.all_for_base("nowhere", &QueryOptions::all()).unwrap();
        assert!(page.posts.is_empty());
        assert!(!page.more);
    }

    // -----------------------------------------------------------------------
    // Pagination
    // -----------------------------------------------------------------------

    #[test]
    fn full_listing_in_order() {
        let (store, links, addresses) = populated(10);
        let page = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all())
            .unwrap();
        assert_eq!(page.addresses(), addresses);
        assert!(!page.more);
        assert_eq!(page.posts[1].author, AgentId::named("bob"));
    }

    #[test]
    fn limit_then_since_covers_the_rest() {
        let (store, links, addresses) = populated(10);
        let engine = engine(&store, &links);

        let first = engine.all_for_base(BASE, &QueryOptions::all().limit(7)).unwrap();
        assert_eq!(first.addresses(), addresses[..7].to_vec());
        assert!(first.more);

        let cursor = first.last_address().unwrap();
        let rest = engine
            .all_for_base(BASE, &QueryOptions::all().since(cursor))
            .unwrap();
        assert_eq!(rest.addresses(), addresses[7..].to_vec());
        assert!(!rest.more);
    }

    #[test]
    fn limit_zero_returns_nothing_but_reports_more() {
        let (store, links, _) = populated(3);
        let page = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().limit(0))
            .unwrap();
        assert!(page.posts.is_empty());
        assert!(page.more);
    }

    #[test]
    fn limit_larger_than_base() {
        let (store, links, _) = populated(3);
        let page = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().limit(50))
            .unwrap();
        assert_eq!(page.posts.len(), 3);
        assert!(!page.more);
    }

    #[test]
    fn since_last_edge_is_empty() {
        let (store, links, addresses) = populated(3);
        let page = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().since(addresses[2]))
            .unwrap();
        assert!(page.posts.is_empty());
        assert!(!page.more);
    }

    // -----------------------------------------------------------------------
    // Cursor errors
    // -----------------------------------------------------------------------

    #[test]
    fn foreign_cursor_is_invalid() {
        let (store, links, _) = populated(3);
        let stranger = Address::digest_of(b"never seen");
        let err = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().since(stranger))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor { since, .. } if since == stranger));
    }

    #[test]
    fn cursor_from_another_base_is_invalid() {
        let (store, links, _) = populated(3);
        let elsewhere = store.put(&post("elsewhere", "community2")).unwrap();
        let err = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().since(elsewhere))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor { .. }));
    }

    #[test]
    fn stored_but_unlinked_cursor_is_not_found() {
        let (store, links, _) = populated(3);
        let pending = store.put(&post("link in flight", BASE)).unwrap();
        let err = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().since(pending))
            .unwrap_err();
        assert!(matches!(err, QueryError::NotFound(a) if a == pending));
    }

    // -----------------------------------------------------------------------
    // Missing content
    // -----------------------------------------------------------------------

    fn with_dangling_edge() -> (InMemoryContentStore, InMemoryLinkIndex, Address) {
        let (store, links, _) = populated(2);
        let dangling = Address::digest_of(b"blob still in flight");
        links
            .add_link(&Link {
                base: BASE.into(),
                target: dangling,
                sequence: 9,
                origin: AgentId::named("carol"),
                stamp: TemporalAnchor::new(5000, 0, 7),
            })
            .unwrap();
        (store, links, dangling)
    }

    #[test]
    fn missing_post_is_omitted_and_reported() {
        let (store, links, dangling) = with_dangling_edge();
        let page = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all())
            .unwrap();
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.unresolved, vec![dangling]);
        // The edge still counts toward adjacency.
        assert_eq!(
            engine(&store, &links).adjacency_list_for_base(BASE).unwrap().len(),
            3
        );
    }

    #[test]
    fn missing_post_fails_under_error_policy() {
        let (store, links, dangling) = with_dangling_edge();
        let config = QueryConfig {
            missing_content: MissingContentPolicy::Error,
            ..QueryConfig::default()
        };
        let err = QueryEngine::new(&store, &links, config)
            .all_for_base(BASE, &QueryOptions::all())
            .unwrap_err();
        assert!(matches!(err, QueryError::Unresolved(a) if a == dangling));
    }

    #[test]
    fn limit_counts_edges_not_resolved_posts() {
        let (store, links, _) = with_dangling_edge();
        let page = engine(&store, &links)
            .all_for_base(BASE, &QueryOptions::all().limit(3))
            .unwrap();
        assert_eq!(page.posts.len() + page.unresolved.len(), 3);
        assert!(!page.more);
    }

    // -----------------------------------------------------------------------
    // Ordering modes
    // -----------------------------------------------------------------------

    #[test]
    fn causal_order_ignores_arrival() {
        let store = InMemoryContentStore::new();
        let early = store.put(&post("early", BASE)).unwrap();
        let late = store.put(&post("late", BASE)).unwrap();
        let links = InMemoryLinkIndex::new();
        let link = |target, seq, ms| Link {
            base: BASE.into(),
            target,
            sequence: seq,
            origin: AgentId::named("alice"),
            stamp: TemporalAnchor::new(ms, 0, 1),
        };
        links.add_link(&link(late, 2, 2000)).unwrap();
        links.add_link(&link(early, 1, 1000)).unwrap();

        let causal = engine(&store, &links).adjacency_list_for_base(BASE).unwrap();
        assert_eq!(causal[0].1, early);

        let arrival = QueryEngine::new(
            &store,
            &links,
            QueryConfig {
                ordering: crate::types::OrderingMode::Arrival,
                ..QueryConfig::default()
            },
        )
        .adjacency_list_for_base(BASE)
        .unwrap();
        assert_eq!(arrival[0].1, late);
    }

    #[test]
    fn works_through_trait_objects() {
        let (store, links, _) = populated(3);
        let store: &dyn ContentStore = &store;
        let links: &dyn LinkIndex = &links;
        let engine = QueryEngine::new(store, links, QueryConfig::default());
        assert_eq!(engine.all_for_base(BASE, &QueryOptions::all()).unwrap().posts.len(), 3);
    }

    proptest! {
        #[test]
        fn pages_concatenate_to_full_listing(n in 0u64..16, k in 1u32..8) {
            let (store, links, addresses) = populated(n);
            let engine = engine(&store, &links);

            let mut collected = Vec::new();
            let mut options = QueryOptions::all().limit(k);
            loop {
                let page = engine.all_for_base(BASE, &options).unwrap();
                collected.extend(page.addresses());
                match (page.more, page.last_address()) {
                    (true, Some(cursor)) => options = QueryOptions::all().limit(k).since(cursor),
                    _ => break,
                }
            }
            prop_assert_eq!(collected, addresses);
        }
    }
}

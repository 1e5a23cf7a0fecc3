//! Read path for Agora replicas.
//!
//! The [`QueryEngine`] answers two questions from purely local state, without
//! touching the network:
//!
//! - which edges hang off a base ([`QueryEngine::adjacency_list_for_base`]),
//! - which posts belong to a base, in a stable total order, one page at a
//!   time ([`QueryEngine::all_for_base`]).
//!
//! Reads never fail on empty results. They fail only on malformed cursors or
//! on store faults, and, under [`MissingContentPolicy::Error`], on edges whose
//! post has not arrived yet.

pub mod engine;
pub mod error;
pub mod order;
pub mod types;

pub use engine::QueryEngine;
pub use error::{QueryError, QueryResult};
pub use order::{dedup_targets, sort_edges};
pub use types::{MissingContentPolicy, OrderingMode, PostsPage, QueryConfig, QueryOptions};

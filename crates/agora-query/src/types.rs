use agora_store::PostWithAddress;
use agora_types::Address;
use serde::{Deserialize, Serialize};

/// How a replica totally orders the edges of a base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// `(stamp, origin, sequence)`. Identical on every converged replica,
    /// whatever order the links arrived in.
    #[default]
    Causal,
    /// Local first-observation order. Identical across replicas only when
    /// every write was followed by a consistency barrier.
    Arrival,
}

/// What `all_for_base` does with an edge whose post is not stored locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContentPolicy {
    /// Leave the post out, list its address in [`PostsPage::unresolved`],
    /// and log a warning.
    #[default]
    Omit,
    /// Fail the whole call with `QueryError::Unresolved`.
    Error,
}

/// Engine settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub ordering: OrderingMode,
    pub missing_content: MissingContentPolicy,
}

/// Pagination options for `all_for_base`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Return at most this many edges' posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Start strictly after the post with this address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<Address>,
}

impl QueryOptions {
    /// No limit, no cursor: the whole base.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, since: Address) -> Self {
        self.since = Some(since);
        self
    }
}

/// One page of posts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsPage {
    pub posts: Vec<PostWithAddress>,
    /// `true` iff edges remain after this page.
    pub more: bool,
    /// Edges inside the page window whose posts are not stored locally yet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<Address>,
}

impl PostsPage {
    pub fn addresses(&self) -> Vec<Address> {
        self.posts.iter().map(|p| p.address).collect()
    }

    /// The cursor for the next page, if this page returned anything.
    pub fn last_address(&self) -> Option<Address> {
        self.posts.last().map(|p| p.address)
    }
}

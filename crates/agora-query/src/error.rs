use agora_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The cursor names a post this replica holds for the base, but the
    /// post's edge has not propagated here yet. Retry after convergence.
    #[error("cursor {0} not yet linked locally")]
    NotFound(Address),

    /// The cursor is not a post of this base.
    #[error("invalid cursor {since} for base {base:?}")]
    InvalidCursor { base: String, since: Address },

    /// An edge's post is not stored locally and the engine is configured to
    /// fail rather than omit.
    #[error("post {0} is linked but not stored locally")]
    Unresolved(Address),

    #[error("store error: {0}")]
    Store(#[from] agora_store::StoreError),

    #[error("link index error: {0}")]
    Link(#[from] agora_links::LinkError),
}

pub type QueryResult<T> = Result<T, QueryError>;

use agora_types::Address;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The post is malformed and has no canonical encoding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The requested post has not been observed by this replica.
    #[error("post not found: {0}")]
    NotFound(Address),

    /// A stored post no longer hashes to its address.
    #[error("hash mismatch for {0}")]
    HashMismatch(Address),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

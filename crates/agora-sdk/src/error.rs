use agora_types::{Address, AgentId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    /// Malformed post input.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Address or cursor absent locally. May succeed after convergence.
    #[error("not found: {0}")]
    NotFound(Address),

    #[error("invalid cursor {since} for base {base:?}")]
    InvalidCursor { base: String, since: Address },

    #[error("propagation did not settle within {timeout_ms}ms ({pending} deliveries pending)")]
    PropagationTimeout { timeout_ms: u64, pending: u64 },

    #[error("sequence {sequence} of {origin} is bound to a different link")]
    ConcurrentSequenceConflict { origin: AgentId, sequence: u64 },

    #[error("post {0} is linked but not stored locally")]
    Unresolved(Address),

    #[error("store error: {0}")]
    Store(agora_store::StoreError),

    #[error("fabric error: {0}")]
    Fabric(#[from] agora_fabric::FabricError),

    #[error("sync error: {0}")]
    Sync(agora_sync::SyncError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SdkResult<T> = Result<T, SdkError>;

impl From<agora_store::StoreError> for SdkError {
    fn from(e: agora_store::StoreError) -> Self {
        use agora_store::StoreError;
        match e {
            StoreError::Encoding(msg) => Self::Encoding(msg),
            StoreError::NotFound(address) => Self::NotFound(address),
            other => Self::Store(other),
        }
    }
}

impl From<agora_links::LinkError> for SdkError {
    fn from(e: agora_links::LinkError) -> Self {
        use agora_links::LinkError;
        match e {
            LinkError::ConcurrentSequenceConflict { origin, sequence } => {
                Self::ConcurrentSequenceConflict { origin, sequence }
            }
            LinkError::EmptyBase => Self::Encoding("base must not be empty".into()),
        }
    }
}

impl From<agora_query::QueryError> for SdkError {
    fn from(e: agora_query::QueryError) -> Self {
        use agora_query::QueryError;
        match e {
            QueryError::NotFound(address) => Self::NotFound(address),
            QueryError::InvalidCursor { base, since } => Self::InvalidCursor { base, since },
            QueryError::Unresolved(address) => Self::Unresolved(address),
            QueryError::Store(e) => e.into(),
            QueryError::Link(e) => e.into(),
        }
    }
}

impl From<agora_sync::SyncError> for SdkError {
    fn from(e: agora_sync::SyncError) -> Self {
        use agora_sync::SyncError;
        match e {
            SyncError::PropagationTimeout {
                timeout_ms,
                pending,
            } => Self::PropagationTimeout {
                timeout_ms,
                pending,
            },
            other => Self::Sync(other),
        }
    }
}

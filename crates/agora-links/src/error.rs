use agora_types::AgentId;
use thiserror::Error;

/// Errors from link index operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// A link cannot be anchored on an empty base.
    #[error("link base must not be empty")]
    EmptyBase,

    /// Two different links claim the same `(origin, sequence)` slot. Only
    /// possible if an agent's sequence discipline was violated.
    #[error("sequence {sequence} of {origin} is already bound to a different link")]
    ConcurrentSequenceConflict { origin: AgentId, sequence: u64 },
}

pub type LinkResult<T> = Result<T, LinkError>;

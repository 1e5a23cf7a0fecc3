use std::io;

/// Errors produced by the replication fabric.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// I/O error during journal operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A post unit's carried address does not match its content.
    #[error("post unit address mismatch: carried {carried}, computed {computed}")]
    AddressMismatch {
        carried: agora_types::Address,
        computed: agora_types::Address,
    },
}

pub type FabricResult<T> = std::result::Result<T, FabricError>;

use agora_types::AgentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("propagation did not settle within {timeout_ms}ms ({pending} deliveries pending)")]
    PropagationTimeout { timeout_ms: u64, pending: u64 },

    #[error("replica {0} is not registered with the transport")]
    UnknownReplica(AgentId),

    #[error("replica {0} is already registered")]
    AlreadyRegistered(AgentId),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("fabric error: {0}")]
    Fabric(#[from] agora_fabric::FabricError),
}

pub type SyncResult<T> = Result<T, SyncError>;

use agora_fabric::{PropagationUnit, UnitId};
use agora_types::AgentId;
use serde::{Deserialize, Serialize};

/// One unit in flight from `from` to a single replica.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: AgentId,
    pub unit: PropagationUnit,
}

/// Result of comparing two replicas' unit digests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Negotiation {
    /// Units the remote holds and we lack.
    pub wants: Vec<UnitId>,
    /// Everything we hold.
    pub haves: Vec<UnitId>,
    /// Units both sides hold.
    pub common: Vec<UnitId>,
}

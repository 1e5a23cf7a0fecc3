use std::fmt;

use agora_crypto::ContentHasher;
use agora_types::{Address, AgentId, TemporalAnchor};
use serde::{Deserialize, Serialize};

/// Content-derived identifier of a link.
///
/// Computed over the dedup tuple `(base, target, origin, sequence)`; the
/// clock stamp is deliberately excluded so a redelivered link with the same
/// identity always collapses onto the first copy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId([u8; 32]);

impl LinkId {
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkId({})", self.short_hex())
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link:{}", self.short_hex())
    }
}

/// A directed edge `base -> target`, created once by `origin`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub base: String,
    pub target: Address,
    /// Strictly increasing per origin agent, starting at 1.
    pub sequence: u64,
    pub origin: AgentId,
    /// Origin's clock at creation, allocated together with `sequence`.
    pub stamp: TemporalAnchor,
}

impl Link {
    /// Compute this link's id.
    pub fn id(&self) -> LinkId {
        let mut data = Vec::with_capacity(8 + self.base.len() + 32 + 32 + 8);
        data.extend_from_slice(&(self.base.len() as u64).to_le_bytes());
        data.extend_from_slice(self.base.as_bytes());
        data.extend_from_slice(self.target.as_bytes());
        data.extend_from_slice(self.origin.as_bytes());
        data.extend_from_slice(&self.sequence.to_le_bytes());
        LinkId::from_hash(*ContentHasher::LINK.hash(&data).as_bytes())
    }
}

/// A link as held by one replica, with its local arrival index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedLink {
    pub link: Link,
    /// Position in this replica's first-observation order (0-based).
    pub arrival: u64,
}

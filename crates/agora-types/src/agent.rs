use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a replica.
///
/// The BLAKE3 hash of the agent's name under the `agora-agent-v1` domain, so
/// an agent re-opened with the same name keeps its identity. The id
/// disambiguates per-agent sequence numbers on links.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId {
    hash: [u8; 32],
}

impl AgentId {
    pub fn named(name: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"agora-agent-v1:");
        hasher.update(name.as_bytes());
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier, `ag:` followed by 8 hex characters.
    pub fn short_id(&self) -> String {
        format!("ag:{}", hex::encode(&self.hash[..4]))
    }

    /// 16-bit node id for the agent's hybrid logical clock.
    ///
    /// Only a tie-breaker inside [`TemporalAnchor`](crate::TemporalAnchor);
    /// collisions are harmless because link order also compares full ids.
    pub fn node_id(&self) -> u16 {
        u16::from_le_bytes([self.hash[0], self.hash[1]])
    }

    /// Parse from 64 hex characters, with or without the `ag:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("ag:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { hash: arr })
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.short_id())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

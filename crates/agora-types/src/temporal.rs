use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hybrid Logical Clock timestamp carried by every link.
///
/// `physical_ms` is wall-clock milliseconds, `logical` counts events within
/// the same millisecond, and `node_id` breaks ties between agents. The
/// ordering is total: `physical_ms`, then `logical`, then `node_id`.
///
/// Stamps are produced by `agora_fabric::HybridLogicalClock`. A replica that
/// applies a remote link advances its clock past the link's stamp, so any
/// post created afterwards on that replica sorts after the observed one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporalAnchor {
    pub physical_ms: u64,
    pub logical: u32,
    pub node_id: u16,
}

impl TemporalAnchor {
    pub fn new(physical_ms: u64, logical: u32, node_id: u16) -> Self {
        Self {
            physical_ms,
            logical,
            node_id,
        }
    }

    /// The smallest anchor. Used as the initial clock state.
    pub const fn zero() -> Self {
        Self {
            physical_ms: 0,
            logical: 0,
            node_id: 0,
        }
    }

    /// Returns `true` if this anchor orders strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl Default for TemporalAnchor {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialOrd for TemporalAnchor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TemporalAnchor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
            .then(self.node_id.cmp(&other.node_id))
    }
}

impl fmt::Debug for TemporalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TemporalAnchor({}ms.{}.n{})",
            self.physical_ms, self.logical, self.node_id
        )
    }
}

impl fmt::Display for TemporalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.n{}", self.physical_ms, self.logical, self.node_id)
    }
}

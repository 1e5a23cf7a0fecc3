use std::collections::HashSet;

use agora_fabric::UnitId;

use crate::types::Negotiation;

/// Computes which units a replica is missing relative to a peer.
pub struct NegotiationEngine;

impl NegotiationEngine {
    /// Units the remote has that we don't, in the remote's order.
    pub fn compute_wants(local: &[UnitId], remote: &[UnitId]) -> Vec<UnitId> {
        let have: HashSet<&UnitId> = local.iter().collect();
        remote.iter().filter(|id| !have.contains(id)).copied().collect()
    }

    /// Units we advertise.
    pub fn compute_haves(local: &[UnitId]) -> Vec<UnitId> {
        local.to_vec()
    }

    pub fn negotiate(local: &[UnitId], remote: &[UnitId]) -> Negotiation {
        let have: HashSet<&UnitId> = local.iter().collect();
        let common = remote.iter().filter(|id| have.contains(id)).copied().collect();
        Negotiation {
            wants: Self::compute_wants(local, remote),
            haves: Self::compute_haves(local),
            common,
        }
    }
}

use std::sync::Arc;

use agora_fabric::PropagationUnit;
use agora_types::AgentId;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SyncResult;
use crate::tracker::ConsistencyTracker;
use crate::types::Envelope;

/// Moves propagation units between replicas.
///
/// Implementations guarantee at-least-once delivery to every registered
/// replica other than the sender, in no particular order.
#[async_trait]
pub trait PropagationTransport: Send + Sync {
    /// Join the network. The returned inbox yields every unit addressed to
    /// `agent`.
    async fn register(&self, agent: AgentId) -> SyncResult<Inbox>;

    /// Ship `unit` to every other replica. Returns the number of deliveries
    /// issued (duplicates included).
    async fn broadcast(&self, from: &AgentId, unit: &PropagationUnit) -> SyncResult<usize>;

    /// Ship `unit` to one replica.
    async fn send_to(&self, from: &AgentId, to: &AgentId, unit: &PropagationUnit)
        -> SyncResult<()>;

    /// Resolve once every delivery issued before the call has been applied.
    async fn await_consistency(&self) -> SyncResult<()>;

    /// Registered replicas, sorted.
    fn replicas(&self) -> Vec<AgentId>;
}

/// Receiving end of a replica's deliveries.
///
/// Call [`ack`](Self::ack) after applying each received envelope; the
/// consistency barrier counts acks.
pub struct Inbox {
    agent: AgentId,
    rx: mpsc::Receiver<Envelope>,
    tracker: Arc<ConsistencyTracker>,
}

impl Inbox {
    pub fn new(agent: AgentId, rx: mpsc::Receiver<Envelope>, tracker: Arc<ConsistencyTracker>) -> Self {
        Self { agent, rx, tracker }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    /// Next envelope, or `None` once the transport is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub fn ack(&self) {
        self.tracker.settle(&self.agent);
    }
}

impl std::fmt::Debug for Inbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox").field("agent", &self.agent).finish()
    }
}

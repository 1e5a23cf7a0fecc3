use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use agora_types::AgentId;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

struct Progress {
    issued: u64,
    applied: watch::Sender<u64>,
}

/// Counts deliveries issued to and applied by each replica.
///
/// The transport calls [`issue`](Self::issue) before a delivery leaves; the
/// receiving replica calls [`settle`](Self::settle) once the unit is applied.
/// [`wait`](Self::wait) resolves when every replica has applied everything
/// issued to it before the call.
#[derive(Default)]
pub struct ConsistencyTracker {
    replicas: RwLock<HashMap<AgentId, Progress>>,
}

impl ConsistencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, agent: &AgentId) {
        let mut replicas = self.replicas.write().expect("lock poisoned");
        replicas.entry(agent.clone()).or_insert_with(|| Progress {
            issued: 0,
            applied: watch::channel(0).0,
        });
    }

    /// Stop tracking `agent`; pending deliveries to it no longer hold the
    /// barrier.
    pub fn forget(&self, agent: &AgentId) {
        self.replicas.write().expect("lock poisoned").remove(agent);
    }

    pub fn issue(&self, to: &AgentId) -> SyncResult<()> {
        let mut replicas = self.replicas.write().expect("lock poisoned");
        let progress = replicas
            .get_mut(to)
            .ok_or_else(|| SyncError::UnknownReplica(to.clone()))?;
        progress.issued += 1;
        Ok(())
    }

    pub fn settle(&self, agent: &AgentId) {
        let replicas = self.replicas.read().expect("lock poisoned");
        if let Some(progress) = replicas.get(agent) {
            progress.applied.send_modify(|n| *n += 1);
        }
    }

    /// Deliveries issued but not yet applied, across all replicas.
    pub fn pending(&self) -> u64 {
        let replicas = self.replicas.read().expect("lock poisoned");
        replicas
            .values()
            .map(|p| p.issued.saturating_sub(*p.applied.borrow()))
            .sum()
    }

    /// Wait until every delivery issued so far has been applied.
    pub async fn wait(&self, timeout: Duration) -> SyncResult<()> {
        let targets: Vec<(watch::Receiver<u64>, u64)> = {
            let replicas = self.replicas.read().expect("lock poisoned");
            replicas
                .values()
                .map(|p| (p.applied.subscribe(), p.issued))
                .collect()
        };

        let settled = async move {
            for (mut applied, target) in targets {
                // A closed channel means the replica was forgotten.
                let _ = applied.wait_for(|n| *n >= target).await;
            }
        };

        match tokio::time::timeout(timeout, settled).await {
            Ok(()) => {
                debug!("propagation settled");
                Ok(())
            }
            Err(_) => {
                let pending = self.pending();
                warn!(timeout_ms = timeout.as_millis() as u64, pending, "consistency barrier timed out");
                Err(SyncError::PropagationTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                    pending,
                })
            }
        }
    }
}

impl std::fmt::Debug for ConsistencyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyTracker")
            .field("pending", &self.pending())
            .finish()
    }
}

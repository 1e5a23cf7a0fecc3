//! In-process transport.
//!
//! Every replica gets a bounded inbox channel. Each delivery runs on its own
//! spawned task after a random delay, and may be sent twice, so receivers see
//! units reordered and duplicated exactly as a real network would allow.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use agora_fabric::PropagationUnit;
use agora_types::AgentId;
use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::error::{SyncError, SyncResult};
use crate::tracker::ConsistencyTracker;
use crate::transport::{Inbox, PropagationTransport};
use crate::types::Envelope;

const INBOX_CAPACITY: usize = 1024;
const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(250);

pub struct LoopbackTransport {
    config: NetworkConfig,
    inboxes: RwLock<BTreeMap<AgentId, mpsc::Sender<Envelope>>>,
    tracker: Arc<ConsistencyTracker>,
}

impl LoopbackTransport {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            inboxes: RwLock::new(BTreeMap::new()),
            tracker: Arc::new(ConsistencyTracker::new()),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<ConsistencyTracker> {
        &self.tracker
    }

    /// Remove a replica. Deliveries still in flight to it are dropped and no
    /// longer hold the barrier.
    pub fn deregister(&self, agent: &AgentId) {
        self.inboxes.write().expect("lock poisoned").remove(agent);
        self.tracker.forget(agent);
    }

    fn inbox_of(&self, agent: &AgentId) -> SyncResult<mpsc::Sender<Envelope>> {
        self.inboxes
            .read()
            .expect("lock poisoned")
            .get(agent)
            .cloned()
            .ok_or_else(|| SyncError::UnknownReplica(agent.clone()))
    }

    /// Issue one or two deliveries of `envelope` to `to`, each on its own task.
    fn dispatch(&self, to: &AgentId, inbox: mpsc::Sender<Envelope>, envelope: Envelope) -> SyncResult<usize> {
        let mut rng = rand::thread_rng();
        let p = self.config.duplicate_probability;
        let copies = if p > 0.0 && rng.gen_bool(p.min(1.0)) { 2 } else { 1 };

        for _ in 0..copies {
            self.tracker.issue(to)?;
            let delay = match self.config.max_jitter_ms {
                0 => Duration::ZERO,
                max => Duration::from_millis(rng.gen_range(0..=max)),
            };
            tokio::spawn(deliver(
                to.clone(),
                inbox.clone(),
                envelope.clone(),
                delay,
                self.config.redelivery_attempts,
            ));
        }
        Ok(copies)
    }
}

async fn deliver(
    to: AgentId,
    inbox: mpsc::Sender<Envelope>,
    envelope: Envelope,
    delay: Duration,
    redelivery_attempts: u32,
) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let unit = envelope.unit.id();
    for attempt in 0..=redelivery_attempts {
        match inbox.send_timeout(envelope.clone(), ATTEMPT_TIMEOUT).await {
            Ok(()) => {
                debug!(to = %to, %unit, attempt, "unit delivered");
                return;
            }
            Err(SendTimeoutError::Closed(_)) => {
                warn!(to = %to, %unit, "inbox closed; dropping delivery");
                return;
            }
            Err(SendTimeoutError::Timeout(_)) => {
                debug!(to = %to, %unit, attempt, "delivery attempt timed out");
            }
        }
    }
    warn!(to = %to, %unit, redelivery_attempts, "delivery abandoned");
}

#[async_trait]
impl PropagationTransport for LoopbackTransport {
    async fn register(&self, agent: AgentId) -> SyncResult<Inbox> {
        let mut inboxes = self.inboxes.write().expect("lock poisoned");
        if inboxes.contains_key(&agent) {
            return Err(SyncError::AlreadyRegistered(agent));
        }
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        inboxes.insert(agent.clone(), tx);
        self.tracker.register(&agent);
        debug!(agent = %agent, replicas = inboxes.len(), "replica registered");
        Ok(Inbox::new(agent, rx, Arc::clone(&self.tracker)))
    }

    async fn broadcast(&self, from: &AgentId, unit: &PropagationUnit) -> SyncResult<usize> {
        let targets: Vec<(AgentId, mpsc::Sender<Envelope>)> = self
            .inboxes
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|(agent, _)| *agent != from)
            .map(|(agent, tx)| (agent.clone(), tx.clone()))
            .collect();

        let envelope = Envelope {
            from: from.clone(),
            unit: unit.clone(),
        };
        let mut issued = 0;
        for (to, inbox) in targets {
            // A replica deregistered since the snapshot only loses its own copy.
            match self.dispatch(&to, inbox, envelope.clone()) {
                Ok(copies) => issued += copies,
                Err(e) => warn!(from = %from, to = %to, error = %e, "skipping replica during broadcast"),
            }
        }
        debug!(from = %from, kind = unit.kind(), unit = %unit.id(), issued, "unit broadcast");
        Ok(issued)
    }

    async fn send_to(&self, from: &AgentId, to: &AgentId, unit: &PropagationUnit) -> SyncResult<()> {
        let inbox = self.inbox_of(to)?;
        let envelope = Envelope {
            from: from.clone(),
            unit: unit.clone(),
        };
        self.dispatch(to, inbox, envelope)?;
        Ok(())
    }

    async fn await_consistency(&self) -> SyncResult<()> {
        self.tracker.wait(self.config.consistency_timeout()).await
    }

    fn replicas(&self) -> Vec<AgentId> {
        self.inboxes.read().expect("lock poisoned").keys().cloned().collect()
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("replicas", &self.replicas().len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_links::Link;
    use agora_types::{Address, TemporalAnchor};

    fn unit(n: u64) -> PropagationUnit {
        PropagationUnit::Link(Link {
            base: "community1".into(),
            target: Address::digest_of(&n.to_le_bytes()),
            sequence: n,
            origin: AgentId::named("alice"),
            stamp: TemporalAnchor::new(n, 0, 1),
        })
    }

    fn fast(config: NetworkConfig) -> NetworkConfig {
        NetworkConfig {
            consistency_timeout_ms: 2_000,
            ..config
        }
    }

    /// Receive everything currently addressed to `inbox`, acking each.
    async fn drain(inbox: &mut Inbox, expected: usize) -> Vec<Envelope> {
        let mut got = Vec::new();
        while got.len() < expected {
            let envelope = inbox.recv().await.expect("transport alive");
            inbox.ack();
            got.push(envelope);
        }
        got
    }

    #[tokio::test]
    async fn broadcast_skips_sender() {
        let transport = LoopbackTransport::new(fast(NetworkConfig::immediate()));
        let alice = AgentId::named("alice");
        let bob = AgentId::named("bob");
        let _alice_inbox = transport.register(alice.clone()).await.unwrap();
        let mut bob_inbox = transport.register(bob.clone()).await.unwrap();

        let issued = transport.broadcast(&alice, &unit(1)).await.unwrap();
        assert_eq!(issued, 1);

        let got = drain(&mut bob_inbox, 1).await;
        assert_eq!(got[0].from, alice);
        assert_eq!(got[0].unit, unit(1));
        transport.await_consistency().await.unwrap();
    }

    #[tokio::test]
    async fn jittered_deliveries_all_arrive() {
        let config = NetworkConfig {
            max_jitter_ms: 10,
            ..fast(NetworkConfig::default())
        };
        let transport = LoopbackTransport::new(config);
        let alice = AgentId::named("alice");
        transport.register(alice.clone()).await.unwrap();
        let mut bob = transport.register(AgentId::named("bob")).await.unwrap();

        for n in 1..=20 {
            transport.broadcast(&alice, &unit(n)).await.unwrap();
        }
        let mut ids: Vec<_> = drain(&mut bob, 20).await.iter().map(|e| e.unit.id()).collect();
        ids.sort();
        let mut expected: Vec<_> = (1..=20).map(|n| unit(n).id()).collect();
        expected.sort();
        assert_eq!(ids, expected);
        transport.await_consistency().await.unwrap();
    }

    #[tokio::test]
    async fn duplicates_are_issued_and_counted() {
        let config = NetworkConfig {
            duplicate_probability: 1.0,
            ..fast(NetworkConfig::immediate())
        };
        let transport = LoopbackTransport::new(config);
        let alice = AgentId::named("alice");
        transport.register(alice.clone()).await.unwrap();
        let mut bob = transport.register(AgentId::named("bob")).await.unwrap();

        assert_eq!(transport.broadcast(&alice, &unit(1)).await.unwrap(), 2);
        let got = drain(&mut bob, 2).await;
        assert_eq!(got[0].unit, got[1].unit);
        transport.await_consistency().await.unwrap();
    }

    #[tokio::test]
    async fn unacked_delivery_times_out() {
        let config = NetworkConfig {
            consistency_timeout_ms: 50,
            ..NetworkConfig::immediate()
        };
        let transport = LoopbackTransport::new(config);
        let alice = AgentId::named("alice");
        transport.register(alice.clone()).await.unwrap();
        let _bob = transport.register(AgentId::named("bob")).await.unwrap();

        transport.broadcast(&alice, &unit(1)).await.unwrap();
        let err = transport.await_consistency().await.unwrap_err();
        assert!(matches!(err, SyncError::PropagationTimeout { .. }));
    }

    #[tokio::test]
    async fn send_to_targets_one_replica() {
        let transport = LoopbackTransport::new(fast(NetworkConfig::immediate()));
        let alice = AgentId::named("alice");
        let bob = AgentId::named("bob");
        transport.register(alice.clone()).await.unwrap();
        let mut bob_inbox = transport.register(bob.clone()).await.unwrap();
        let _carol = transport.register(AgentId::named("carol")).await.unwrap();

        transport.send_to(&alice, &bob, &unit(7)).await.unwrap();
        assert_eq!(drain(&mut bob_inbox, 1).await[0].unit, unit(7));
        transport.await_consistency().await.unwrap();
    }

    #[tokio::test]
    async fn send_to_unknown_replica_fails() {
        let transport = LoopbackTransport::new(NetworkConfig::immediate());
        let err = transport
            .send_to(&AgentId::named("a"), &AgentId::named("ghost"), &unit(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownReplica(_)));
    }

    #[tokio::test]
    async fn double_registration_is_rejected() {
        let transport = LoopbackTransport::new(NetworkConfig::immediate());
        transport.register(AgentId::named("a")).await.unwrap();
        let err = transport.register(AgentId::named("a")).await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn replica_leaving_mid_broadcast_does_not_stop_the_rest() {
        let transport = LoopbackTransport::new(fast(NetworkConfig::immediate()));
        let alice = AgentId::named("alice");
        let bob = AgentId::named("bob");
        transport.register(alice.clone()).await.unwrap();
        let _bob_inbox = transport.register(bob.clone()).await.unwrap();
        let mut carol = transport.register(AgentId::named("carol")).await.unwrap();

        // Bob's inbox is still listed but the tracker has already let go.
        transport.tracker().forget(&bob);

        assert_eq!(transport.broadcast(&alice, &unit(1)).await.unwrap(), 1);
        assert_eq!(drain(&mut carol, 1).await[0].unit, unit(1));
        transport.await_consistency().await.unwrap();
    }

    #[tokio::test]
    async fn deregistered_replica_does_not_block_barrier() {
        let config = NetworkConfig {
            consistency_timeout_ms: 100,
            ..NetworkConfig::immediate()
        };
        let transport = LoopbackTransport::new(config);
        let alice = AgentId::named("alice");
        let bob = AgentId::named("bob");
        transport.register(alice.clone()).await.unwrap();
        let bob_inbox = transport.register(bob.clone()).await.unwrap();

        transport.broadcast(&alice, &unit(1)).await.unwrap();
        drop(bob_inbox);
        transport.deregister(&bob);
        transport.await_consistency().await.unwrap();
        assert_eq!(transport.replicas(), vec![alice]);
    }
}

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use agora_fabric::UnitId;
use agora_sync::{LoopbackTransport, NegotiationEngine, NetworkConfig, PropagationTransport};
use agora_types::AgentId;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::error::SdkResult;

/// A set of agents sharing one transport.
///
/// Each spawned agent gets a background task that applies everything its
/// inbox receives and acknowledges it to the consistency barrier. Dropping
/// the network stops those tasks.
pub struct Network {
    config: NetworkConfig,
    transport: Arc<dyn PropagationTransport>,
    agents: RwLock<BTreeMap<AgentId, Arc<Agent>>>,
    pumps: Mutex<Vec<JoinHandle<()>>>,
}

impl Network {
    /// A network over the in-process loopback transport.
    pub fn new(config: NetworkConfig) -> Self {
        let transport = Arc::new(LoopbackTransport::new(config.clone()));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: NetworkConfig, transport: Arc<dyn PropagationTransport>) -> Self {
        Self {
            config,
            transport,
            agents: RwLock::new(BTreeMap::new()),
            pumps: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Open an agent and join it to the network.
    ///
    /// A durable agent replays its journal first. Units created elsewhere
    /// before it joined reach it only through [`reconcile`](Self::reconcile).
    pub async fn spawn_agent(&self, name: &str, config: AgentConfig) -> SdkResult<Arc<Agent>> {
        let agent = Arc::new(Agent::build(name, config, Some(Arc::clone(&self.transport)))?);
        let mut inbox = self.transport.register(agent.id().clone()).await?;

        let replica = Arc::clone(&agent);
        let pump = tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                if let Err(e) = replica.apply(&envelope.unit) {
                    warn!(
                        agent = %replica.id(),
                        from = %envelope.from,
                        unit = %envelope.unit.id(),
                        error = %e,
                        "failed to apply unit"
                    );
                }
                inbox.ack();
            }
            debug!(agent = %replica.id(), "inbox closed");
        });
        self.pumps.lock().expect("lock poisoned").push(pump);

        self.agents
            .write()
            .expect("lock poisoned")
            .insert(agent.id().clone(), Arc::clone(&agent));
        info!(agent = %agent.id(), name, "agent joined network");
        Ok(agent)
    }

    /// Every agent, ordered by id.
    pub fn agents(&self) -> Vec<Arc<Agent>> {
        self.agents.read().expect("lock poisoned").values().cloned().collect()
    }

    pub fn agent(&self, id: &AgentId) -> Option<Arc<Agent>> {
        self.agents.read().expect("lock poisoned").get(id).cloned()
    }

    /// Block until every unit issued so far has been applied by its target,
    /// or fail with `PropagationTimeout`.
    pub async fn await_consistency(&self) -> SdkResult<()> {
        Ok(self.transport.await_consistency().await?)
    }

    /// Anti-entropy: ship every unit any agent holds to every agent lacking
    /// it, then wait for the barrier. Returns the number of units shipped.
    pub async fn reconcile(&self) -> SdkResult<usize> {
        let agents = self.agents();
        let digests: Vec<Vec<UnitId>> = agents
            .iter()
            .map(|a| a.digest())
            .collect::<SdkResult<_>>()?;

        let mut shipped = 0usize;
        for (t, target) in agents.iter().enumerate() {
            let mut known: Vec<UnitId> = digests[t].clone();
            for (s, source) in agents.iter().enumerate() {
                if s == t {
                    continue;
                }
                let wants = NegotiationEngine::compute_wants(&known, &digests[s]);
                if wants.is_empty() {
                    continue;
                }
                for unit in source.export(&wants)? {
                    self.transport.send_to(source.id(), target.id(), &unit).await?;
                    shipped += 1;
                }
                debug!(from = %source.id(), to = %target.id(), units = wants.len(), "reconcile");
                known.extend(wants);
            }
        }

        self.await_consistency().await?;
        info!(shipped, replicas = agents.len(), "anti-entropy pass complete");
        Ok(shipped)
    }

    /// Ids held by some agent but not by every agent.
    pub fn divergence(&self) -> SdkResult<Vec<UnitId>> {
        let digests: Vec<HashSet<UnitId>> = self
            .agents()
            .iter()
            .map(|a| a.digest().map(|d| d.into_iter().collect()))
            .collect::<SdkResult<_>>()?;
        let union: HashSet<UnitId> = digests.iter().flatten().copied().collect();
        let mut diverged: Vec<UnitId> = union
            .into_iter()
            .filter(|id| !digests.iter().all(|d| d.contains(id)))
            .collect();
        diverged.sort();
        Ok(diverged)
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        if let Ok(pumps) = self.pumps.get_mut() {
            for pump in pumps.drain(..) {
                pump.abort();
            }
        }
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("agents", &self.agents.read().map(|a| a.len()).unwrap_or(0))
            .field("config", &self.config)
            .finish()
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agora_crypto::ContentHasher;
use agora_fabric::{Journal, PropagationUnit, UnitId, WriteClock};
use agora_links::{InMemoryLinkIndex, IndexedLink, Link, LinkIndex};
use agora_query::{PostsPage, QueryEngine, QueryOptions};
use agora_store::{ContentStore, InMemoryContentStore, Post, PostWithAddress};
use agora_sync::PropagationTransport;
use agora_types::{Address, AgentId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{SdkError, SdkResult};

/// Counters reported by [`Agent::stats`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub posts: usize,
    pub links: usize,
    pub bases: usize,
    pub last_sequence: u64,
}

/// One replica.
///
/// Writes go through [`create`](Self::create), which stores the post, links
/// it into its base, journals both units, and hands them to the transport.
/// Units from peers arrive through [`apply`](Self::apply). Reads are pure
/// functions of local state.
pub struct Agent {
    id: AgentId,
    name: String,
    config: AgentConfig,
    store: InMemoryContentStore,
    links: InMemoryLinkIndex,
    clock: WriteClock,
    /// Serializes local writes so the duplicate check and the edge insert
    /// are one step.
    writes: Mutex<()>,
    journal: Option<Journal>,
    transport: Option<Arc<dyn PropagationTransport>>,
}

impl Agent {
    /// Open a standalone agent. With `config.data_dir` set, the journal in
    /// that directory is replayed first.
    pub fn open(name: &str, config: AgentConfig) -> SdkResult<Self> {
        Self::build(name, config, None)
    }

    pub(crate) fn build(
        name: &str,
        config: AgentConfig,
        transport: Option<Arc<dyn PropagationTransport>>,
    ) -> SdkResult<Self> {
        if name.is_empty() {
            return Err(SdkError::Config("agent name must not be empty".into()));
        }
        let id = AgentId::named(name);
        let journal = match &config.data_dir {
            Some(dir) => Some(Journal::open_in(dir, config.journal_config())?),
            None => None,
        };
        let agent = Self {
            clock: WriteClock::new(id.node_id()),
            store: InMemoryContentStore::with_limit(config.max_post_bytes),
            links: InMemoryLinkIndex::new(),
            writes: Mutex::new(()),
            id,
            name: name.to_string(),
            config,
            journal,
            transport,
        };
        agent.replay()?;
        Ok(agent)
    }

    fn replay(&self) -> SdkResult<()> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let units = journal.recover()?;
        let mut applied = 0usize;
        for unit in &units {
            if self.ingest(unit)? {
                applied += 1;
            }
        }
        if !units.is_empty() {
            info!(
                agent = %self.id,
                recovered = units.len(),
                applied,
                last_sequence = self.clock.last_sequence(),
                "journal replayed"
            );
        }
        Ok(())
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    // ---- Writes ----

    /// Store `post`, link it into its base, and propagate both units.
    ///
    /// Both units are journaled before they become visible locally. Once they
    /// are, the write stands: a failed broadcast is logged and left to
    /// anti-entropy. Creating content that `post.base` already links returns
    /// the existing post without minting a second edge.
    pub async fn create(&self, post: Post) -> SdkResult<PostWithAddress> {
        let data = post.canonical_bytes(self.config.max_post_bytes)?;
        let address = ContentHasher::POST.hash(&data);

        let (post_unit, link_unit) = {
            let _write = self.writes.lock().expect("lock poisoned");
            if let Some(existing) = self.edge_for(&post.base, &address)? {
                self.store.put_replicated(address, &post)?;
                debug!(agent = %self.id, %address, base = %post.base, "post already linked");
                return Ok(post.with_address(address, existing.link.origin));
            }

            let (sequence, stamp) = self.clock.next();
            let link = Link {
                base: post.base.clone(),
                target: address,
                sequence,
                origin: self.id.clone(),
                stamp,
            };
            let post_unit = PropagationUnit::Post {
                address,
                post: post.clone(),
            };
            let link_unit = PropagationUnit::Link(link.clone());
            self.journal_append(&post_unit)?;
            self.journal_append(&link_unit)?;

            self.store.put_replicated(address, &post)?;
            self.links.add_link(&link)?;
            info!(agent = %self.id, %address, base = %post.base, sequence, %stamp, "post created");
            (post_unit, link_unit)
        };

        if let Some(transport) = &self.transport {
            for unit in [&post_unit, &link_unit] {
                if let Err(e) = transport.broadcast(&self.id, unit).await {
                    warn!(
                        agent = %self.id,
                        unit = %unit.id(),
                        error = %e,
                        "broadcast failed; peers catch up through reconcile"
                    );
                }
            }
        }

        Ok(post.with_address(address, self.id.clone()))
    }

    /// Apply a unit received from a peer. Returns `true` if it was new here.
    pub fn apply(&self, unit: &PropagationUnit) -> SdkResult<bool> {
        let fresh = self.ingest(unit)?;
        if fresh {
            self.journal_append(unit)?;
        }
        debug!(agent = %self.id, kind = unit.kind(), unit = %unit.id(), fresh, "unit applied");
        Ok(fresh)
    }

    fn ingest(&self, unit: &PropagationUnit) -> SdkResult<bool> {
        match unit {
            PropagationUnit::Post { address, post } => {
                unit.verify()?;
                Ok(self.store.put_replicated(*address, post)?)
            }
            PropagationUnit::Link(link) => {
                self.clock.observe(&link.stamp);
                if link.origin == self.id {
                    self.clock.restore_sequence(link.sequence);
                }
                Ok(self.links.add_link(link)?)
            }
        }
    }

    fn journal_append(&self, unit: &PropagationUnit) -> SdkResult<()> {
        if let Some(journal) = &self.journal {
            journal.append(unit)?;
        }
        Ok(())
    }

    // ---- Reads ----

    fn engine(&self) -> QueryEngine<'_, InMemoryContentStore, InMemoryLinkIndex> {
        QueryEngine::new(&self.store, &self.links, self.config.query_config())
    }

    /// The edge that places `target` in `base`'s order, if one is held here.
    fn edge_for(&self, base: &str, target: &Address) -> SdkResult<Option<IndexedLink>> {
        Ok(self
            .engine()
            .ordered_edges(base)?
            .into_iter()
            .find(|e| e.link.target == *target))
    }

    /// A post by address, once both its blob and its link are held here.
    pub fn get(&self, address: &Address) -> SdkResult<PostWithAddress> {
        let post = self.store.fetch(address)?;
        let author = self
            .edge_for(&post.base, address)?
            .map(|e| e.link.origin)
            .ok_or(SdkError::NotFound(*address))?;
        Ok(post.with_address(*address, author))
    }

    pub fn adjacency_list_for_base(&self, base: &str) -> SdkResult<Vec<(Address, Address)>> {
        Ok(self.engine().adjacency_list_for_base(base)?)
    }

    pub fn all_for_base(&self, base: &str, options: &QueryOptions) -> SdkResult<PostsPage> {
        Ok(self.engine().all_for_base(base, options)?)
    }

    pub fn stats(&self) -> AgentStats {
        AgentStats {
            posts: self.store.len(),
            links: self.links.len(),
            bases: self.links.bases().len(),
            last_sequence: self.clock.last_sequence(),
        }
    }

    /// Bases with at least one link, sorted.
    pub fn bases(&self) -> Vec<String> {
        self.links.bases()
    }

    // ---- Replication ----

    /// Wait for the transport's consistency barrier. A standalone agent is
    /// always consistent.
    pub async fn await_consistency(&self) -> SdkResult<()> {
        match &self.transport {
            Some(transport) => Ok(transport.await_consistency().await?),
            None => Ok(()),
        }
    }

    /// Ids of every unit held here, sorted.
    pub fn digest(&self) -> SdkResult<Vec<UnitId>> {
        let mut ids: Vec<UnitId> = self.store.addresses().iter().map(UnitId::for_post).collect();
        ids.extend(self.links.link_ids()?.iter().map(UnitId::for_link));
        ids.sort();
        Ok(ids)
    }

    /// The units named by `ids`, in that order. Unknown ids are skipped.
    pub fn export(&self, ids: &[UnitId]) -> SdkResult<Vec<PropagationUnit>> {
        let mut held: HashMap<UnitId, PropagationUnit> = HashMap::new();
        for address in self.store.addresses() {
            if let Some(post) = self.store.get(&address)? {
                let unit = PropagationUnit::Post { address, post };
                held.insert(unit.id(), unit);
            }
        }
        for indexed in self.links.all_links() {
            let unit = PropagationUnit::Link(indexed.link);
            held.insert(unit.id(), unit);
        }
        Ok(ids.iter().filter_map(|id| held.remove(id)).collect())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("store", &self.store)
            .field("links", &self.links)
            .field("journal", &self.journal)
            .finish()
    }
}

use std::path::PathBuf;

use agora_fabric::{JournalConfig, SyncMode};
use agora_query::{MissingContentPolicy, OrderingMode, QueryConfig};
use agora_store::DEFAULT_MAX_POST_BYTES;
use serde::{Deserialize, Serialize};

/// Per-replica settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub ordering: OrderingMode,
    pub missing_content: MissingContentPolicy,
    pub max_post_bytes: usize,
    /// Journal directory. `None` keeps the agent purely in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub journal_sync: SyncMode,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingMode::default(),
            missing_content: MissingContentPolicy::default(),
            max_post_bytes: DEFAULT_MAX_POST_BYTES,
            data_dir: None,
            journal_sync: SyncMode::default(),
        }
    }
}

impl AgentConfig {
    /// Durable agent journaling into `dir`.
    pub fn durable(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            ordering: self.ordering,
            missing_content: self.missing_content,
        }
    }

    pub fn journal_config(&self) -> JournalConfig {
        JournalConfig {
            sync_mode: self.journal_sync,
        }
    }
}

use std::path::Path;

use agora_sdk::{AgentConfig, NetworkConfig};
use agora_server::ServerConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Everything the binary can be configured with, one table per layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgoraConfig {
    pub agent: AgentConfig,
    pub network: NetworkConfig,
    pub server: ServerConfig,
}

impl AgoraConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

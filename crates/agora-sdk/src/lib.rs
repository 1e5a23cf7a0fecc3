//! High-level SDK for Agora.
//!
//! An [`Agent`] is one replica: a content-addressed post store plus a link
//! index, a write clock, and optionally a journal and a transport. A
//! [`Network`] wires agents together over a [`PropagationTransport`] and
//! exposes the consistency barrier and anti-entropy.
//!
//! ```no_run
//! # async fn demo() -> agora_sdk::SdkResult<()> {
//! use agora_sdk::{AgentConfig, Network, NetworkConfig, Post, QueryOptions};
//!
//! let network = Network::new(NetworkConfig::default());
//! let alice = network.spawn_agent("alice", AgentConfig::default()).await?;
//! let bob = network.spawn_agent("bob", AgentConfig::default()).await?;
//!
//! alice.create(Post::new("hello", "community1")).await?;
//! network.await_consistency().await?;
//! let page = bob.all_for_base("community1", &QueryOptions::all())?;
//! assert_eq!(page.posts.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod network;

pub use agent::{Agent, AgentStats};
pub use config::AgentConfig;
pub use error::{SdkError, SdkResult};
pub use network::Network;

pub use agora_crypto::base_anchor;
pub use agora_fabric::{PropagationUnit, SyncMode, UnitId};
pub use agora_query::{MissingContentPolicy, OrderingMode, PostsPage, QueryOptions};
pub use agora_store::{Post, PostWithAddress};
pub use agora_sync::{NetworkConfig, PropagationTransport};
pub use agora_types::{Address, AgentId, ADDRESS_LEN};

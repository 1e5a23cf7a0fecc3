//! Propagation between Agora replicas.
//!
//! Delivery is at-least-once and unordered; applying a unit is idempotent, so
//! replicas converge regardless of duplicates or reordering. The
//! [`ConsistencyTracker`] turns "everything issued so far has been applied"
//! into an awaitable, time-bounded barrier.

pub mod config;
pub mod error;
pub mod loopback;
pub mod negotiation;
pub mod tracker;
pub mod transport;
pub mod types;

pub use config::NetworkConfig;
pub use error::{SyncError, SyncResult};
pub use loopback::LoopbackTransport;
pub use negotiation::NegotiationEngine;
pub use tracker::ConsistencyTracker;
pub use transport::{Inbox, PropagationTransport};
pub use types::{Envelope, Negotiation};

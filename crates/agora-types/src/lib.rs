//! Foundation types for Agora.
//!
//! Agora is a replicated post graph: every agent holds its own copy of a
//! content-addressed store plus a base-indexed link index, and replicas
//! converge by exchanging propagation units. This crate provides the
//! identifiers shared by every other `agora-*` crate.
//!
//! # Key Types
//!
//! - [`Address`]: 46-character base58 multihash of a post's canonical encoding
//! - [`AgentId`]: stable identity of a replica, derived from its name
//! - [`TemporalAnchor`]: Hybrid Logical Clock timestamp used to order links

pub mod address;
pub mod agent;
pub mod error;
pub mod temporal;

pub use address::{Address, ADDRESS_LEN};
pub use agent::AgentId;
pub use error::TypeError;
pub use temporal::TemporalAnchor;

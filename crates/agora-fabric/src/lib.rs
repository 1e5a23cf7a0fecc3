//! Replication fabric for Agora.
//!
//! Everything a replica ships or persists passes through this crate:
//!
//! - [`PropagationUnit`]: the Post blob or Link edge produced by one `create`,
//!   identified by a content-derived [`UnitId`].
//! - [`HybridLogicalClock`] and [`WriteClock`]: causal stamps for links, with
//!   the per-agent sequence allocated under the same lock.
//! - [`Journal`]: a crash-recoverable write-ahead log of applied units.

pub mod clock;
pub mod error;
pub mod journal;
pub mod unit;

pub use clock::{HybridLogicalClock, WriteClock};
pub use error::{FabricError, FabricResult};
pub use journal::{Journal, JournalConfig, SyncMode};
pub use unit::{PropagationUnit, UnitId};

//! Link index for Agora.
//!
//! A link is a directed edge from a base (a free-form anchor key such as
//! `"community1"`) to a post address. Each link is created once, by one
//! originating agent, and carries that agent's sequence number and clock
//! stamp. Replicas receive links in any order and possibly more than once;
//! the index makes insertion commutative and idempotent, and records the
//! local order of first observation.

pub mod error;
pub mod link;
pub mod memory;
pub mod traits;

pub use error::{LinkError, LinkResult};
pub use link::{IndexedLink, Link, LinkId};
pub use memory::InMemoryLinkIndex;
pub use traits::LinkIndex;

//! Content-addressed post storage for Agora.
//!
//! Every replica keeps its posts in a [`ContentStore`] keyed by the post's
//! [`Address`](agora_types::Address): the BLAKE3 hash of the post's canonical
//! encoding. Identical posts written on different replicas land under the same
//! address, which is what lets links created on one agent resolve on another.
//!
//! # Design Rules
//!
//! 1. Posts are immutable once written; there is no update or delete.
//! 2. `put` is idempotent: re-putting a known post is a no-op.
//! 3. `get` of an unknown address is a normal outcome under partial
//!    propagation, not a defect.
//! 4. Concurrent reads are always safe.

pub mod error;
pub mod memory;
pub mod post;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryContentStore;
pub use post::{Post, PostWithAddress, DEFAULT_MAX_POST_BYTES};
pub use traits::ContentStore;

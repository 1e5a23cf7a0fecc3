use agora_types::Address;

use crate::error::{StoreError, StoreResult};
use crate::post::Post;

/// Content-addressed post store.
///
/// All implementations must satisfy these invariants:
/// - `put` is deterministic: structurally equal posts map to the same address
///   on every replica.
/// - `put` is idempotent; storing a known post changes nothing.
/// - Posts are never updated or removed.
/// - Concurrent `put`s of different content are safe.
pub trait ContentStore: Send + Sync {
    /// Store a post and return its address.
    ///
    /// Fails only when the post has no valid canonical encoding.
    fn put(&self, post: &Post) -> StoreResult<Address>;

    /// Store a post received from a peer under an address the caller has
    /// already checked against its content. Local size limits do not apply.
    /// Returns `true` if the post was new here.
    fn put_replicated(&self, address: Address, post: &Post) -> StoreResult<bool>;

    /// Read a post by address. `Ok(None)` if this replica has not seen it.
    fn get(&self, address: &Address) -> StoreResult<Option<Post>>;

    /// Check whether a post is held locally.
    fn contains(&self, address: &Address) -> StoreResult<bool>;

    /// Read a post, mapping absence to [`StoreError::NotFound`].
    fn fetch(&self, address: &Address) -> StoreResult<Post> {
        self.get(address)?.ok_or(StoreError::NotFound(*address))
    }

    /// Read several posts; missing entries come back as `None`.
    fn get_batch(&self, addresses: &[Address]) -> StoreResult<Vec<Option<Post>>> {
        addresses.iter().map(|a| self.get(a)).collect()
    }
}

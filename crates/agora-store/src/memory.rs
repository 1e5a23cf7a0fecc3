use std::collections::HashMap;
use std::sync::RwLock;

use agora_crypto::ContentHasher;
use agora_types::Address;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::post::{Post, DEFAULT_MAX_POST_BYTES};
use crate::traits::ContentStore;

/// In-memory, HashMap-based post store.
///
/// Posts are held behind a `RwLock`; reads clone the post out.
pub struct InMemoryContentStore {
    posts: RwLock<HashMap<Address, Post>>,
    max_post_bytes: usize,
}

impl InMemoryContentStore {
    /// Create an empty store with the default size limit.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_POST_BYTES)
    }

    /// Create an empty store that rejects posts whose canonical encoding
    /// exceeds `max_post_bytes`.
    pub fn with_limit(max_post_bytes: usize) -> Self {
        Self {
            posts: RwLock::new(HashMap::new()),
            max_post_bytes,
        }
    }

    /// Number of posts currently stored.
    pub fn len(&self) -> usize {
        self.posts.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.posts.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of every stored address.
    pub fn addresses(&self) -> Vec<Address> {
        let map = self.posts.read().expect("lock poisoned");
        let mut ids: Vec<Address> = map.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Recompute every address and report the first mismatch.
    pub fn verify(&self) -> StoreResult<()> {
        let map = self.posts.read().expect("lock poisoned");
        for (address, post) in map.iter() {
            let data = post.canonical_bytes(usize::MAX)?;
            if !ContentHasher::POST.verify(&data, address) {
                return Err(StoreError::HashMismatch(*address));
            }
        }
        Ok(())
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, post: &Post) -> StoreResult<Address> {
        let data = post.canonical_bytes(self.max_post_bytes)?;
        let address = ContentHasher::POST.hash(&data);
        let mut map = self.posts.write().expect("lock poisoned");
        if !map.contains_key(&address) {
            map.insert(address, post.clone());
            debug!(address = %address.short(), base = %post.base, bytes = data.len(), "post stored");
        }
        Ok(address)
    }

    fn put_replicated(&self, address: Address, post: &Post) -> StoreResult<bool> {
        let mut map = self.posts.write().expect("lock poisoned");
        if map.contains_key(&address) {
            return Ok(false);
        }
        map.insert(address, post.clone());
        debug!(address = %address.short(), base = %post.base, "replicated post stored");
        Ok(true)
    }

    fn get(&self, address: &Address) -> StoreResult<Option<Post>> {
        let map = self.posts.read().expect("lock poisoned");
        Ok(map.get(address).cloned())
    }

    fn contains(&self, address: &Address) -> StoreResult<bool> {
        let map = self.posts.read().expect("lock poisoned");
        Ok(map.contains_key(address))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("post_count", &self.len())
            .field("max_post_bytes", &self.max_post_bytes)
            .finish()
    }
}

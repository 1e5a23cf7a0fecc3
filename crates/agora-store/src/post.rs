use agora_crypto::ContentHasher;
use agora_types::{Address, AgentId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Largest accepted canonical encoding, in bytes.
pub const DEFAULT_MAX_POST_BYTES: usize = 64 * 1024;

/// An immutable post.
///
/// The field order below is the canonical encoding order: the address is the
/// `agora-post-v1` BLAKE3 hash of this struct's JSON encoding, and serde_json
/// writes struct fields in declaration order. Reordering, renaming, or adding
/// fields changes every address in the system.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub details: String,
    pub post_type: String,
    pub announcement: bool,
    pub timestamp: String,
    pub base: String,
}

impl Post {
    /// A post with a title and base; every other field empty.
    pub fn new(title: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: String::new(),
            post_type: String::new(),
            announcement: false,
            timestamp: String::new(),
            base: base.into(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_type(mut self, post_type: impl Into<String>) -> Self {
        self.post_type = post_type.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn announce(mut self) -> Self {
        self.announcement = true;
        self
    }

    /// Canonical bytes, after validation.
    pub fn canonical_bytes(&self, max_bytes: usize) -> StoreResult<Vec<u8>> {
        if self.base.is_empty() {
            return Err(StoreError::Encoding("base must not be empty".into()));
        }
        let data = serde_json::to_vec(self).map_err(|e| StoreError::Encoding(e.to_string()))?;
        if data.len() > max_bytes {
            return Err(StoreError::Encoding(format!(
                "encoded post is {} bytes, limit is {max_bytes}",
                data.len()
            )));
        }
        Ok(data)
    }

    /// The post's content address under the default size limit.
    pub fn address(&self) -> StoreResult<Address> {
        let data = self.canonical_bytes(DEFAULT_MAX_POST_BYTES)?;
        Ok(ContentHasher::POST.hash(&data))
    }

    /// Attach the address and author for returning to callers.
    pub fn with_address(self, address: Address, author: AgentId) -> PostWithAddress {
        PostWithAddress {
            address,
            author,
            post: self,
        }
    }
}

/// A post as returned by reads: content plus its address and the agent that
/// linked it into its base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithAddress {
    pub address: Address,
    pub author: AgentId,
    #[serde(flatten)]
    pub post: Post,
}

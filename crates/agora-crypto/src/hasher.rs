use agora_types::Address;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation. A post and a base anchor built from identical bytes still
/// produce different addresses.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for the canonical encoding of a post.
    pub const POST: Self = Self {
        domain: "agora-post-v1",
    };
    /// Hasher for base anchor strings.
    pub const BASE: Self = Self {
        domain: "agora-base-v1",
    };
    /// Hasher for link identity tuples.
    pub const LINK: Self = Self {
        domain: "agora-link-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Address {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Address::from_digest(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value's JSON encoding with domain separation.
    ///
    /// serde_json emits struct fields in declaration order, which makes the
    /// encoding canonical for plain structs.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<Address, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected address.
    pub fn verify(&self, data: &[u8], expected: &Address) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Anchor address of a base.
///
/// Bases are free-form keys, not stored entities. The anchor gives the base
/// end of an adjacency edge the same shape as the post end.
pub fn base_anchor(base: &str) -> Address {
    ContentHasher::BASE.hash(base.as_bytes())
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            ContentHasher::POST.hash(b"hello"),
            ContentHasher::POST.hash(b"hello")
        );
    }

    #[test]
    fn domains_are_separated() {
        let data = b"community1";
        let post = ContentHasher::POST.hash(data);
        let base = ContentHasher::BASE.hash(data);
        let link = ContentHasher::LINK.hash(data);
        assert_ne!(post, base);
        assert_ne!(post, link);
        assert_ne!(base, link);
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::POST.hash(b"original");
        assert!(ContentHasher::POST.verify(b"original", &id));
        assert!(!ContentHasher::POST.verify(b"tampered", &id));
    }

    #[test]
    fn hash_json_follows_field_order() {
        #[derive(serde::Serialize)]
        struct Pair {
            a: u8,
            b: u8,
        }
        let id = ContentHasher::POST.hash_json(&Pair { a: 1, b: 2 }).unwrap();
        assert_eq!(id, ContentHasher::POST.hash(br#"{"a":1,"b":2}"#));
    }

    #[test]
    fn base_anchor_is_stable() {
        assert_eq!(base_anchor("community1"), base_anchor("community1"));
        assert_ne!(base_anchor("community1"), base_anchor("community2"));
        assert_eq!(base_anchor("x"), ContentHasher::BASE.hash(b"x"));
    }

    #[test]
    fn custom_domain() {
        let hasher = ContentHasher::new("agora-test-v1");
        assert_eq!(hasher.domain(), "agora-test-v1");
        assert_ne!(hasher.hash(b"data"), ContentHasher::POST.hash(b"data"));
    }
}

use std::fmt;

use agora_crypto::ContentHasher;
use agora_links::{Link, LinkId};
use agora_store::Post;
use agora_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{FabricError, FabricResult};

const UNIT_HASHER: ContentHasher = ContentHasher::new("agora-unit-v1");

/// Content-derived identifier of a propagation unit.
///
/// Two replicas holding the same unit compute the same id, which is what
/// anti-entropy compares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId([u8; 32]);

impl UnitId {
    /// Id of the post unit carrying `address`.
    pub fn for_post(address: &Address) -> Self {
        Self::tagged(b"post:", address.as_bytes())
    }

    /// Id of the link unit carrying the link with `id`.
    pub fn for_link(id: &LinkId) -> Self {
        Self::tagged(b"link:", id.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    fn tagged(tag: &[u8], body: &[u8; 32]) -> Self {
        let mut data = Vec::with_capacity(tag.len() + 32);
        data.extend_from_slice(tag);
        data.extend_from_slice(body);
        Self(*UNIT_HASHER.hash(&data).as_bytes())
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.short_hex())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit:{}", self.short_hex())
    }
}

/// What a replica ships to its peers.
///
/// One `create` emits a `Post` unit followed by a `Link` unit; the transport
/// may deliver them in either order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropagationUnit {
    Post { address: Address, post: Post },
    Link(Link),
}

impl PropagationUnit {
    /// Wrap a post, computing its address. Size limits are a local write
    /// policy and do not apply here.
    pub fn post(post: Post) -> FabricResult<Self> {
        let data = post
            .canonical_bytes(usize::MAX)
            .map_err(|e| FabricError::Serialization(e.to_string()))?;
        let address = ContentHasher::POST.hash(&data);
        Ok(Self::Post { address, post })
    }

    pub fn id(&self) -> UnitId {
        match self {
            Self::Post { address, .. } => UnitId::for_post(address),
            Self::Link(link) => UnitId::for_link(&link.id()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Post { .. } => "post",
            Self::Link(_) => "link",
        }
    }

    /// Check a received post unit against its content. Links carry no
    /// derived fields and always pass.
    pub fn verify(&self) -> FabricResult<()> {
        if let Self::Post { address, post } = self {
            let data = post
                .canonical_bytes(usize::MAX)
                .map_err(|e| FabricError::Serialization(e.to_string()))?;
            let computed = ContentHasher::POST.hash(&data);
            if computed != *address {
                return Err(FabricError::AddressMismatch {
                    carried: *address,
                    computed,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{AgentId, TemporalAnchor};

    fn post(title: &str) -> Post {
        Post {
            title: title.into(),
            details: "d".into(),
            post_type: "t".into(),
            announcement: true,
            timestamp: String::new(),
            base: "community1".into(),
        }
    }

    fn link(target: Address) -> Link {
        Link {
            base: "community1".into(),
            target,
            sequence: 1,
            origin: AgentId::named("alice"),
            stamp: TemporalAnchor::new(10, 0, 1),
        }
    }

    #[test]
    fn post_unit_carries_its_address() {
        let p = post("hello");
        let unit = PropagationUnit::post(p.clone()).unwrap();
        match &unit {
            PropagationUnit::Post { address, .. } => assert_eq!(*address, p.address().unwrap()),
            other => panic!("unexpected unit {other:?}"),
        }
        unit.verify().unwrap();
    }

    #[test]
    fn ids_separate_kinds() {
        let unit = PropagationUnit::post(post("x")).unwrap();
        let PropagationUnit::Post { address, .. } = unit.clone() else {
            unreachable!()
        };
        assert_ne!(unit.id(), PropagationUnit::Link(link(address)).id());
    }

    #[test]
    fn link_unit_id_ignores_stamp() {
        let target = Address::digest_of(b"p");
        let a = link(target);
        let mut b = a.clone();
        b.stamp = TemporalAnchor::new(99, 9, 9);
        assert_eq!(
            PropagationUnit::Link(a).id(),
            PropagationUnit::Link(b).id()
        );
    }

    #[test]
    fn tampered_post_fails_verification() {
        let unit = PropagationUnit::Post {
            address: Address::digest_of(b"not the content"),
            post: post("real"),
        };
        assert!(matches!(unit.verify(), Err(FabricError::AddressMismatch { .. })));
    }

    #[test]
    fn bincode_roundtrip() {
        let unit = PropagationUnit::Link(link(Address::digest_of(b"p")));
        let bytes = bincode::serialize(&unit).unwrap();
        let back: PropagationUnit = bincode::deserialize(&bytes).unwrap();
        assert_eq!(unit, back);
    }

    #[test]
    fn oversized_post_still_forms_a_unit() {
        let mut big = post("big");
        big.details = "d".repeat(agora_store::DEFAULT_MAX_POST_BYTES);
        let unit = PropagationUnit::post(big).unwrap();
        unit.verify().unwrap();
    }

    #[test]
    fn display() {
        let id = PropagationUnit::Link(link(Address::digest_of(b"p"))).id();
        assert!(id.to_string().starts_with("unit:"));
        assert_eq!(PropagationUnit::post(post("k")).unwrap().kind(), "post");
    }
}

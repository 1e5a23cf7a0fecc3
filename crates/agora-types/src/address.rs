use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Multihash code for BLAKE3.
const MULTIHASH_BLAKE3: u8 = 0x1e;
/// Digest length carried in the multihash header.
const DIGEST_LEN: u8 = 0x20;

/// Length of the external (base58) representation of every [`Address`].
///
/// The multihash header `0x1e 0x20` pins the encoded value between
/// `58^45` and `58^46`, so the encoding is always exactly this long.
pub const ADDRESS_LEN: usize = 46;

/// Content address of a post or base anchor.
///
/// Wraps a 32-byte BLAKE3 digest. Externally an address is the base58btc
/// encoding of the multihash `[0x1e, 0x20, digest..]`, a fixed-length token
/// that stays stable for the lifetime of the system. Two replicas that hash
/// the same canonical bytes always agree on the address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Wrap a pre-computed digest.
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// Hash raw bytes without domain separation.
    ///
    /// Production addresses come from `agora_crypto::ContentHasher`; this
    /// is for tests and fixtures.
    pub fn digest_of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The 34-byte multihash (`code`, `length`, digest).
    pub fn to_multihash(&self) -> [u8; 34] {
        let mut out = [0u8; 34];
        out[0] = MULTIHASH_BLAKE3;
        out[1] = DIGEST_LEN;
        out[2..].copy_from_slice(&self.0);
        out
    }

    /// Canonical external representation (46 base58 characters).
    pub fn encode(&self) -> String {
        bs58::encode(self.to_multihash()).into_string()
    }

    /// Parse the canonical external representation.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.len() != ADDRESS_LEN {
            return Err(TypeError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: s.len(),
            });
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TypeError::InvalidBase58(e.to_string()))?;
        if bytes.len() != 34 {
            return Err(TypeError::InvalidLength {
                expected: 34,
                actual: bytes.len(),
            });
        }
        if bytes[0] != MULTIHASH_BLAKE3 || bytes[1] != DIGEST_LEN {
            return Err(TypeError::InvalidMultihash {
                code: bytes[0],
                length: bytes[1],
            });
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[2..]);
        Ok(Self(digest))
    }

    /// Short form for logs: the last 8 characters of the encoding.
    ///
    /// The leading characters are shared by every address (multihash
    /// header), so the tail is the distinguishing part.
    pub fn short(&self) -> String {
        let full = self.encode();
        full[ADDRESS_LEN - 8..].to_string()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(..{})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl From<[u8; 32]> for Address {
    fn from(digest: [u8; 32]) -> Self {
        Self(digest)
    }
}

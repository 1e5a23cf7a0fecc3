//! Content hashing for Agora.
//!
//! Every address in the system comes out of a domain-separated BLAKE3
//! [`ContentHasher`]. Domain tags keep post addresses, base anchors, and link
//! ids from colliding even when their input bytes coincide.
//!
//! All hashing wraps the `blake3` crate; there is no custom cryptography.

pub mod hasher;

pub use hasher::{base_anchor, ContentHasher, HasherError};

//! Cryptographic primitives for UpChain.
//!
//! Provides SHA-256 hashing (whole-buffer and chunked streaming), the
//! canonical JSON encoding used as block hash input, and hash chain
//! verification.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::to_canonical_vec;
pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::{HasherError, Sha256Hasher, DEFAULT_CHUNK_SIZE};

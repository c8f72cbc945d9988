use upchain_types::HexDigest;

use crate::hasher::{HasherError, Sha256Hasher};

/// Trait for entries that participate in a hash chain.
pub trait ChainLink {
    /// The entry's own stored hash.
    fn link_hash(&self) -> &HexDigest;
    /// The stored hash of the entry this one claims as predecessor.
    fn prev_link(&self) -> &HexDigest;
    /// Canonical payload bytes the stored hash was computed over.
    fn payload_bytes(&self) -> Result<Vec<u8>, HasherError>;
}

/// Hash chain integrity verifier.
///
/// The first entry is the root of the chain and is taken on trust. Every
/// later entry must hash to its stored value and must name its immediate
/// predecessor's stored hash as `prev_link`.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, stopping at the first defect.
    ///
    /// For each entry after the root, checks (in order):
    /// 1. the stored hash matches the hash recomputed from the payload
    /// 2. the stored predecessor hash matches the previous entry's hash
    pub fn verify_chain(links: &[impl ChainLink]) -> Result<(), ChainError> {
        for i in 1..links.len() {
            if !Self::hash_matches(&links[i])? {
                return Err(ChainError::HashMismatch { index: i });
            }
            if links[i].prev_link() != links[i - 1].link_hash() {
                return Err(ChainError::BrokenLink { index: i });
            }
        }
        Ok(())
    }

    /// Recompute an entry's hash from its payload and compare with the stored hash.
    pub fn hash_matches(link: &impl ChainLink) -> Result<bool, ChainError> {
        let payload = link.payload_bytes().map_err(ChainError::Payload)?;
        Ok(Self::compute_hash(&payload) == *link.link_hash())
    }

    /// Compute the hash for a canonical payload.
    pub fn compute_hash(payload: &[u8]) -> HexDigest {
        Sha256Hasher::digest(payload)
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("broken link at index {index}: prev_hash does not match")]
    BrokenLink { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },

    #[error("could not encode entry payload: {0}")]
    Payload(HasherError),
}

impl ChainError {
    /// Index of the offending entry, when the defect is tied to one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::BrokenLink { index } | Self::HashMismatch { index } => Some(*index),
            Self::Payload(_) => None,
        }
    }
}

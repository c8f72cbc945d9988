use serde::{Deserialize, Serialize};
use upchain_crypto::{to_canonical_vec, ChainLink, HashChainVerifier, HasherError};
use upchain_types::{BlockTimestamp, HexDigest, OwnerId};

use crate::error::LedgerError;

/// File name recorded on the genesis block.
pub const GENESIS_FILE_NAME: &str = "genesis";

/// A single ledger entry.
///
/// `hash` binds `index`, `prev_hash`, `timestamp`, `owner_id`, and `file_path`.
/// `file_name` is carried for display only and is not covered by the hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: BlockTimestamp,
    pub owner_id: OwnerId,
    pub file_name: String,
    pub file_path: String,
    pub prev_hash: HexDigest,
    pub hash: HexDigest,
}

/// Hash input. Field names are the wire keys; the canonical encoder sorts them.
#[derive(Serialize)]
struct BlockPreimage<'a> {
    file_path: &'a str,
    index: u64,
    prev_hash: &'a str,
    timestamp: String,
    user_id: u64,
}

impl Block {
    /// The chain root: index 0, owner 0, predecessor `"0"`, empty path.
    pub fn genesis(timestamp: BlockTimestamp) -> Result<Self, LedgerError> {
        Self::seal(
            0,
            timestamp,
            OwnerId::GENESIS,
            GENESIS_FILE_NAME.to_string(),
            String::new(),
            HexDigest::zero(),
        )
    }

    /// Build a block and compute its hash.
    pub fn seal(
        index: u64,
        timestamp: BlockTimestamp,
        owner_id: OwnerId,
        file_name: String,
        file_path: String,
        prev_hash: HexDigest,
    ) -> Result<Self, LedgerError> {
        let hash = Self::compute_hash(index, &prev_hash, &timestamp, owner_id, &file_path)?;
        Ok(Self {
            index,
            timestamp,
            owner_id,
            file_name,
            file_path,
            prev_hash,
            hash,
        })
    }

    /// Hash the canonical encoding of the bound fields.
    pub fn compute_hash(
        index: u64,
        prev_hash: &HexDigest,
        timestamp: &BlockTimestamp,
        owner_id: OwnerId,
        file_path: &str,
    ) -> Result<HexDigest, LedgerError> {
        let bytes = preimage(index, prev_hash, timestamp, owner_id, file_path)?;
        Ok(HashChainVerifier::compute_hash(&bytes))
    }

    /// Recompute this block's hash from its stored fields.
    pub fn recompute_hash(&self) -> Result<HexDigest, LedgerError> {
        Self::compute_hash(
            self.index,
            &self.prev_hash,
            &self.timestamp,
            self.owner_id,
            &self.file_path,
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

fn preimage(
    index: u64,
    prev_hash: &HexDigest,
    timestamp: &BlockTimestamp,
    owner_id: OwnerId,
    file_path: &str,
) -> Result<Vec<u8>, HasherError> {
    to_canonical_vec(&BlockPreimage {
        file_path,
        index,
        prev_hash: prev_hash.as_str(),
        timestamp: timestamp.canonical(),
        user_id: owner_id.get(),
    })
}

impl ChainLink for Block {
    fn link_hash(&self) -> &HexDigest {
        &self.hash
    }

    fn prev_link(&self) -> &HexDigest {
        &self.prev_hash
    }

    fn payload_bytes(&self) -> Result<Vec<u8>, HasherError> {
        preimage(
            self.index,
            &self.prev_hash,
            &self.timestamp,
            self.owner_id,
            &self.file_path,
        )
    }
}

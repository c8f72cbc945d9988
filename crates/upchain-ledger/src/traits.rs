use upchain_types::{HexDigest, OwnerId};

use crate::block::Block;
use crate::error::LedgerError;

/// Write boundary for ledger append operations.
pub trait LedgerWriter: Send + Sync {
    /// Hash of the last block, or `"0"` for an empty chain.
    fn previous_hash(&self) -> HexDigest;

    /// Append a block that names `prev_hash` as its predecessor.
    ///
    /// The predecessor is taken as given. A stale value is accepted and only
    /// shows up later as a broken link during validation.
    fn append(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        prev_hash: HexDigest,
    ) -> Result<HexDigest, LedgerError>;

    /// Read the head hash and append on top of it as one atomic step.
    fn append_next(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
    ) -> Result<Block, LedgerError>;
}

/// Read boundary for ledger queries and validation.
pub trait LedgerReader: Send + Sync {
    /// Number of blocks, genesis included.
    fn block_count(&self) -> u64;

    fn block(&self, index: u64) -> Option<Block>;

    /// The last block, if any.
    fn head(&self) -> Option<Block>;

    /// Snapshot of the whole chain in index order.
    fn read_all(&self) -> Vec<Block>;

    fn read_owner(&self, owner_id: OwnerId) -> Vec<Block> {
        self.read_all()
            .into_iter()
            .filter(|b| !b.is_genesis() && b.owner_id == owner_id)
            .collect()
    }
}

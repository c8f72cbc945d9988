use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use upchain_crypto::HashChainVerifier;
use upchain_types::{BlockTimestamp, HexDigest, OwnerId};

use crate::block::Block;
use crate::error::LedgerError;
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{StreamValidator, ValidationReport};

/// In-memory upload ledger.
///
/// All blocks live behind one `RwLock`. Appends take the write lock for the
/// whole "read head, build block, push" sequence, so two concurrent
/// [`append_next`](Ledger::append_next) calls can never claim the same
/// predecessor. Every mutation is a single `Vec::push`, so a poisoned lock
/// still guards a consistent chain and is recovered from.
pub struct Ledger {
    chain: RwLock<Vec<Block>>,
}

impl Ledger {
    /// Create a ledger holding a fresh genesis block stamped with the current time.
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_genesis(Block::genesis(BlockTimestamp::now())?)
    }

    /// Create a ledger rooted at the given genesis block.
    pub fn with_genesis(genesis: Block) -> Result<Self, LedgerError> {
        Self::from_blocks(vec![genesis])
    }

    /// Rebuild a ledger from previously recorded blocks.
    ///
    /// Blocks are taken verbatim; call [`validate`](Ledger::validate) to
    /// check what was restored.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, LedgerError> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(Self {
            chain: RwLock::new(blocks),
        })
    }

    /// Hash of the last block. `"0"` only for an empty chain.
    pub fn previous_hash(&self) -> HexDigest {
        last_hash(&self.read())
    }

    /// Append a block naming `prev_hash` as predecessor. Returns the new hash.
    pub fn append(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        prev_hash: HexDigest,
    ) -> Result<HexDigest, LedgerError> {
        self.insert(owner_id, file_name, file_path, Some(prev_hash), |_| Ok(()))
            .map(|block| block.hash)
    }

    /// Append on top of the current head under a single write lock.
    pub fn append_next(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
    ) -> Result<Block, LedgerError> {
        self.insert(owner_id, file_name, file_path, None, |_| Ok(()))
    }

    /// Like [`append_next`](Ledger::append_next), but hands the sealed block to
    /// `persist` while the write lock is still held. The block joins the chain
    /// only if `persist` succeeds.
    pub fn append_next_with<F>(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        persist: F,
    ) -> Result<Block, LedgerError>
    where
        F: FnOnce(&Block) -> Result<(), LedgerError>,
    {
        self.insert(owner_id, file_name, file_path, None, persist)
    }

    /// Like [`append`](Ledger::append), with the same persistence hook as
    /// [`append_next_with`](Ledger::append_next_with).
    pub fn append_with<F>(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        prev_hash: HexDigest,
        persist: F,
    ) -> Result<Block, LedgerError>
    where
        F: FnOnce(&Block) -> Result<(), LedgerError>,
    {
        self.insert(owner_id, file_name, file_path, Some(prev_hash), persist)
    }

    /// `true` when every block after genesis rehashes to its stored hash and
    /// links to the hash of the block before it.
    pub fn is_valid(&self) -> bool {
        HashChainVerifier::verify_chain(&self.read()[..]).is_ok()
    }

    /// Full validation report covering every block, genesis included.
    pub fn validate(&self) -> ValidationReport {
        StreamValidator::validate_blocks(&self.read())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn insert<F>(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        prev_hash: Option<HexDigest>,
        persist: F,
    ) -> Result<Block, LedgerError>
    where
        F: FnOnce(&Block) -> Result<(), LedgerError>,
    {
        let mut chain = self.write();
        let prev_hash = prev_hash.unwrap_or_else(|| last_hash(&chain));
        let block = Block::seal(
            chain.len() as u64,
            BlockTimestamp::now(),
            owner_id,
            file_name.to_string(),
            file_path.to_string(),
            prev_hash,
        )?;

        persist(&block)?;
        chain.push(block.clone());

        debug!(
            index = block.index,
            owner = %block.owner_id,
            hash = block.hash.short(),
            prev = block.prev_hash.short(),
            "ledger append"
        );
        Ok(block)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Block>> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Block>> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn last_hash(chain: &[Block]) -> HexDigest {
    chain
        .last()
        .map(|b| b.hash.clone())
        .unwrap_or_else(HexDigest::zero)
}

impl LedgerWriter for Ledger {
    fn previous_hash(&self) -> HexDigest {
        Ledger::previous_hash(self)
    }

    fn append(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        prev_hash: HexDigest,
    ) -> Result<HexDigest, LedgerError> {
        Ledger::append(self, owner_id, file_name, file_path, prev_hash)
    }

    fn append_next(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
    ) -> Result<Block, LedgerError> {
        Ledger::append_next(self, owner_id, file_name, file_path)
    }
}

impl LedgerReader for Ledger {
    fn block_count(&self) -> u64 {
        self.read().len() as u64
    }

    fn block(&self, index: u64) -> Option<Block> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.read().get(i).cloned())
    }

    fn head(&self) -> Option<Block> {
        self.read().last().cloned()
    }

    fn read_all(&self) -> Vec<Block> {
        self.read().clone()
    }
}

use std::path::Path;

use tracing::{info, warn};
use upchain_ledger::{Block, Ledger, LedgerError, LedgerReader, LedgerWriter, ValidationReport};
use upchain_types::{HexDigest, OwnerId};

use crate::error::Result;
use crate::journal::{BlockJournal, JournalConfig};

/// A [`Ledger`] whose appends are written to a [`BlockJournal`] first.
///
/// A block joins the in-memory chain only after its journal entry has been
/// written, and both happen under the ledger's write lock, so journal order
/// always matches chain order.
pub struct DurableLedger {
    ledger: Ledger,
    journal: BlockJournal,
}

impl DurableLedger {
    /// Open the journal at `path` and rebuild the chain it records.
    ///
    /// An empty or new journal gets a fresh genesis block, as does one in which
    /// no entry survives its checksum (logged as a warning). A recovered chain
    /// that fails validation is still loaded as-is, with a warning.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self> {
        let journal = BlockJournal::open(path, config)?;
        let recovered = journal.recover()?;

        let ledger = if recovered.is_empty() {
            if journal.offset() > 0 {
                warn!(
                    path = %path.display(),
                    bytes = journal.offset(),
                    "no intact block in non-empty journal; starting a new chain after it"
                );
            }
            let ledger = Ledger::new()?;
            let genesis = ledger.read_all();
            for block in &genesis {
                journal.append(block)?;
            }
            info!(path = %path.display(), "started new journal");
            ledger
        } else {
            let ledger = Ledger::from_blocks(recovered)?;
            let report = ledger.validate();
            if report.is_valid() {
                info!(path = %path.display(), blocks = report.block_count, "recovered chain from journal");
            } else {
                warn!(
                    path = %path.display(),
                    blocks = report.block_count,
                    violations = report.violations.len(),
                    first = ?report.first_violation(),
                    "recovered chain fails validation"
                );
            }
            ledger
        };

        Ok(Self { ledger, journal })
    }

    /// The in-memory chain.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn journal(&self) -> &BlockJournal {
        &self.journal
    }

    pub fn is_valid(&self) -> bool {
        self.ledger.is_valid()
    }

    pub fn validate(&self) -> ValidationReport {
        self.ledger.validate()
    }

    fn persist(&self, block: &Block) -> std::result::Result<(), LedgerError> {
        self.journal
            .append(block)
            .map(|_| ())
            .map_err(|e| LedgerError::Persistence(e.to_string()))
    }
}

impl LedgerWriter for DurableLedger {
    fn previous_hash(&self) -> HexDigest {
        self.ledger.previous_hash()
    }

    fn append(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
        prev_hash: HexDigest,
    ) -> std::result::Result<HexDigest, LedgerError> {
        self.ledger
            .append_with(owner_id, file_name, file_path, prev_hash, |b| self.persist(b))
            .map(|block| block.hash)
    }

    fn append_next(
        &self,
        owner_id: OwnerId,
        file_name: &str,
        file_path: &str,
    ) -> std::result::Result<Block, LedgerError> {
        self.ledger
            .append_next_with(owner_id, file_name, file_path, |b| self.persist(b))
    }
}

impl LedgerReader for DurableLedger {
    fn block_count(&self) -> u64 {
        self.ledger.block_count()
    }

    fn block(&self, index: u64) -> Option<Block> {
        self.ledger.block(index)
    }

    fn head(&self) -> Option<Block> {
        self.ledger.head()
    }

    fn read_all(&self) -> Vec<Block> {
        self.ledger.read_all()
    }
}

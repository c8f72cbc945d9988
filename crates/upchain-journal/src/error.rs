use std::io;

use upchain_ledger::LedgerError;

/// Errors produced by the block journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A block could not be encoded for the journal.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An entry is larger than the `u32` length prefix can describe.
    #[error("journal entry of {0} bytes is too large")]
    EntryTooLarge(usize),

    /// A damaged entry is followed by intact ones, so the file cannot be
    /// appended to without losing them.
    #[error("journal {path} is corrupt at offset {offset}; intact entries follow")]
    Corrupt { path: String, offset: u64 },

    /// A failed append could not be rolled back; the journal refuses writes.
    #[error("journal is unwritable after a failed append at offset {0}")]
    Unwritable(u64),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, JournalError>;

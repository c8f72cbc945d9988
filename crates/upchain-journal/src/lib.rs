//! Opt-in durability for the UpChain ledger.
//!
//! Blocks are appended to a single-file write-ahead journal, each entry framed
//! with a length prefix and a CRC32 checksum. On startup the journal is read
//! back and the in-memory chain rebuilt from it. Nothing here runs unless a
//! journal path is configured.

pub mod durable;
pub mod error;
pub mod journal;

pub use durable::DurableLedger;
pub use error::{JournalError, Result};
pub use journal::{BlockJournal, JournalConfig, SyncMode};

//! Append-only upload ledger for UpChain.
//!
//! This crate is the heart of UpChain. It provides:
//! - [`Block`] with its canonical hash preimage
//! - [`Ledger`], the in-memory chain guarded by a single lock
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - Chain validation reports (hash chain, index continuity, genesis shape)

pub mod block;
pub mod error;
pub mod memory;
pub mod traits;
pub mod validation;

pub use block::Block;
pub use error::LedgerError;
pub use memory::Ledger;
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{StreamValidator, ValidationReport, Violation, ViolationKind};

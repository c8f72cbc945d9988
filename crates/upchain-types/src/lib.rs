//! Foundation types for UpChain.
//!
//! This crate provides the identity, digest, and temporal types shared by the
//! ledger, the fingerprinter, and the upload service.
//!
//! # Key Types
//!
//! - [`HexDigest`]: Lowercase hex SHA-256 digest, or the `"0"` genesis sentinel
//! - [`OwnerId`]: Identifier of the user that uploaded a file
//! - [`BlockTimestamp`]: Microsecond-precision UTC instant with a fixed textual form

pub mod digest;
pub mod error;
pub mod owner;
pub mod temporal;

pub use digest::HexDigest;
pub use error::TypeError;
pub use owner::OwnerId;
pub use temporal::BlockTimestamp;

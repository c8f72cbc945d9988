//! Content fingerprinting for UpChain.
//!
//! A fingerprint is the SHA-256 digest of a file's extracted text when the
//! declared type is text-bearing (plain text, PDF, Word), so re-encoding a
//! document without changing its visible text keeps the same fingerprint.
//! Any other type, and any extraction failure, falls back to hashing the raw
//! bytes.

pub mod error;
pub mod extractor;
pub mod fingerprinter;
pub mod kind;

pub use error::{ExtractError, FingerprintError};
pub use extractor::{PdfExtractor, PlainTextExtractor, TextExtractor, WordExtractor};
pub use fingerprinter::{ContentFingerprinter, DigestBasis, Fingerprint};
pub use kind::DocumentKind;

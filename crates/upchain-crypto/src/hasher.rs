use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use upchain_types::HexDigest;

/// Read size used when streaming files through the hasher.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Incremental SHA-256 hasher producing [`HexDigest`] values.
///
/// Feeding the same bytes in any split yields the same digest, so callers can
/// stream files of arbitrary size without holding them in memory.
#[derive(Clone, Default)]
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> HexDigest {
        HexDigest::from_bytes(self.inner.finalize().into())
    }

    /// One-shot digest of a byte slice.
    pub fn digest(data: &[u8]) -> HexDigest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Digest everything a reader yields, reading `chunk_size` bytes at a time.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn digest_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<HexDigest> {
        let mut hasher = Self::new();
        let mut buf = vec![0u8; chunk_size.max(1)];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize())
    }

    /// Digest the raw bytes of a file.
    pub fn digest_file(path: &Path, chunk_size: usize) -> io::Result<HexDigest> {
        let file = File::open(path)?;
        Self::digest_reader(file, chunk_size)
    }

    /// Verify that data produces the expected digest.
    pub fn verify(data: &[u8], expected: &HexDigest) -> bool {
        Self::digest(data) == *expected
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

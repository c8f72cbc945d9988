use std::io;
use std::path::PathBuf;

/// Why text extraction gave up. Never escapes the fingerprinter.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("file is not valid UTF-8")]
    InvalidUtf8,

    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("extractor panicked")]
    Panicked,
}

/// Errors surfaced by the fingerprinter.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// The raw-byte stage could not read the file.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FingerprintError {
    /// Underlying I/O error kind.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::Io { source, .. } => source.kind(),
        }
    }
}

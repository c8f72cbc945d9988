use std::fmt;

use serde::{Deserialize, Serialize};

/// Text-bearing document formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PlainText,
    Pdf,
    /// `.doc`
    LegacyWord,
    /// `.docx`
    Word,
}

impl DocumentKind {
    pub const ALL: [Self; 4] = [Self::PlainText, Self::Pdf, Self::LegacyWord, Self::Word];

    /// Map a declared extension to a text-bearing kind.
    ///
    /// Case-insensitive; a leading dot is ignored. Returns `None` for formats
    /// that are hashed as raw bytes.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::LegacyWord),
            "docx" => Some(Self::Word),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Pdf => "pdf",
            Self::LegacyWord => "doc",
            Self::Word => "docx",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

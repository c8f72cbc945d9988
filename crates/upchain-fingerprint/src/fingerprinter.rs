use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde::Serialize;
use tracing::debug;
use upchain_crypto::{Sha256Hasher, DEFAULT_CHUNK_SIZE};
use upchain_types::HexDigest;

use crate::error::{ExtractError, FingerprintError};
use crate::extractor::{PdfExtractor, PlainTextExtractor, TextExtractor, WordExtractor};
use crate::kind::DocumentKind;

/// What a digest was computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "basis", content = "kind", rename_all = "snake_case")]
pub enum DigestBasis {
    /// UTF-8 bytes of the text extracted from a document of this kind.
    ExtractedText(DocumentKind),
    /// The file's bytes as stored.
    RawBytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fingerprint {
    pub digest: HexDigest,
    #[serde(flatten)]
    pub basis: DigestBasis,
}

/// Computes content fingerprints.
///
/// Text-bearing types are routed to the registered extractor for their
/// [`DocumentKind`]. If the extractor fails, for any reason, the raw bytes are
/// hashed instead. Only a failure to read the file at that stage is reported.
pub struct ContentFingerprinter {
    chunk_size: usize,
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl Default for ContentFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentFingerprinter {
    /// Fingerprinter with the built-in extractors and a 4096-byte read size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            extractors: vec![
                Box::new(PlainTextExtractor),
                Box::new(PdfExtractor),
                Box::new(WordExtractor::legacy()),
                Box::new(WordExtractor::word()),
            ],
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Register an extractor, replacing any existing one for the same kind.
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        let kind = extractor.kind();
        self.extractors.retain(|e| e.kind() != kind);
        self.extractors.push(extractor);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fingerprint `path`, treating it as a file of type `ext`.
    pub fn fingerprint(&self, path: &Path, ext: &str) -> Result<HexDigest, FingerprintError> {
        self.fingerprint_detailed(path, ext).map(|f| f.digest)
    }

    /// Like [`fingerprint`](Self::fingerprint), also reporting which stage
    /// produced the digest.
    pub fn fingerprint_detailed(&self, path: &Path, ext: &str) -> Result<Fingerprint, FingerprintError> {
        if let Some(kind) = DocumentKind::from_extension(ext) {
            if let Some(extractor) = self.extractor_for(kind) {
                match run_guarded(extractor, path) {
                    Ok(text) => {
                        return Ok(Fingerprint {
                            digest: Sha256Hasher::digest(text.as_bytes()),
                            basis: DigestBasis::ExtractedText(kind),
                        });
                    }
                    Err(e) => {
                        debug!(path = %path.display(), %kind, error = %e, "text extraction failed, hashing raw bytes");
                    }
                }
            }
        }

        let digest = Sha256Hasher::digest_file(path, self.chunk_size).map_err(|source| FingerprintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Fingerprint {
            digest,
            basis: DigestBasis::RawBytes,
        })
    }

    fn extractor_for(&self, kind: DocumentKind) -> Option<&dyn TextExtractor> {
        self.extractors.iter().find(|e| e.kind() == kind).map(|e| e.as_ref())
    }
}

/// Parsers for untrusted documents may panic; treat that as a failed extraction.
fn run_guarded(extractor: &dyn TextExtractor, path: &Path) -> Result<String, ExtractError> {
    panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(path))).unwrap_or(Err(ExtractError::Panicked))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use super::*;
    use crate::extractor::fixtures::{write_docx, write_pdf};

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn text_file_hashes_its_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "hello world").unwrap();

        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "txt").unwrap();
        assert_eq!(fp.digest.as_str(), HELLO_WORLD);
        assert_eq!(fp.basis, DigestBasis::ExtractedText(DocumentKind::PlainText));
    }

    #[test]
    fn crlf_is_not_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crlf.txt");
        fs::write(&path, "a\r\nb").unwrap();
        let digest = ContentFingerprinter::new().fingerprint(&path, "txt").unwrap();
        assert_eq!(digest, Sha256Hasher::digest(b"a\r\nb"));
    }

    #[test]
    fn empty_file_hashes_to_empty_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        fs::write(&path, b"").unwrap();
        let digest = ContentFingerprinter::new().fingerprint(&path, "png").unwrap();
        assert_eq!(digest.as_str(), EMPTY);
    }

    #[test]
    fn binary_types_hash_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.jpg");
        let bytes: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &bytes).unwrap();

        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "jpg").unwrap();
        assert_eq!(fp.digest, Sha256Hasher::digest(&bytes));
        assert_eq!(fp.basis, DigestBasis::RawBytes);
    }

    #[test]
    fn invalid_utf8_text_falls_back_to_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        let bytes = b"caf\xe9";
        fs::write(&path, bytes).unwrap();

        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "txt").unwrap();
        assert_eq!(fp.digest, Sha256Hasher::digest(bytes));
        assert_eq!(fp.basis, DigestBasis::RawBytes);
    }

    #[test]
    fn corrupt_documents_fall_back_to_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ["pdf", "doc", "docx"] {
            let path = dir.path().join(format!("broken.{ext}"));
            fs::write(&path, b"definitely not a document").unwrap();
            let fp = ContentFingerprinter::new().fingerprint_detailed(&path, ext).unwrap();
            assert_eq!(fp.basis, DigestBasis::RawBytes, "{ext}");
            assert_eq!(fp.digest, Sha256Hasher::digest(b"definitely not a document"), "{ext}");
        }
    }

    #[test]
    fn docx_hashes_joined_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        write_docx(
            &path,
            r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p><w:p><w:r><w:t>World</w:t></w:r></w:p>"#,
        );

        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "docx").unwrap();
        assert_eq!(fp.digest, Sha256Hasher::digest(b"Hello\nWorld"));
        assert_eq!(fp.basis, DigestBasis::ExtractedText(DocumentKind::Word));
    }

    #[test]
    fn doc_with_ooxml_content_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renamed.doc");
        write_docx(&path, r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"#);

        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "doc").unwrap();
        assert_eq!(fp.digest, Sha256Hasher::digest(b"Hello"));
        assert_eq!(fp.basis, DigestBasis::ExtractedText(DocumentKind::LegacyWord));
    }

    #[test]
    fn docx_repackaging_keeps_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.docx");
        let b = dir.path().join("b.docx");
        write_docx(&a, r#"<w:p><w:r><w:t>Same text</w:t></w:r></w:p>"#);
        write_docx(
            &b,
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Same </w:t></w:r><w:r><w:t>text</w:t></w:r></w:p>"#,
        );

        let fp = ContentFingerprinter::new();
        assert_ne!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
        assert_eq!(fp.fingerprint(&a, "docx").unwrap(), fp.fingerprint(&b, "docx").unwrap());
    }

    #[test]
    fn pdf_metadata_does_not_change_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        write_pdf(&a, &["Quarterly report"], "writer one");
        write_pdf(&b, &["Quarterly report"], "a different producer");

        let fp = ContentFingerprinter::new();
        let first = fp.fingerprint_detailed(&a, "pdf").unwrap();
        let second = fp.fingerprint_detailed(&b, "pdf").unwrap();
        assert_eq!(first.basis, DigestBasis::ExtractedText(DocumentKind::Pdf));
        assert_eq!(first.digest, second.digest);
        assert_ne!(first.digest, Sha256Hasher::digest(&fs::read(&a).unwrap()));
    }

    #[test]
    fn pdf_blank_page_keeps_the_text_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let one_page = dir.path().join("one.pdf");
        let two_pages = dir.path().join("two.pdf");
        write_pdf(&one_page, &["Site plan"], "writer");
        write_pdf(&two_pages, &["Site plan", ""], "writer");

        let fp = ContentFingerprinter::new();
        let expected = fp.fingerprint_detailed(&one_page, "pdf").unwrap();
        let actual = fp.fingerprint_detailed(&two_pages, "pdf").unwrap();
        assert_eq!(actual.basis, DigestBasis::ExtractedText(DocumentKind::Pdf));
        assert_eq!(actual.digest, expected.digest);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HELLO.TXT");
        fs::write(&path, "hello world").unwrap();
        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "TXT").unwrap();
        assert_eq!(fp.basis, DigestBasis::ExtractedText(DocumentKind::PlainText));
    }

    #[test]
    fn declared_type_wins_over_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello world").unwrap();
        let fp = ContentFingerprinter::new().fingerprint_detailed(&path, "bin").unwrap();
        assert_eq!(fp.basis, DigestBasis::RawBytes);
        assert_eq!(fp.digest.as_str(), HELLO_WORLD);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        let err = ContentFingerprinter::new().fingerprint(&path, "txt").unwrap_err();
        assert_eq!(err.io_kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("gone.txt"));
    }

    struct Exploding;

    impl TextExtractor for Exploding {
        fn kind(&self) -> DocumentKind {
            DocumentKind::Pdf
        }

        fn extract(&self, _path: &Path) -> Result<String, ExtractError> {
            panic!("parser bug")
        }
    }

    #[test]
    fn panicking_extractor_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();

        let fp = ContentFingerprinter::new()
            .with_extractor(Box::new(Exploding))
            .fingerprint_detailed(&path, "pdf")
            .unwrap();
        assert_eq!(fp.basis, DigestBasis::RawBytes);
        assert_eq!(fp.digest, Sha256Hasher::digest(b"%PDF-1.7"));
    }

    #[test]
    fn chunk_size_does_not_affect_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.mp3");
        let bytes: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 256) as u8).collect();
        fs::write(&path, &bytes).unwrap();

        let expected = Sha256Hasher::digest(&bytes);
        for chunk in [0, 1, 13, 4096, 1 << 20] {
            let fp = ContentFingerprinter::new().with_chunk_size(chunk);
            assert_eq!(fp.fingerprint(&path, "mp3").unwrap(), expected, "chunk {chunk}");
        }
    }

    #[test]
    fn fingerprint_serializes_basis() {
        let fp = Fingerprint {
            digest: Sha256Hasher::digest(b""),
            basis: DigestBasis::ExtractedText(DocumentKind::Pdf),
        };
        let json = serde_json::to_value(&fp).unwrap();
        assert_eq!(json["basis"], "extracted_text");
        assert_eq!(json["kind"], "pdf");
        assert_eq!(json["digest"], EMPTY);
    }
}

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::ExtractError;
use crate::kind::DocumentKind;

/// Pulls the visible text out of a document.
///
/// Implementations either return the full text or fail; partial results are
/// never returned.
pub trait TextExtractor: Send + Sync {
    /// The format this extractor handles.
    fn kind(&self) -> DocumentKind;

    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Reads the file as UTF-8 text, byte for byte.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PlainText
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path)?;
        String::from_utf8(bytes).map_err(|_| ExtractError::InvalidUtf8)
    }
}

/// Concatenates the text of every page in page order.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let doc = lopdf::Document::load(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;
        let mut text = String::new();
        for page in doc.get_pages().keys() {
            let page_text = doc
                .extract_text(&[*page])
                .map_err(|e| ExtractError::Pdf(format!("page {page}: {e}")))?;
            text.push_str(&page_text);
        }
        Ok(text)
    }
}

/// Joins the body paragraphs of an Office Open XML document with `\n`.
///
/// Only paragraphs that sit directly in the document body count; table cells,
/// headers, and text boxes are skipped. Within a paragraph, run text is kept
/// along with tabs and line breaks.
pub struct WordExtractor {
    kind: DocumentKind,
}

impl WordExtractor {
    /// Extractor for `.docx`.
    pub fn word() -> Self {
        Self {
            kind: DocumentKind::Word,
        }
    }

    /// Extractor for `.doc`. Only OOXML content is understood, so a genuine
    /// binary Word 97 file fails here and is hashed as raw bytes.
    pub fn legacy() -> Self {
        Self {
            kind: DocumentKind::LegacyWord,
        }
    }
}

const DOCUMENT_PART: &str = "word/document.xml";

impl TextExtractor for WordExtractor {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| ExtractError::Archive(format!("{DOCUMENT_PART}: {e}")))?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)?;
        Ok(body_paragraphs(&xml)?.join("\n"))
    }
}

fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::Xml(format!("at {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" && parent_is(&stack, b"body") {
                    current = Some(String::new());
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"p" if parent_is(&stack, b"body") => paragraphs.push(String::new()),
                    b"tab" if in_paragraph_run(&stack) => push_to(&mut current, "\t"),
                    b"br" | b"cr" if in_paragraph_run(&stack) => push_to(&mut current, "\n"),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if parent_is(&stack, b"t") && in_paragraph_run(&stack[..stack.len() - 1]) {
                    let text = t.unescape().map_err(|e| ExtractError::Xml(e.to_string()))?;
                    push_to(&mut current, &text);
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                if closed.as_deref() == Some(&b"p"[..]) && parent_is(&stack, b"body") {
                    if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().map(Vec::as_slice) == Some(name)
}

/// `true` when the innermost open element is a run belonging to a body
/// paragraph, either directly or through a hyperlink.
fn in_paragraph_run(stack: &[Vec<u8>]) -> bool {
    let tail: Vec<&[u8]> = stack.iter().rev().take(4).map(Vec::as_slice).collect();
    match tail.as_slice() {
        [b"r", b"p", b"body", ..] => true,
        [b"r", b"hyperlink", b"p", b"body"] => true,
        _ => false,
    }
}

fn push_to(current: &mut Option<String>, text: &str) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.push_str(text);
    }
}

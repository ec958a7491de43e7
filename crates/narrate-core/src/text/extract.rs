//! Plain text extraction from uploaded documents

use html2text::render::text_renderer::TrivialDecorator;
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Document kinds accepted for narration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    Epub,
}

impl SourceKind {
    /// Pick the extractor from the uploaded file name.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".txt") {
            Ok(SourceKind::PlainText)
        } else if lower.ends_with(".epub") {
            Ok(SourceKind::Epub)
        } else {
            Err(Error::UnsupportedFile(format!(
                "{}. Only .txt and .epub files are supported.",
                filename
            )))
        }
    }
}

/// Extract narratable text from an uploaded file.
pub fn extract_text(filename: &str, content: &[u8]) -> Result<String> {
    match SourceKind::from_filename(filename)? {
        SourceKind::PlainText => String::from_utf8(content.to_vec())
            .map_err(|e| Error::ExtractionError(format!("{} is not valid UTF-8: {}", filename, e))),
        SourceKind::Epub => extract_epub(content),
    }
}

/// Extract the text of every content document in an EPUB archive.
///
/// Cover, table-of-contents and navigation documents are skipped. Each
/// remaining document has page-break markers and bibliography sections
/// stripped and its whitespace collapsed; documents are joined by newlines.
pub fn extract_epub(content: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(content))
        .map_err(|e| Error::ExtractionError(format!("invalid EPUB archive: {}", e)))?;

    let mut documents = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::ExtractionError(format!("unreadable EPUB entry: {}", e)))?;

        let name = entry.name().to_string();
        if !is_content_document(&name) {
            continue;
        }

        let mut html = String::new();
        entry
            .read_to_string(&mut html)
            .map_err(|e| Error::ExtractionError(format!("{}: {}", name, e)))?;

        let text = normalize_whitespace(&filter_unwanted_content(&html_to_text(&html)));
        debug!("Extracted {} characters from {}", text.len(), name);
        if !text.is_empty() {
            documents.push(text);
        }
    }

    info!("Extracted {} documents from EPUB", documents.len());
    Ok(documents.join("\n"))
}

fn is_content_document(name: &str) -> bool {
    let excluded = name.contains("cover") || name.contains("toc") || name.contains("nav");
    !excluded && name.ends_with("html")
}

fn pagebreak_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?s)<(?:span|div|a|p)\b[^>]*?epub:type\s*=\s*"pagebreak"[^>]*?(?:/>|>.*?</(?:span|div|a|p)>)"#,
        )
        .expect("pagebreak pattern is valid")
    })
}

fn page_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Page_[0-9]+\s*[0-9]+").expect("page pattern is valid"))
}

fn bibliography_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)BIBLIOGRAPHY.*?INTRODUCTORY").expect("bibliography pattern is valid")
    })
}

/// Table borders html2text draws even with the trivial decorator
fn box_drawing_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\x{2500}-\x{257F}]+").expect("box pattern is valid"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Render HTML to undecorated text, dropping page-break elements first
/// and table borders after.
pub fn html_to_text(html: &str) -> String {
    let without_breaks = pagebreak_pattern().replace_all(html, "");
    let rendered = html2text::from_read_with_decorator(
        without_breaks.as_bytes(),
        usize::MAX,
        TrivialDecorator::new(),
    );
    box_drawing_pattern().replace_all(&rendered, " ").into_owned()
}

/// Remove page-number markers and bibliography sections.
pub fn filter_unwanted_content(text: &str) -> String {
    let text = page_number_pattern().replace_all(text, "");
    bibliography_pattern().replace_all(&text, "").into_owned()
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_pattern().replace_all(text, " ").trim().to_string()
}

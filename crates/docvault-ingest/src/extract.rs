//! File text extraction for various formats.
//!
//! Dispatches on extension. Ingestion must never store a zero-chunk
//! document for an uploaded file, so empty extractions come back as
//! placeholder text instead of errors.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use docvault_core::{Error, Result};

use crate::partition::DocumentPartitioner;

/// Extensions the extractor accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "docx", "md", "json", "xml", "html", "htm",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Json,
    Xml,
    Markdown,
    PlainText,
    Partitioned,
}

impl FileKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "md" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            "pdf" | "docx" | "html" | "htm" => Some(Self::Partitioned),
            _ => None,
        }
    }
}

/// Extract plain text from a file, dispatching on its extension.
pub fn extract_text(path: &Path, partitioner: &dyn DocumentPartitioner) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let kind = FileKind::from_extension(&ext).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            ".{} (supported: {})",
            ext,
            SUPPORTED_EXTENSIONS.join(", ")
        ))
    })?;

    let text = match kind {
        FileKind::Json => extract_json(path)?,
        FileKind::Xml => extract_xml(path)?,
        FileKind::Markdown => read_text_with_fallback(path)?,
        FileKind::PlainText => {
            let text = read_text_with_fallback(path)?;
            if text.trim().is_empty() {
                "This is an empty text file.".to_string()
            } else {
                text
            }
        }
        FileKind::Partitioned => match partitioner.partition(path) {
            Ok(elements) => elements.join("\n"),
            Err(e) => {
                // When partitioning fails but the file still reads as text,
                // prefer the raw text over an error.
                warn!("Partitioning failed for {}: {}", path.display(), e);
                read_text_with_fallback(path).map_err(|_| e)?
            }
        },
    };

    if text.trim().is_empty() {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        return Ok(format!(
            "This document ({}) appears to be empty or could not be processed.",
            file_name
        ));
    }
    Ok(text)
}

/// Pretty-printed re-serialization of parsed JSON, preserving structure
/// as text.
fn extract_json(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Depth-first concatenation of all element text nodes, trimmed and
/// space-joined.
fn extract_xml(path: &Path) -> Result<String> {
    let content = read_text_with_fallback(path)?;
    let mut reader = Reader::from_str(&content);
    let mut parts = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::Extraction(format!("XML text decode failed: {}", e)))?;
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::Extraction(format!("XML parse failed: {}", e))),
        }
    }

    Ok(parts.join(" "))
}

/// Read a file as UTF-8, decoding as Latin-1 when that fails. Every byte
/// maps to the code point of the same value, so this never errors on
/// non-UTF-8 content.
fn read_text_with_fallback(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => Ok(e.into_bytes().iter().map(|&b| b as char).collect()),
    }
}

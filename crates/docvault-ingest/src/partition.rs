//! Rich-document partitioning.
//!
//! `DocumentPartitioner` segments a binary or rich document into ordered
//! text elements; the extractor newline-joins them. The builtin
//! implementation covers PDF (page by page), Word (`word/document.xml`
//! paragraphs), and HTML (visible text nodes).

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use docvault_core::{Error, Result};

pub trait DocumentPartitioner: Send + Sync {
    /// Segment a document into ordered text elements.
    fn partition(&self, path: &Path) -> Result<Vec<String>>;
}

/// Partitioner for the formats DocVault handles natively.
pub struct BuiltinPartitioner;

impl DocumentPartitioner for BuiltinPartitioner {
    fn partition(&self, path: &Path) -> Result<Vec<String>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => partition_pdf(path),
            "docx" => partition_docx(path),
            "html" | "htm" => partition_html(path),
            other => Err(Error::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

fn partition_pdf(path: &Path) -> Result<Vec<String>> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| Error::Extraction(format!("PDF parse failed: {}", e)))?;

    let mut elements = Vec::new();
    for page_number in doc.get_pages().keys() {
        if let Ok(text) = doc.extract_text(&[*page_number]) {
            let text = text.trim();
            if !text.is_empty() {
                elements.push(text.to_string());
            }
        }
    }
    Ok(elements)
}

fn partition_docx(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::Extraction(format!("docx open failed: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Extraction(format!("docx has no document body: {}", e)))?
        .read_to_string(&mut xml)?;

    // One element per <w:p> paragraph, text runs concatenated.
    let mut reader = Reader::from_str(&xml);
    let mut elements = Vec::new();
    let mut paragraph = String::new();
    let mut in_paragraph = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"p" => {
                paragraph.clear();
                in_paragraph = true;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                let text = paragraph.trim();
                if !text.is_empty() {
                    elements.push(text.to_string());
                }
                in_paragraph = false;
            }
            Ok(Event::Text(t)) if in_paragraph => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::Extraction(format!("docx text decode failed: {}", e)))?;
                paragraph.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Extraction(format!("docx parse failed: {}", e)));
            }
        }
    }
    Ok(elements)
}

fn partition_html(path: &Path) -> Result<Vec<String>> {
    let html = std::fs::read_to_string(path)?;
    let document = scraper::Html::parse_document(&html);
    let skip = ["script", "style", "head"];

    let mut elements = Vec::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let excluded = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| skip.contains(&e.name()))
                .unwrap_or(false)
        });
        if excluded {
            continue;
        }
        let text = text.trim();
        if !text.is_empty() {
            elements.push(text.to_string());
        }
    }
    Ok(elements)
}

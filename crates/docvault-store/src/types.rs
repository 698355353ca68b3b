//! Data types for engine entries, matches, and filters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored entry returned by [`crate::VectorEngine::get`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEntry {
    pub id: String,
    pub document: String,
    pub metadata: HashMap<String, String>,
}

/// A similarity match returned by [`crate::VectorEngine::query`],
/// ranked by ascending distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMatch {
    pub document: String,
    pub distance: f32,
    pub metadata: HashMap<String, String>,
}

/// Exact-match metadata filter for entry lookups.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub document_name: Option<String>,
    pub folder_name: Option<String>,
}

impl EntryFilter {
    pub fn by_document(name: impl Into<String>) -> Self {
        Self {
            document_name: Some(name.into()),
            folder_name: None,
        }
    }

    pub fn by_folder(folder: impl Into<String>) -> Self {
        Self {
            document_name: None,
            folder_name: Some(folder.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.document_name.is_none() && self.folder_name.is_none()
    }

    /// Every present field must match exactly.
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        if let Some(name) = &self.document_name {
            if metadata.get("document_name") != Some(name) {
                return false;
            }
        }
        if let Some(folder) = &self.folder_name {
            if metadata.get("folder_name") != Some(folder) {
                return false;
            }
        }
        true
    }
}

/// A deduplicated `(document_name, folder_name)` pair derived from
/// entry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentListing {
    pub document_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
}

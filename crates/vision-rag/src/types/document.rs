//! Document and page image types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opaque document identifier assigned by the retriever at index time
pub type DocumentId = u32;

/// One rasterized page of a PDF document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number within its document
    pub page_number: u32,
    /// PNG-encoded bitmap
    pub png: Vec<u8>,
}

impl PageImage {
    /// Create a page image from PNG bytes
    pub fn new(page_number: u32, png: Vec<u8>) -> Self {
        Self { page_number, png }
    }

    /// Base64 encoding of the PNG, as multimodal HTTP APIs expect it
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

/// A document recorded in an index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexedDocument {
    /// Document ID
    pub doc_id: DocumentId,
    /// File name of the original input
    pub filename: String,
    /// Copy of the PDF stored alongside the index
    pub stored_path: PathBuf,
    /// Number of pages rendered at index time
    pub page_count: u32,
}

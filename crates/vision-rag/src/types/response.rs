//! Search results and answer types

use serde::{Deserialize, Serialize};

use super::DocumentId;

/// A ranked page returned by the document retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document the page belongs to
    pub doc_id: DocumentId,
    /// 1-based page number
    pub page_num: u32,
    /// Relevance score (higher is better)
    pub score: f32,
}

/// A page that was actually passed to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    pub doc_id: DocumentId,
    pub page_num: u32,
    pub score: f32,
}

impl From<&SearchResult> for PageRef {
    fn from(result: &SearchResult) -> Self {
        Self {
            doc_id: result.doc_id,
            page_num: result.page_num,
            score: result.score,
        }
    }
}

/// Generated answer with the pages it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text (or a sentinel message when nothing could be retrieved)
    pub text: String,
    /// Pages sent to the generator, in retrieval rank order
    pub pages: Vec<PageRef>,
}

impl Answer {
    /// Answer without any supporting pages
    pub fn without_sources(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pages: Vec::new(),
        }
    }
}

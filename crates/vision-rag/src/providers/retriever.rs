//! Document retriever trait for page-level indexing and search

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{DocumentId, IndexedDocument, SearchResult};

/// Trait for building and searching named page indexes
///
/// Implementations:
/// - `ColPaliRetriever`: on-disk index scored with late interaction
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Index every PDF in `input_dir` under `index_name` and make it active
    ///
    /// With `overwrite = false` an existing index of the same name is an error.
    async fn index(&mut self, input_dir: &Path, index_name: &str, overwrite: bool) -> Result<()>;

    /// Make an existing index active
    async fn open_index(&mut self, index_name: &str) -> Result<()>;

    /// Rank pages of the active index against a query, best first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Source path of an indexed document, if the active index knows it
    async fn resolve_path(&self, doc_id: DocumentId) -> Result<Option<PathBuf>>;

    /// Documents in the active index
    async fn documents(&self) -> Result<Vec<IndexedDocument>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

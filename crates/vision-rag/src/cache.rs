//! Document image cache
//!
//! Maps a document id to the complete, page-ordered sequence of its rendered
//! images. Entries are built in full before insertion, so a lookup either
//! returns every page of the document or renders the whole document first.
//! Capacity is bounded; the least recently used document is evicted and will
//! simply be rendered again on its next lookup.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{DocumentRetriever, PageRenderer};
use crate::types::{DocumentId, PageImage};

/// Page images of one document, shared with callers without copying
pub type DocumentPages = Arc<[PageImage]>;

/// LRU cache of rendered document pages
pub struct DocumentImageCache {
    entries: LruCache<DocumentId, DocumentPages>,
}

impl DocumentImageCache {
    /// Create a cache holding at most `max_documents` documents
    pub fn new(max_documents: usize) -> Self {
        let capacity = NonZeroUsize::new(max_documents).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Pages of `doc_id`, rendering the document on a miss
    pub async fn get(
        &mut self,
        doc_id: DocumentId,
        retriever: &dyn DocumentRetriever,
        renderer: &dyn PageRenderer,
    ) -> Result<DocumentPages> {
        if let Some(pages) = self.entries.get(&doc_id) {
            tracing::debug!("Image cache hit: document {}", doc_id);
            return Ok(Arc::clone(pages));
        }

        tracing::debug!("Image cache miss: document {}", doc_id);
        let path = retriever
            .resolve_path(doc_id)
            .await?
            .ok_or(Error::DocumentNotFound(doc_id))?;

        let pages: DocumentPages = renderer.render(&path).await?.into();
        if let Some((evicted, _)) = self.entries.push(doc_id, Arc::clone(&pages)) {
            if evicted != doc_id {
                tracing::debug!("Image cache evicted document {}", evicted);
            }
        }
        Ok(pages)
    }

    /// Whether `doc_id` is cached
    pub fn contains(&self, doc_id: DocumentId) -> bool {
        self.entries.contains(&doc_id)
    }

    /// Number of cached documents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached documents
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Drop every cached document
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

//! ColPali document retriever over on-disk page indexes

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::providers::{DocumentRetriever, PageRenderer};
use crate::types::{DocumentId, IndexedDocument, SearchResult};

use super::encoder::PageEncoder;
use super::scoring::rank_pages;
use super::store::{IndexManifest, IndexStore, PageEmbedding, StoredIndex};

/// Page-level retriever: renders PDFs, encodes every page, scores with MaxSim
pub struct ColPaliRetriever {
    store: IndexStore,
    encoder: Arc<dyn PageEncoder>,
    renderer: Arc<dyn PageRenderer>,
    active: Option<StoredIndex>,
}

impl ColPaliRetriever {
    /// Create a retriever storing indexes under `index_path`
    pub fn new(
        index_path: impl Into<PathBuf>,
        encoder: Arc<dyn PageEncoder>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            store: IndexStore::new(index_path),
            encoder,
            renderer,
            active: None,
        }
    }

    /// Name of the active index
    pub fn active_index(&self) -> Option<&str> {
        self.active.as_ref().map(|index| index.manifest.name.as_str())
    }

    fn active(&self) -> Result<&StoredIndex> {
        self.active.as_ref().ok_or(Error::NotIndexed)
    }
}

/// PDFs under `dir`, sorted by path so document ids are reproducible
///
/// Nothing below `index_root` is collected: it holds the stored copies of
/// already indexed documents and the staging directories.
fn collect_pdfs(dir: &Path, index_root: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.to_path_buf()));
    }

    let dir = dir.canonicalize()?;
    let index_root = index_root.canonicalize().ok();

    let mut pdfs: Vec<PathBuf> = WalkDir::new(&dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && index_root.as_deref().is_some_and(|root| {
                    e.path() == root || e.path().canonicalize().is_ok_and(|p| p == root)
                }))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    pdfs.sort();
    Ok(pdfs)
}

#[async_trait]
impl DocumentRetriever for ColPaliRetriever {
    async fn index(&mut self, input_dir: &Path, index_name: &str, overwrite: bool) -> Result<()> {
        if self.store.exists(index_name)? && !overwrite {
            return Err(Error::IndexExists(index_name.to_string()));
        }

        let pdfs = collect_pdfs(input_dir, self.store.root())?;
        if pdfs.is_empty() {
            return Err(Error::invalid_argument(format!(
                "No PDF documents found in {}",
                input_dir.display()
            )));
        }

        let mut documents = Vec::with_capacity(pdfs.len());
        let mut pages = Vec::new();
        let mut sources = Vec::with_capacity(pdfs.len());

        for (doc_id, path) in (0..pdfs.len() as DocumentId).zip(pdfs) {
            let images = self.renderer.render(&path).await?;
            tracing::info!(
                "Encoding {} page(s) of {}",
                images.len(),
                path.display()
            );
            let embeddings = self.encoder.encode_pages(&images).await?;
            if embeddings.len() != images.len() {
                return Err(Error::encoder(format!(
                    "{} pages rendered but {} embeddings returned for {}",
                    images.len(),
                    embeddings.len(),
                    path.display()
                )));
            }

            pages.extend(
                images
                    .iter()
                    .zip(embeddings)
                    .map(|(image, vectors)| PageEmbedding {
                        doc_id,
                        page_num: image.page_number,
                        vectors,
                    }),
            );
            documents.push(IndexedDocument {
                doc_id,
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                stored_path: PathBuf::new(),
                page_count: images.len() as u32,
            });
            sources.push((doc_id, path));
        }

        let manifest = IndexManifest {
            name: index_name.to_string(),
            model: self.encoder.model().to_string(),
            created_at: Utc::now(),
            documents,
        };

        let store = self.store.clone();
        let written = tokio::task::spawn_blocking(move || {
            store.write(&manifest, &pages, &sources, overwrite)
        })
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        self.active = Some(written);
        Ok(())
    }

    async fn open_index(&mut self, index_name: &str) -> Result<()> {
        if self.active_index() == Some(index_name) {
            return Ok(());
        }

        let store = self.store.clone();
        let name = index_name.to_string();
        let loaded = tokio::task::spawn_blocking(move || store.load(&name))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        tracing::info!(
            "Opened index '{}' ({} documents, {} pages)",
            index_name,
            loaded.manifest.documents.len(),
            loaded.pages.len()
        );
        self.active = Some(loaded);
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let index = self.active()?;
        if k == 0 || index.pages.is_empty() {
            return Ok(Vec::new());
        }

        let query_vectors = self.encoder.encode_query(query).await?;
        Ok(rank_pages(&query_vectors, &index.pages, k))
    }

    async fn resolve_path(&self, doc_id: DocumentId) -> Result<Option<PathBuf>> {
        Ok(self
            .active()?
            .document(doc_id)
            .map(|doc| doc.stored_path.clone()))
    }

    async fn documents(&self) -> Result<Vec<IndexedDocument>> {
        Ok(self.active()?.manifest.documents.clone())
    }

    fn name(&self) -> &str {
        "colpali"
    }
}

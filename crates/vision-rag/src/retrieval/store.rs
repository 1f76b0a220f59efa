//! On-disk named indexes
//!
//! Layout of `<index_path>/<name>/`:
//!
//! ```text
//! manifest.json     name, model, creation time, documents
//! embeddings.json   one multi-vector per page
//! documents/        copies of the indexed PDFs (<doc_id>.pdf)
//! ```
//!
//! A new index is assembled in a scratch directory next to its final location
//! and renamed into place, so readers never see a half-written index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DocumentId, IndexedDocument};

use super::encoder::MultiVector;

const MANIFEST_FILE: &str = "manifest.json";
const EMBEDDINGS_FILE: &str = "embeddings.json";
const DOCUMENTS_DIR: &str = "documents";

/// Index metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Index name
    pub name: String,
    /// Encoder model the embeddings came from
    pub model: String,
    /// When the index was built
    pub created_at: DateTime<Utc>,
    /// Indexed documents; `stored_path` is relative to the index directory on disk
    pub documents: Vec<IndexedDocument>,
}

/// Embedding of a single page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEmbedding {
    pub doc_id: DocumentId,
    /// 1-based page number
    pub page_num: u32,
    pub vectors: MultiVector,
}

/// A loaded index; document paths are absolute
#[derive(Debug, Clone)]
pub struct StoredIndex {
    pub manifest: IndexManifest,
    pub pages: Vec<PageEmbedding>,
}

impl StoredIndex {
    /// Look up a document by id
    pub fn document(&self, doc_id: DocumentId) -> Option<&IndexedDocument> {
        self.manifest.documents.iter().find(|d| d.doc_id == doc_id)
    }
}

/// Index names must be a single plain path component not starting with `.`
///
/// Dot-prefixed entries under the root are scratch directories.
pub fn validate_index_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.starts_with('.') => Ok(()),
        _ => Err(Error::invalid_argument(format!("Invalid index name: '{}'", name))),
    }
}

/// Directory of named indexes
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    /// Create a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a named index
    pub fn index_dir(&self, name: &str) -> Result<PathBuf> {
        validate_index_name(name)?;
        Ok(self.root.join(name))
    }

    /// Check whether a named index exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.index_dir(name)?.join(MANIFEST_FILE).is_file())
    }

    /// Names of all indexes under the root
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = std::fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().join(MANIFEST_FILE).is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Persist an index, copying each `(doc_id, source)` PDF into it
    pub fn write(
        &self,
        manifest: &IndexManifest,
        pages: &[PageEmbedding],
        sources: &[(DocumentId, PathBuf)],
        overwrite: bool,
    ) -> Result<StoredIndex> {
        let final_dir = self.index_dir(&manifest.name)?;
        if final_dir.exists() && !overwrite {
            return Err(Error::IndexExists(manifest.name.clone()));
        }

        std::fs::create_dir_all(&self.root)?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!(".{}-", manifest.name))
            .tempdir_in(&self.root)?;

        let documents_dir = scratch.path().join(DOCUMENTS_DIR);
        std::fs::create_dir_all(&documents_dir)?;

        let mut on_disk = manifest.clone();
        for doc in &mut on_disk.documents {
            let relative = Path::new(DOCUMENTS_DIR).join(format!("{}.pdf", doc.doc_id));
            let source = sources
                .iter()
                .find(|(id, _)| *id == doc.doc_id)
                .map(|(_, path)| path)
                .ok_or(Error::DocumentNotFound(doc.doc_id))?;
            std::fs::copy(source, scratch.path().join(&relative))?;
            doc.stored_path = relative;
        }

        std::fs::write(
            scratch.path().join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&on_disk)?,
        )?;
        std::fs::write(scratch.path().join(EMBEDDINGS_FILE), serde_json::to_vec(pages)?)?;

        if final_dir.exists() {
            std::fs::remove_dir_all(&final_dir)?;
        }
        let built = scratch.keep();
        if let Err(e) = std::fs::rename(&built, &final_dir) {
            std::fs::remove_dir_all(&built).ok();
            return Err(e.into());
        }

        tracing::info!(
            "Wrote index '{}' ({} documents, {} pages) to {}",
            manifest.name,
            on_disk.documents.len(),
            pages.len(),
            final_dir.display()
        );

        self.load(&manifest.name)
    }

    /// Load a named index
    pub fn load(&self, name: &str) -> Result<StoredIndex> {
        let dir = self.index_dir(name)?;
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(Error::IndexNotFound(name.to_string()));
        }

        let mut manifest: IndexManifest = serde_json::from_slice(&std::fs::read(&manifest_path)?)?;
        for doc in &mut manifest.documents {
            doc.stored_path = dir.join(&doc.stored_path);
        }
        let pages: Vec<PageEmbedding> =
            serde_json::from_slice(&std::fs::read(dir.join(EMBEDDINGS_FILE))?)?;

        Ok(StoredIndex { manifest, pages })
    }
}

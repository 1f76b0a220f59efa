//! RAG orchestrator: index documents, retrieve pages, answer with a vision-language model

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::DocumentImageCache;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::VisionPrompt;
use crate::ingestion::{derive_index_name, IndexSource, PdftoppmRenderer, StagingDir};
use crate::providers::{
    DocumentRetriever, GenerationOptions, OllamaVision, PageRenderer, VisionGenerator,
};
use crate::retrieval::{validate_index_name, ColPaliRetriever, ServiceEncoder};
use crate::types::{Answer, IndexedDocument, PageImage, PageRef};

/// Returned when retrieval finds nothing for the question
pub const NO_RELEVANT_DOCUMENTS: &str =
    "No relevant documents found. Please try a different question or index some documents first.";

/// Returned when every retrieved page failed to resolve to an image
pub const NO_IMAGES_RETRIEVED: &str =
    "Failed to retrieve document images. Please check your document index.";

/// Owns the retriever, renderer, and generator and composes them
pub struct RagOrchestrator {
    config: RagConfig,
    retriever: Box<dyn DocumentRetriever>,
    renderer: Arc<dyn PageRenderer>,
    generator: Box<dyn VisionGenerator>,
    cache: DocumentImageCache,
    /// Index answered against; set by `index_documents` or from config
    index_name: Option<String>,
    /// Whether `index_name` has been opened in the retriever
    index_ready: bool,
}

impl RagOrchestrator {
    /// Wire an orchestrator from explicit collaborators
    pub fn new(
        config: RagConfig,
        retriever: Box<dyn DocumentRetriever>,
        renderer: Arc<dyn PageRenderer>,
        generator: Box<dyn VisionGenerator>,
    ) -> Self {
        let cache = DocumentImageCache::new(config.cache.max_documents);
        let index_name = config.index.index_name.clone();
        Self {
            config,
            retriever,
            renderer,
            generator,
            cache,
            index_name,
            index_ready: false,
        }
    }

    /// Build the production collaborators (pdftoppm, ColPali service, Ollama)
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!("Loading document retrieval model: {}", config.models.colpali_model);
        let renderer: Arc<dyn PageRenderer> = Arc::new(PdftoppmRenderer::new(&config.render));
        let encoder = Arc::new(ServiceEncoder::new(&config)?);
        let retriever = ColPaliRetriever::new(
            config.index.index_path.clone(),
            encoder,
            Arc::clone(&renderer),
        );

        tracing::info!(
            "Loading VLM model: {} (device: {}, low memory: {})",
            config.models.vlm_model,
            config.device(),
            config.runtime.low_memory
        );
        let generator = OllamaVision::new(&config)?;

        Ok(Self::new(
            config,
            Box::new(retriever),
            renderer,
            Box::new(generator),
        ))
    }

    /// Active configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Name of the index questions are answered against
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// Document image cache
    pub fn cache(&self) -> &DocumentImageCache {
        &self.cache
    }

    /// Index a folder of PDFs or an explicit list of PDF files
    ///
    /// Exactly one of `folder_path` / `file_paths` must be given. Files are
    /// copied into a staging directory under the index path that is removed
    /// again whether or not indexing succeeds. Returns the index name used.
    pub async fn index_documents(
        &mut self,
        folder_path: Option<&Path>,
        file_paths: Option<&[PathBuf]>,
        index_name: Option<&str>,
        overwrite: bool,
    ) -> Result<String> {
        let source = IndexSource::from_options(folder_path, file_paths)?;
        let name = match index_name {
            Some(name) => name.to_string(),
            None => derive_index_name(source)?,
        };
        // Checked before anything is staged or rendered
        validate_index_name(&name)?;

        match source {
            IndexSource::Folder(folder) => {
                tracing::info!("Indexing documents from folder: {}", folder.display());
                self.retriever.index(folder, &name, overwrite).await?;
            }
            IndexSource::Files(files) => {
                let staging = StagingDir::stage(&self.config.index.index_path, files)?;
                tracing::info!("Indexing {} documents", files.len());
                // `staging` is dropped, and its directory removed, on both paths
                self.retriever.index(staging.path(), &name, overwrite).await?;
            }
        }

        // Document ids are reassigned by every index build
        self.cache.clear();
        self.index_name = Some(name.clone());
        self.index_ready = true;

        tracing::info!("Indexing complete. Index name: {}", name);
        Ok(name)
    }

    /// Answer a question from the indexed documents
    pub async fn answer_question(
        &mut self,
        question: &str,
        top_k: usize,
        max_tokens: u32,
    ) -> Result<String> {
        Ok(self.answer_with_sources(question, top_k, max_tokens).await?.text)
    }

    /// Answer a question and report which pages were shown to the model
    pub async fn answer_with_sources(
        &mut self,
        question: &str,
        top_k: usize,
        max_tokens: u32,
    ) -> Result<Answer> {
        self.ensure_index().await?;

        tracing::info!("Searching for relevant pages for question: {}", question);
        let results = self.retriever.search(question, top_k).await?;
        if results.is_empty() {
            return Ok(Answer::without_sources(NO_RELEVANT_DOCUMENTS));
        }

        let mut images: Vec<PageImage> = Vec::with_capacity(results.len());
        let mut pages = Vec::with_capacity(results.len());
        for result in &results {
            let doc_pages = self
                .cache
                .get(result.doc_id, self.retriever.as_ref(), self.renderer.as_ref())
                .await?;

            let image = result
                .page_num
                .checked_sub(1)
                .and_then(|index| doc_pages.get(index as usize));

            match image {
                Some(image) => {
                    images.push(image.clone());
                    pages.push(PageRef::from(result));
                }
                None => tracing::warn!(
                    "Page {} not found in document {} ({} pages); skipping",
                    result.page_num,
                    result.doc_id,
                    doc_pages.len()
                ),
            }
        }

        if images.is_empty() {
            return Ok(Answer::without_sources(NO_IMAGES_RETRIEVED));
        }

        tracing::info!(
            "Answering from {} page(s) with {} ({})",
            images.len(),
            self.generator.name(),
            self.generator.model()
        );
        let prompt = VisionPrompt::new(images, question);
        let text = self
            .generator
            .generate(&prompt, GenerationOptions::deterministic(max_tokens))
            .await?;

        Ok(Answer { text, pages })
    }

    /// Documents of the active index
    pub async fn list_documents(&mut self) -> Result<Vec<IndexedDocument>> {
        self.ensure_index().await?;
        self.retriever.documents().await
    }

    /// Open the configured index on first use
    async fn ensure_index(&mut self) -> Result<()> {
        if self.index_ready {
            return Ok(());
        }
        let name = self.index_name.as_deref().ok_or(Error::NotIndexed)?;
        self.retriever.open_index(name).await?;
        self.index_ready = true;
        Ok(())
    }
}

//! vision-rag: Multimodal RAG over PDF page images
//!
//! Documents are indexed page by page with a late-interaction (ColPali) encoder.
//! A question retrieves the best-matching pages, which are rasterized and sent,
//! together with the question, to a vision-language model that answers from the
//! page images directly. No text extraction or OCR is involved.

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod orchestrator;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use orchestrator::{RagOrchestrator, NO_IMAGES_RETRIEVED, NO_RELEVANT_DOCUMENTS};
pub use types::{
    document::{DocumentId, IndexedDocument, PageImage},
    response::{Answer, PageRef, SearchResult},
};

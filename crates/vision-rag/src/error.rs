//! Error types for the vision RAG system

use std::path::PathBuf;
use thiserror::Error;

use crate::types::DocumentId;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Vision RAG errors
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied an unusable combination of arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A listed input file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A question was asked before any index was created or opened
    #[error("No documents have been indexed. Run `index` first or pass an index name.")]
    NotIndexed,

    /// The retriever has no record of a document id
    #[error("Document with ID {0} not found")]
    DocumentNotFound(DocumentId),

    /// An index with this name already exists and overwrite was not requested
    #[error("Index '{0}' already exists (use --overwrite to replace it)")]
    IndexExists(String),

    /// No index with this name exists on disk
    #[error("Index '{0}' not found")]
    IndexNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF rasterization error
    #[error("Failed to render '{}': {message}", path.display())]
    Render { path: PathBuf, message: String },

    /// PDF construction error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Page/query encoder error
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Vision-language model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a render error
    pub fn render(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Render {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a PDF error
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create an encoder error
    pub fn encoder(message: impl Into<String>) -> Self {
        Self::Encoder(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

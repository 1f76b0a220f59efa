//! Configuration for the vision RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Model names
    pub models: ModelConfig,
    /// Index location and active index
    pub index: IndexConfig,
    /// Device preferences
    pub runtime: RuntimeConfig,
    /// Page encoder service configuration
    pub encoder: EncoderConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// PDF rasterization configuration
    pub render: RenderConfig,
    /// Document image cache configuration
    pub cache: CacheConfig,
    /// Answer defaults
    pub answer: AnswerConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file; missing sections use defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.answer.top_k == 0 {
            return Err(Error::Config("answer.top_k must be at least 1".to_string()));
        }
        if self.answer.max_tokens == 0 {
            return Err(Error::Config("answer.max_tokens must be at least 1".to_string()));
        }
        if self.render.dpi == 0 {
            return Err(Error::Config("render.dpi must be positive".to_string()));
        }
        if self.cache.max_documents == 0 {
            return Err(Error::Config("cache.max_documents must be at least 1".to_string()));
        }
        if self.encoder.batch_size == 0 {
            return Err(Error::Config("encoder.batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Device string passed to model backends
    pub fn device(&self) -> &'static str {
        if self.runtime.use_gpu {
            "cuda"
        } else {
            "cpu"
        }
    }
}

/// Model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Document retrieval (ColPali) model
    pub colpali_model: String,
    /// Vision-language model used for answers
    pub vlm_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            colpali_model: "vidore/colpali-v1.2".to_string(),
            vlm_model: "qwen2.5vl:7b".to_string(),
        }
    }
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding named indexes
    pub index_path: PathBuf,
    /// Index to answer against when nothing was indexed in this session
    pub index_name: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./index"),
            index_name: None,
        }
    }
}

/// Device preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Use GPU for inference when available
    pub use_gpu: bool,
    /// Trade speed for lower VRAM usage
    pub low_memory: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            use_gpu: true,
            low_memory: false,
        }
    }
}

/// Page encoder (ColPali embedding service) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Service base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Page images per request
    pub batch_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 300, // page batches on CPU are slow
            max_retries: 2,
            batch_size: 4,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Fixed sampling seed; combined with temperature 0 for greedy decoding
    pub seed: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 600, // 7B vision models on CPU
            max_retries: 2,
            seed: 0,
        }
    }
}

/// PDF rasterization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output resolution
    pub dpi: u32,
    /// pdftoppm executable name or path
    pub pdftoppm: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            pdftoppm: "pdftoppm".to_string(),
        }
    }
}

/// Document image cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of documents whose pages are kept in memory
    pub max_documents: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_documents: 32 }
    }
}

/// Defaults for `answer_question`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Number of pages to retrieve
    pub top_k: usize,
    /// Maximum tokens in the answer
    pub max_tokens: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_tokens: 500,
        }
    }
}

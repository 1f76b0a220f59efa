//! Ollama-based vision-language provider
//!
//! Wraps `OllamaClient` to implement the generator trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{clean_generated_text, ChatOptions, OllamaClient, VisionPrompt};

use super::generator::{GenerationOptions, VisionGenerator};

/// Ollama vision-language provider (qwen2.5vl, llava, ...)
pub struct OllamaVision {
    client: Arc<OllamaClient>,
    model: String,
    seed: u64,
    use_gpu: bool,
    low_memory: bool,
}

impl OllamaVision {
    /// Create a new Ollama vision provider
    pub fn new(config: &RagConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(&config.llm)?),
            config,
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, config: &RagConfig) -> Self {
        Self {
            client,
            model: config.models.vlm_model.clone(),
            seed: config.llm.seed,
            use_gpu: config.runtime.use_gpu,
            low_memory: config.runtime.low_memory,
        }
    }

    /// Translate decoding options and device preferences into Ollama options
    pub fn chat_options(&self, options: GenerationOptions) -> ChatOptions {
        let (temperature, seed) = if options.deterministic {
            (Some(0.0), Some(self.seed))
        } else {
            (None, None)
        };

        ChatOptions {
            temperature,
            seed,
            num_predict: Some(options.max_tokens),
            num_gpu: if self.use_gpu { None } else { Some(0) },
            low_vram: self.low_memory.then_some(true),
        }
    }
}

#[async_trait]
impl VisionGenerator for OllamaVision {
    async fn generate(&self, prompt: &VisionPrompt, options: GenerationOptions) -> Result<String> {
        let raw = self
            .client
            .chat(&self.model, prompt, &self.chat_options(options))
            .await?;
        Ok(clean_generated_text(&raw))
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

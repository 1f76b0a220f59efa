//! Vision-language generator trait

use async_trait::async_trait;

use crate::error::Result;
use crate::generation::VisionPrompt;

/// Decoding options for a single generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Hard cap on newly generated tokens
    pub max_tokens: u32,
    /// Greedy (non-sampling) decoding
    pub deterministic: bool,
}

impl GenerationOptions {
    /// Greedy decoding capped at `max_tokens`
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            deterministic: true,
        }
    }
}

/// Trait for answering a prompt made of page images followed by text
///
/// Implementations:
/// - `OllamaVision`: local Ollama server (qwen2.5vl, llava, ...)
#[async_trait]
pub trait VisionGenerator: Send + Sync {
    /// Generate text for the prompt; only newly generated text is returned
    async fn generate(&self, prompt: &VisionPrompt, options: GenerationOptions) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

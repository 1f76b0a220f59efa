//! Answer generation: multimodal prompt assembly and the Ollama chat client

pub mod ollama;
pub mod prompt;

pub use ollama::{ChatOptions, OllamaClient};
pub use prompt::{clean_generated_text, VisionPrompt};

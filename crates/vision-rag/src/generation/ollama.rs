//! Ollama chat client for vision-language generation with retry logic

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::retry::retry_request;

use super::prompt::VisionPrompt;

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

/// Model options sent with each chat request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Maximum number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    /// Layers offloaded to GPU; 0 forces CPU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_vram: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: &'a ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Send one user turn (images + text) and return the assistant reply
    ///
    /// The chat endpoint only returns the assistant turn, so the prompt is
    /// never echoed back.
    pub async fn chat(
        &self,
        model: &str,
        prompt: &VisionPrompt,
        options: &ChatOptions,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.config.base_url);
        let body = serde_json::to_vec(&build_chat_request(model, prompt, options))?;
        let client = self.client.clone();

        tracing::info!(
            "Generating answer with model {} from {} page image(s)",
            model,
            prompt.images.len()
        );

        retry_request("ollama", self.config.max_retries, || {
            let url = url.clone();
            let body = body.clone();
            let client = client.clone();

            async move {
                let response = client
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::llm(format!(
                        "Generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let chat_response: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

                Ok(chat_response.message.content)
            }
        })
        .await
    }
}

fn build_chat_request<'a>(
    model: &'a str,
    prompt: &VisionPrompt,
    options: &'a ChatOptions,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt.text.clone(),
            images: prompt.encoded_images(),
        }],
        stream: false,
        options,
    }
}

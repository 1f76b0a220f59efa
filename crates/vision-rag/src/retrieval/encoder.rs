//! ColPali page/query encoder
//!
//! The multi-vector model runs behind an HTTP embedding service:
//!
//! ```text
//! POST {base}/embed/images   {"model", "device", "images":  [base64 png]}
//! POST {base}/embed/queries  {"model", "device", "queries": [text]}
//!   -> {"embeddings": [[[f32]]]}   one multi-vector per input, same order
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::retry::retry_request;
use crate::types::PageImage;

/// One embedding vector per token/patch
pub type MultiVector = Vec<Vec<f32>>;

/// Trait for multi-vector encoding of page images and queries
///
/// Implementations:
/// - `ServiceEncoder`: HTTP ColPali embedding service
#[async_trait]
pub trait PageEncoder: Send + Sync {
    /// Encode page images; output order matches input order
    async fn encode_pages(&self, pages: &[PageImage]) -> Result<Vec<MultiVector>>;

    /// Encode a search query
    async fn encode_query(&self, query: &str) -> Result<MultiVector>;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// HTTP client for a ColPali embedding service
pub struct ServiceEncoder {
    client: Client,
    base_url: String,
    model: String,
    device: &'static str,
    batch_size: usize,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbedImagesRequest<'a> {
    model: &'a str,
    device: &'a str,
    images: Vec<String>,
}

#[derive(Serialize)]
struct EmbedQueriesRequest<'a> {
    model: &'a str,
    device: &'a str,
    queries: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<MultiVector>,
}

impl ServiceEncoder {
    /// Create an encoder from config
    pub fn new(config: &RagConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.encoder.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.encoder.base_url.trim_end_matches('/').to_string(),
            model: config.models.colpali_model.clone(),
            device: config.device(),
            batch_size: config.encoder.batch_size.max(1),
            max_retries: config.encoder.max_retries,
        })
    }

    /// Check if the embedding service is reachable
    pub async fn health_check(&self) -> Result<bool> {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn post_embed(&self, endpoint: &str, body: Vec<u8>, expected: usize) -> Result<Vec<MultiVector>> {
        let url = format!("{}/embed/{}", self.base_url, endpoint);
        let client = self.client.clone();

        let embeddings = retry_request("encoder", self.max_retries, || {
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
                    .map_err(|e| Error::encoder(format!("Embedding request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::encoder(format!(
                        "Embedding failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let parsed: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::encoder(format!("Failed to parse embedding response: {}", e)))?;

                Ok(parsed.embeddings)
            }
        })
        .await?;

        if embeddings.len() != expected {
            return Err(Error::encoder(format!(
                "Expected {} embeddings from {}, got {}",
                expected,
                url,
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl PageEncoder for ServiceEncoder {
    async fn encode_pages(&self, pages: &[PageImage]) -> Result<Vec<MultiVector>> {
        let mut all = Vec::with_capacity(pages.len());

        for batch in pages.chunks(self.batch_size) {
            let request = EmbedImagesRequest {
                model: &self.model,
                device: self.device,
                images: batch.iter().map(PageImage::to_base64).collect(),
            };
            let body = serde_json::to_vec(&request)?;
            all.extend(self.post_embed("images", body, batch.len()).await?);
        }

        Ok(all)
    }

    async fn encode_query(&self, query: &str) -> Result<MultiVector> {
        let request = EmbedQueriesRequest {
            model: &self.model,
            device: self.device,
            queries: [query],
        };
        let body = serde_json::to_vec(&request)?;
        self.post_embed("queries", body, 1)
            .await?
            .pop()
            .ok_or_else(|| Error::encoder("Empty query embedding"))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

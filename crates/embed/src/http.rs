//! HTTP embedding provider.
//!
//! Client for an Ollama-shaped local embedding service
//! (`POST {endpoint}/api/embeddings` with a model and a prompt).
//! Requests are retried with exponential backoff; timeouts surface as
//! `RecallError::Timeout` rather than blocking the pipeline.

use crate::provider::EmbeddingProvider;
use recall_core::config::EmbeddingSettings;
use recall_core::{RecallError, RecallResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Maximum attempts per text before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff duration in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Embedding provider backed by an HTTP embedding service.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl HttpProvider {
    /// Create a new HTTP provider.
    ///
    /// Only builds the client; the service is not contacted until the first
    /// embed call, so construction works offline and failures surface
    /// per-request.
    pub fn new(settings: &EmbeddingSettings, timeout: Duration) -> RecallResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            RecallError::Embedding(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}{}", self.base_url, EMBEDDING_ENDPOINT)
    }

    async fn embed_with_retries(&self, text: &str) -> RecallResult<Vec<f32>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < MAX_ATTEMPTS {
            match self.embed_single(text).await {
                Ok(embedding) => return Ok(embedding),
                // a timeout is terminal, not retried
                Err(e @ RecallError::Timeout(..)) => return Err(e),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < MAX_ATTEMPTS {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding request failed (attempt {}/{}), retrying in {}ms",
                            attempt, MAX_ATTEMPTS, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RecallError::Embedding("Unknown embedding error".to_string())))
    }

    async fn embed_single(&self, text: &str) -> RecallResult<Vec<f32>> {
        let url = self.embeddings_url();

        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecallError::Timeout("Embedding request".to_string(), self.timeout_secs)
                } else {
                    RecallError::Embedding(format!("Failed to reach embedding service: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(RecallError::Embedding(format!(
                    "Embedding service error ({}): {}",
                    status, error_response.error
                )));
            }

            return Err(RecallError::Embedding(format!(
                "Embedding service error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            RecallError::Embedding(format!("Malformed embedding response: {}", e))
        })?;

        if body.embedding.len() != self.dimensions {
            return Err(RecallError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                body.embedding.len(),
                self.dimensions
            )));
        }

        Ok(body.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HttpProvider {
    fn provider_name(&self) -> &str {
        "http"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> RecallResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Embedding batch of {} texts", texts.len());

        // the service exposes no batch call, so texts go one at a time
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                warn!("Skipping empty text at index {}", i);
                embeddings.push(vec![0.0; self.dimensions]);
                continue;
            }

            let embedding = self.embed_with_retries(text).await?;
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> EmbeddingSettings {
        EmbeddingSettings {
            provider: "http".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: "http://localhost:11434/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = HttpProvider::new(&test_settings(), Duration::from_secs(5)).unwrap();
        assert_eq!(provider.provider_name(), "http");
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_embeddings_url_strips_trailing_slash() {
        let provider = HttpProvider::new(&test_settings(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            provider.embeddings_url(),
            "http://localhost:11434/api/embeddings"
        );
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input() {
        let provider = HttpProvider::new(&test_settings(), Duration::from_secs(5)).unwrap();
        let embeddings = provider.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_embedding_error() {
        // nothing listens on this port; the failure must be represented,
        // not panicked
        let settings = EmbeddingSettings {
            endpoint: "http://127.0.0.1:1".to_string(),
            ..test_settings()
        };
        let provider = HttpProvider::new(&settings, Duration::from_secs(1)).unwrap();

        let result = provider.embed("hello").await;
        assert!(matches!(
            result,
            Err(RecallError::Embedding(_)) | Err(RecallError::Timeout(..))
        ));
    }
}

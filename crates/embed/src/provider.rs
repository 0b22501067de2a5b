//! Embedding provider trait and factory.

use recall_core::config::EmbeddingSettings;
use recall_core::{RecallError, RecallResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "hash", "http")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> RecallResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> RecallResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| RecallError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// `timeout` bounds each request made by network-backed providers.
pub fn create_provider(
    settings: &EmbeddingSettings,
    timeout: Duration,
) -> RecallResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "hash" => {
            let provider = super::hash::HashProvider::new(settings.dimensions);
            Ok(Arc::new(provider))
        }

        "http" => {
            let provider = super::http::HttpProvider::new(settings, timeout)?;
            Ok(Arc::new(provider))
        }

        _ => Err(RecallError::Embedding(format!(
            "Unknown embedding provider: '{}'. Supported providers: hash, http",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hash_provider() {
        let settings = EmbeddingSettings::default();
        let provider = create_provider(&settings, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.provider_name(), "hash");
        assert_eq!(provider.model_name(), "hash-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_http_provider() {
        let settings = EmbeddingSettings {
            provider: "http".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            ..Default::default()
        };

        let provider = create_provider(&settings, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.provider_name(), "http");
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_create_unknown_provider() {
        let settings = EmbeddingSettings {
            provider: "unknown".to_string(),
            ..Default::default()
        };

        let result = create_provider(&settings, Duration::from_secs(5));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let settings = EmbeddingSettings::default();
        let provider = create_provider(&settings, Duration::from_secs(5)).unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}

//! Embedding providers for the Recall pipeline.
//!
//! Text-to-vector mapping is delegated to an external collaborator behind the
//! [`EmbeddingProvider`] trait. Two implementations ship here: a deterministic
//! offline hash provider and an HTTP client for a local embedding service.

pub mod hash;
pub mod http;
pub mod provider;

// Re-export commonly used types
pub use hash::HashProvider;
pub use http::HttpProvider;
pub use provider::{create_provider, EmbeddingProvider};

//! Recall Core Library
//!
//! This crate provides the foundational utilities for the Recall pipeline:
//! - Error handling (`RecallError`, `RecallResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{DedupePolicy, RecallConfig};
pub use error::{RecallError, RecallResult};

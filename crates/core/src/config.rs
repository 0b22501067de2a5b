//! Configuration management for the Recall pipeline.
//!
//! Configuration is resolved from several layers, later layers winning:
//! - Built-in defaults
//! - Config file (`.recall/config.yaml` under the workspace)
//! - Environment variables (`RECALL_*`, `RUST_LOG`, `NO_COLOR`)
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RecallError, RecallResult};

/// Main pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Path to the workspace root (contains .recall/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Chunking policy for the normalizer
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval defaults and external-call timeout
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// What to do when the same text appears in more than one source
    #[serde(default)]
    pub dedupe: DedupePolicy,

    /// Embedding collaborator settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Ingestion source settings
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Chunking policy: fixed maximum character length with optional overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of hits returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Timeout applied to long-running external calls (API, embedding)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_top_k() -> usize {
    3
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Policy for identical text appearing in more than one source.
///
/// `KeepSeparate` indexes every record as-is. `MergeProvenance` collapses
/// byte-identical texts into one record carrying every origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    #[default]
    KeepSeparate,
    MergeProvenance,
}

/// Embedding collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "hash" (deterministic, offline) or "http"
    #[serde(default = "default_embed_provider")]
    pub provider: String,

    /// Model identifier sent to the embedding service
    #[serde(default = "default_embed_model")]
    pub model: String,

    /// Embedding vector dimensions
    #[serde(default = "default_embed_dimensions")]
    pub dimensions: usize,

    /// Base URL of the embedding service (http provider only)
    #[serde(default = "default_embed_endpoint")]
    pub endpoint: String,

    /// Maximum number of texts embedded per batch call
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,
}

fn default_embed_provider() -> String {
    "hash".to_string()
}

fn default_embed_model() -> String {
    "hash-v1".to_string()
}

fn default_embed_dimensions() -> usize {
    384
}

fn default_embed_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_embed_batch_size() -> usize {
    64
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embed_provider(),
            model: default_embed_model(),
            dimensions: default_embed_dimensions(),
            endpoint: default_embed_endpoint(),
            batch_size: default_embed_batch_size(),
        }
    }
}

/// Ingestion source settings. Unconfigured sources are skipped at rebuild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub document: Option<DocumentSourceConfig>,

    #[serde(default)]
    pub audit: Option<AuditSourceConfig>,

    #[serde(default)]
    pub incidents: Option<IncidentSourceConfig>,
}

/// Static documentation source: a file or a directory of files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSourceConfig {
    /// File or directory path, resolved against the workspace if relative
    pub path: PathBuf,
}

/// Audit-log database source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSourceConfig {
    /// SQLite database path, resolved against the workspace if relative
    pub db_path: PathBuf,

    /// Newest-rows fetch limit; hitting it marks the batch incomplete
    #[serde(default = "default_audit_fetch_limit")]
    pub fetch_limit: usize,
}

fn default_audit_fetch_limit() -> usize {
    200
}

/// Incident tracker API source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentSourceConfig {
    /// API base URL
    pub base_url: String,

    /// Name of the environment variable holding the bearer token
    #[serde(default)]
    pub token_env: Option<String>,

    /// Incidents fetched per page
    #[serde(default = "default_incident_page_size")]
    pub page_size: usize,

    /// Pagination cap; hitting it marks the batch incomplete
    #[serde(default = "default_incident_max_pages")]
    pub max_pages: usize,
}

fn default_incident_page_size() -> usize {
    100
}

fn default_incident_max_pages() -> usize {
    10
}

/// Full configuration file structure.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    chunking: Option<ChunkingConfig>,
    retrieval: Option<RetrievalConfig>,
    dedupe: Option<DedupePolicy>,
    embedding: Option<EmbeddingSettings>,
    sources: Option<SourcesConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            dedupe: DedupePolicy::default(),
            embedding: EmbeddingSettings::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl RecallConfig {
    /// Load configuration from environment variables and the config file.
    ///
    /// Environment variables:
    /// - `RECALL_WORKSPACE`: Override workspace path
    /// - `RECALL_CONFIG`: Path to config file
    /// - `RECALL_EMBED_PROVIDER`: Embedding provider
    /// - `RECALL_EMBED_MODEL`: Embedding model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> RecallResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RECALL_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("RECALL_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(RecallError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".recall/config.yaml")
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override file settings
        if let Ok(provider) = std::env::var("RECALL_EMBED_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("RECALL_EMBED_MODEL") {
            config.embedding.model = model;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> RecallResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RecallError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            RecallError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(chunking) = config_file.chunking {
            self.chunking = chunking;
        }

        if let Some(retrieval) = config_file.retrieval {
            self.retrieval = retrieval;
        }

        if let Some(dedupe) = config_file.dedupe {
            self.dedupe = dedupe;
        }

        if let Some(embedding) = config_file.embedding {
            self.embedding = embedding;
        }

        if let Some(sources) = config_file.sources {
            self.sources = sources;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and file values.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .recall directory.
    pub fn recall_dir(&self) -> PathBuf {
        self.workspace.join(".recall")
    }

    /// Get the path to the index snapshot file.
    pub fn index_path(&self) -> PathBuf {
        self.recall_dir().join("index.db")
    }

    /// Ensure the .recall directory exists.
    pub fn ensure_recall_dir(&self) -> RecallResult<()> {
        let recall_dir = self.recall_dir();
        if !recall_dir.exists() {
            std::fs::create_dir_all(&recall_dir).map_err(|e| {
                RecallError::Config(format!("Failed to create .recall directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Timeout applied to external calls (incident API, embedding service).
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval.timeout_seconds)
    }

    /// Resolve a path from the config against the workspace.
    pub fn resolve_path(&self, path: &PathBuf) -> PathBuf {
        if path.is_absolute() {
            path.clone()
        } else {
            self.workspace.join(path)
        }
    }

    /// Resolve the incident API bearer token from the environment.
    ///
    /// Uses `sources.incidents.token_env` if set, else `RECALL_INCIDENT_TOKEN`.
    pub fn resolve_incident_token(&self) -> Option<String> {
        let env_var = self
            .sources
            .incidents
            .as_ref()
            .and_then(|i| i.token_env.clone())
            .unwrap_or_else(|| "RECALL_INCIDENT_TOKEN".to_string());

        std::env::var(&env_var).ok()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RecallResult<()> {
        if self.chunking.chunk_size == 0 {
            return Err(RecallError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(RecallError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(RecallError::Config(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }

        let known_providers = ["hash", "http"];
        if !known_providers.contains(&self.embedding.provider.as_str()) {
            return Err(RecallError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_providers.join(", ")
            )));
        }

        Ok(())
    }
}

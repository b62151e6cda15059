//! TOML configuration parsing and validation.
//!
//! ```toml
//! [store]
//! kind = "local"
//! path = "./data/ingest.sqlite"
//! collection = "knowledge"
//! similarity = "cosine"
//!
//! [embedding]
//! provider = "ollama"
//! model = "nomic-embed-text"
//! dims = 768
//!
//! [[sources]]
//! path = "./corpus/text"
//! data_type = "text"
//! pattern = "**/*.txt"
//!
//! [splitter]
//! strategy = "recursive"
//! chunk_size = 1000
//! chunk_overlap = 100
//!
//! [ingest]
//! batch_count = 4
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::loader::DocumentFilter;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Local,
    Memory,
}

/// Distance function the collection is created with.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Similarity {
    L2,
    Cosine,
    Ip,
}

impl Similarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Similarity::L2 => "l2",
            Similarity::Cosine => "cosine",
            Similarity::Ip => "ip",
        }
    }
}

impl std::str::FromStr for Similarity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "l2" => Ok(Similarity::L2),
            "cosine" => Ok(Similarity::Cosine),
            "ip" => Ok(Similarity::Ip),
            other => bail!("Unknown similarity metric: '{}'", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_kind")]
    pub kind: StoreKind,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_similarity")]
    pub similarity: Similarity,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            path: default_store_path(),
            collection: default_collection(),
            similarity: default_similarity(),
        }
    }
}

fn default_store_kind() -> StoreKind {
    StoreKind::Local
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./data/ingest.sqlite")
}
fn default_collection() -> String {
    "default".to_string()
}
fn default_similarity() -> Similarity {
    Similarity::L2
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for OpenAI-compatible and Ollama endpoints.
    #[serde(default)]
    pub url: Option<String>,
    /// Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            api_key: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Pdf,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Pdf => "pdf",
        }
    }

    pub fn default_pattern(&self) -> &'static str {
        match self {
            DataType::Text => "**/*.txt",
            DataType::Pdf => "**/*.pdf",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_data_type")]
    pub data_type: DataType,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

impl SourceConfig {
    /// Glob takes precedence over extensions; with neither, the data
    /// type's default glob is used.
    pub fn filter(&self) -> DocumentFilter {
        match (&self.pattern, &self.extensions) {
            (Some(p), _) => DocumentFilter::Glob(p.clone()),
            (None, Some(exts)) => DocumentFilter::Extensions(exts.clone()),
            (None, None) => DocumentFilter::Glob(self.data_type.default_pattern().to_string()),
        }
    }
}

fn default_data_type() -> DataType {
    DataType::Text
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default = "default_true")]
    pub multithread: bool,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            multithread: true,
            exclude_globs: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SplitterConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Upper bound for sentence-joined chunks.
    #[serde(default = "default_sentence_chunk_size")]
    pub sentence_chunk_size: usize,
    /// Characters of trailing whole sentences repeated at the start of the
    /// next sentence-joined chunk.
    #[serde(default = "default_sentence_chunk_overlap")]
    pub sentence_chunk_overlap: usize,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_breakpoint_percentile")]
    pub breakpoint_percentile: f64,
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            separator: default_separator(),
            language: default_language(),
            sentence_chunk_size: default_sentence_chunk_size(),
            sentence_chunk_overlap: default_sentence_chunk_overlap(),
            buffer_size: default_buffer_size(),
            breakpoint_percentile: default_breakpoint_percentile(),
            similarity_threshold: None,
        }
    }
}

fn default_strategy() -> String {
    "recursive".to_string()
}
fn default_chunk_size() -> usize {
    1000
}
fn default_separator() -> String {
    "\n\n".to_string()
}
fn default_language() -> String {
    "english".to_string()
}
fn default_sentence_chunk_size() -> usize {
    4000
}
fn default_sentence_chunk_overlap() -> usize {
    200
}
fn default_buffer_size() -> usize {
    1
}
fn default_breakpoint_percentile() -> f64 {
    95.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_batch_count")]
    pub batch_count: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_count: default_batch_count(),
        }
    }
}

fn default_batch_count() -> usize {
    1
}

impl Config {
    /// In-memory store, disabled embeddings, no sources.
    pub fn minimal() -> Self {
        Self {
            store: StoreConfig {
                kind: StoreKind::Memory,
                ..StoreConfig::default()
            },
            embedding: EmbeddingConfig::default(),
            sources: Vec::new(),
            loader: LoaderConfig::default(),
            splitter: SplitterConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Checks that are not tied to a single component. Splitter parameters are
/// validated by the splitter constructors.
pub fn validate(config: &Config) -> Result<()> {
    if config.ingest.batch_count == 0 {
        bail!("ingest.batch_count must be >= 1");
    }

    if config.store.collection.trim().is_empty() {
        bail!("store.collection must not be empty");
    }

    for (i, src) in config.sources.iter().enumerate() {
        if src.pattern.is_some() && src.extensions.is_some() {
            bail!("sources[{}]: set either pattern or extensions, not both", i);
        }
    }

    if config.embedding.is_enabled() && config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    if matches!(config.embedding.provider.as_str(), "openai" | "ollama")
        && config.embedding.model.is_none()
    {
        bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }

    Ok(())
}

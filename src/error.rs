//! Error taxonomy for the ingestion pipeline.
//!
//! Per-file and per-document failures ([`DecodeError`]) are recovered by the
//! loader and only logged. Everything else propagates to the
//! [`Pipeline`](crate::pipeline::Pipeline) and terminates the run.

use std::path::PathBuf;

use thiserror::Error;

/// The loader root cannot be used. Fatal, raised before any file is read.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("source path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("source path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A single file could not be decoded. The loader skips the file.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("could not decode text as {encoding}")]
    Encoding { encoding: &'static str },

    #[error("file contains no extractable text")]
    Empty,
}

/// Chunking parameters are invalid. Raised before splitting starts.
#[derive(Debug, Error, PartialEq)]
pub enum SplitterConfigError {
    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },

    #[error("separator must not be empty")]
    EmptySeparator,

    #[error("breakpoint_percentile must be within 0..=100, got {0}")]
    Percentile(f64),

    #[error("similarity_threshold must be within -1.0..=1.0, got {0}")]
    Threshold(f32),

    #[error("buffer_size must be at most {max}, got {got}")]
    BufferSize { got: usize, max: usize },

    #[error("unknown splitter strategy '{0}' (expected recursive, sentence, or semantic)")]
    UnknownStrategy(String),

    #[error("the semantic strategy requires an enabled embedding provider")]
    EmbedderRequired,

    #[error(transparent)]
    Tokenizer(#[from] TokenizerInitError),
}

/// Failure while splitting an individual batch of records.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("embedding sentence groups for '{source_id}' failed: {source}")]
    Embedding {
        source_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("embedding provider returned {got} vectors for {expected} texts")]
    EmbeddingCount { expected: usize, got: usize },
}

/// The Document Store rejected a batch. Earlier batches stay committed.
#[derive(Debug, Error)]
#[error("document store rejected batch {batch} of {total}: {source}")]
pub struct StoreWriteError {
    pub batch: usize,
    pub total: usize,
    #[source]
    pub source: anyhow::Error,
}

/// Tokenizer resources could not be made available.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenizerInitError {
    #[error("no tokenizer resources for language '{language}' (available: {available})")]
    UnsupportedLanguage { language: String, available: String },
}

/// Any failure that terminates a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    SplitterConfig(#[from] SplitterConfigError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    StoreWrite(#[from] StoreWriteError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerInitError),

    #[error("document store error: {0}")]
    Store(#[source] anyhow::Error),
}

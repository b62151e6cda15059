//! Chunk splitting strategies.
//!
//! Turns [`CorpusRecord`]s into [`Chunk`]s small enough for a single
//! embedding call. Three strategies are available:
//!
//! | Strategy | Type | Boundaries |
//! |----------|------|------------|
//! | `recursive` | [`RecursiveSplitter`] | paragraph → line → word → character |
//! | `sentence` | [`SentenceSplitter`] | sentences, joined up to a size limit |
//! | `semantic` | [`SemanticSplitter`] | sentences, merged while embeddings stay close |
//!
//! Every chunk inherits its record's metadata unchanged and is numbered
//! per document from zero. A record whose text yields no pieces produces
//! no chunks.

mod recursive;
mod semantic;
mod sentence;

pub use recursive::RecursiveSplitter;
pub use semantic::{SemanticOptions, SemanticSplitter};
pub use sentence::SentenceSplitter;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::SplitterConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{SplitError, SplitterConfigError};
use crate::models::{Chunk, CorpusRecord};

/// A chunking strategy. Parameters are validated when the splitter is
/// constructed, so `split` only fails on collaborator errors.
#[async_trait]
pub trait Splitter: Send + Sync {
    /// Strategy name as used in configuration.
    fn name(&self) -> &'static str;

    /// Split every record, preserving record order.
    async fn split(&self, records: &[CorpusRecord]) -> Result<Vec<Chunk>, SplitError>;
}

/// Build the splitter selected by `config.strategy`.
///
/// The semantic strategy needs an enabled embedding provider.
pub fn build_splitter(
    config: &SplitterConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Box<dyn Splitter>, SplitterConfigError> {
    let splitter: Box<dyn Splitter> = match config.strategy.as_str() {
        "recursive" => Box::new(RecursiveSplitter::new(
            config.chunk_size,
            config.chunk_overlap,
        )?),
        "sentence" => Box::new(SentenceSplitter::new(
            &config.separator,
            &config.language,
            config.sentence_chunk_size,
            config.sentence_chunk_overlap,
        )?),
        "semantic" => {
            if !embedder.is_enabled() {
                return Err(SplitterConfigError::EmbedderRequired);
            }
            let options = SemanticOptions {
                buffer_size: config.buffer_size,
                breakpoint_percentile: config.breakpoint_percentile,
                similarity_threshold: config.similarity_threshold,
            };
            Box::new(SemanticSplitter::new(&config.language, embedder, options)?)
        }
        other => return Err(SplitterConfigError::UnknownStrategy(other.to_string())),
    };

    tracing::debug!(strategy = splitter.name(), "splitter ready");
    Ok(splitter)
}

/// Wrap the pieces of one record as numbered chunks. Empty pieces are
/// dropped before numbering.
pub(crate) fn make_chunks<I, S>(record: &CorpusRecord, pieces: I) -> Vec<Chunk>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let source_id = record.source_id();
    pieces
        .into_iter()
        .map(Into::into)
        .filter(|text: &String| !text.is_empty())
        .enumerate()
        .map(|(chunk_index, text)| Chunk {
            metadata: record.metadata.clone(),
            text,
            chunk_index,
            source_id: source_id.clone(),
        })
        .collect()
}

/// SHA-256 of the chunk text, hex encoded.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{CorpusRecord, Metadata, SOURCE_KEY};

    /// A record with only the fields the splitters read filled in.
    pub fn record(source: &str, text: &str) -> CorpusRecord {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        metadata.insert("data_type".to_string(), "text".into());
        CorpusRecord {
            metadata,
            text: text.to_string(),
            raw_sentences: Vec::new(),
            sentence_count: 1,
            word_count: 1,
            vocabulary_size: 1,
            lexical_richness: 1.0,
        }
    }
}

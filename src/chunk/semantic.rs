//! Embedding-similarity splitting.
//!
//! Each sentence is embedded together with `buffer_size` neighbours on
//! either side. The cosine distance between consecutive groups measures
//! how far the topic moves at each sentence boundary; a chunk ends where
//! the distance exceeds the breakpoint.

use async_trait::async_trait;
use std::sync::Arc;

use super::{make_chunks, Splitter};
use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::{SplitError, SplitterConfigError};
use crate::models::{Chunk, CorpusRecord};
use crate::tokenize::{ensure_tokenizer_ready, sent_tokenize, LanguageResources};

/// Largest accepted `buffer_size`. Each group embeds `2 * buffer_size + 1`
/// sentences, so anything larger only repeats the whole document.
pub const MAX_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticOptions {
    /// Neighbouring sentences embedded with each sentence, per side.
    pub buffer_size: usize,
    /// Percentile of a document's distances used as breakpoint.
    pub breakpoint_percentile: f64,
    /// Fixed similarity below which a boundary is cut. Overrides the
    /// percentile when set.
    pub similarity_threshold: Option<f32>,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1,
            breakpoint_percentile: 95.0,
            similarity_threshold: None,
        }
    }
}

pub struct SemanticSplitter {
    resources: &'static LanguageResources,
    embedder: Arc<dyn EmbeddingProvider>,
    options: SemanticOptions,
}

impl SemanticSplitter {
    pub fn new(
        language: &str,
        embedder: Arc<dyn EmbeddingProvider>,
        options: SemanticOptions,
    ) -> Result<Self, SplitterConfigError> {
        if options.buffer_size > MAX_BUFFER_SIZE {
            return Err(SplitterConfigError::BufferSize {
                got: options.buffer_size,
                max: MAX_BUFFER_SIZE,
            });
        }
        let p = options.breakpoint_percentile;
        if !(0.0..=100.0).contains(&p) {
            return Err(SplitterConfigError::Percentile(p));
        }
        if let Some(t) = options.similarity_threshold {
            if !(-1.0..=1.0).contains(&t) {
                return Err(SplitterConfigError::Threshold(t));
            }
        }
        Ok(Self {
            resources: ensure_tokenizer_ready(language)?,
            embedder,
            options,
        })
    }

    async fn split_record(&self, record: &CorpusRecord) -> Result<Vec<String>, SplitError> {
        let sentences = sent_tokenize(&record.text, self.resources);
        if sentences.len() < 2 {
            return Ok(sentences);
        }

        let groups = buffered_groups(&sentences, self.options.buffer_size);
        let vectors = self
            .embedder
            .embed(&groups)
            .await
            .map_err(|source| SplitError::Embedding {
                source_id: record.source_id(),
                source,
            })?;
        if vectors.len() != groups.len() {
            return Err(SplitError::EmbeddingCount {
                expected: groups.len(),
                got: vectors.len(),
            });
        }

        let distances: Vec<f64> = vectors
            .windows(2)
            .map(|w| 1.0 - cosine_similarity(&w[0], &w[1]) as f64)
            .collect();
        let threshold = match self.options.similarity_threshold {
            Some(similarity) => 1.0 - similarity as f64,
            None => percentile(&distances, self.options.breakpoint_percentile),
        };

        tracing::debug!(
            source = %record.source_id(),
            sentences = sentences.len(),
            threshold,
            "semantic breakpoints computed"
        );

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for (i, sentence) in sentences.iter().enumerate() {
            current.push(sentence);
            let is_break = distances.get(i).map(|d| *d > threshold).unwrap_or(false);
            if is_break {
                chunks.push(current.join(" "));
                current.clear();
            }
        }
        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        Ok(chunks)
    }
}

/// Sentence `i` joined with up to `buffer` sentences before and after it.
fn buffered_groups(sentences: &[String], buffer: usize) -> Vec<String> {
    (0..sentences.len())
        .map(|i| {
            let lo = i.saturating_sub(buffer);
            let hi = i.saturating_add(buffer).min(sentences.len() - 1);
            sentences[lo..=hi].join(" ")
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::INFINITY;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

#[async_trait]
impl Splitter for SemanticSplitter {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn split(&self, records: &[CorpusRecord]) -> Result<Vec<Chunk>, SplitError> {
        let mut chunks = Vec::new();
        for record in records {
            let pieces = self.split_record(record).await?;
            chunks.extend(make_chunks(record, pieces));
        }
        Ok(chunks)
    }
}

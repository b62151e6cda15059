//! Corpus Analyzer.
//!
//! Tokenizes each [`RawDocument`] into words and sentences, computes
//! descriptive statistics, and drops documents that have no words or no
//! sentences. The [`CorpusReport`] lists every input document, including
//! the dropped ones, so the printed table always reflects the full input.

use std::collections::HashSet;
use std::fmt;

use crate::error::TokenizerInitError;
use crate::models::{CorpusRecord, RawDocument};
use crate::tokenize::{ensure_tokenizer_ready, sent_tokenize, word_tokenize};

/// Statistics for one input document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    pub source_id: String,
    pub word_count: usize,
    pub sentence_count: usize,
    pub vocabulary_size: usize,
    /// `None` when the document has no words.
    pub lexical_richness: Option<f64>,
    pub included: bool,
}

/// Human-readable corpus statistics, one row per input document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusReport {
    pub rows: Vec<DocumentStats>,
}

impl CorpusReport {
    pub fn included(&self) -> usize {
        self.rows.iter().filter(|r| r.included).count()
    }

    pub fn excluded(&self) -> usize {
        self.rows.len() - self.included()
    }

    pub fn total_words(&self) -> usize {
        self.rows.iter().map(|r| r.word_count).sum()
    }
}

impl fmt::Display for CorpusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.source_id.chars().count())
            .max()
            .unwrap_or(0)
            .max("DATASET".len());

        writeln!(
            f,
            "  {:<width$} {:>10} {:>10} {:>10} {:>8}   {}",
            "DATASET",
            "WORDS",
            "SENTENCES",
            "VOCAB",
            "RICHNESS",
            "STATUS",
            width = width
        )?;
        writeln!(f, "  {}", "-".repeat(width + 53))?;

        for row in &self.rows {
            let richness = row
                .lexical_richness
                .map(|r| format!("{:.3}", r))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "  {:<width$} {:>10} {:>10} {:>10} {:>8}   {}",
                row.source_id,
                row.word_count,
                row.sentence_count,
                row.vocabulary_size,
                richness,
                if row.included { "ok" } else { "excluded" },
                width = width
            )?;
        }

        write!(
            f,
            "  {} documents, {} included, {} excluded, {} words",
            self.rows.len(),
            self.included(),
            self.excluded(),
            self.total_words()
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorpusAnalysis {
    pub records: Vec<CorpusRecord>,
    pub report: CorpusReport,
}

/// Compute statistics for a single text.
pub fn document_stats(source_id: &str, text: &str, sentences: &[String]) -> DocumentStats {
    let words = word_tokenize(text);
    let word_count = words.len();
    let vocabulary_size = words.iter().collect::<HashSet<_>>().len();
    let lexical_richness = if word_count > 0 {
        Some(vocabulary_size as f64 / word_count as f64)
    } else {
        None
    };
    DocumentStats {
        source_id: source_id.to_string(),
        word_count,
        sentence_count: sentences.len(),
        vocabulary_size,
        lexical_richness,
        included: word_count > 0 && !sentences.is_empty(),
    }
}

/// Analyze a set of documents in the given tokenizer language.
pub fn analyze(
    documents: &[RawDocument],
    language: &str,
) -> Result<CorpusAnalysis, TokenizerInitError> {
    let resources = ensure_tokenizer_ready(language)?;

    let mut analysis = CorpusAnalysis::default();
    for doc in documents {
        let sentences = sent_tokenize(&doc.text, resources);
        let stats = document_stats(&doc.source_id(), &doc.text, &sentences);

        if let (true, Some(richness)) = (stats.included, stats.lexical_richness) {
            analysis.records.push(CorpusRecord {
                metadata: doc.metadata.clone(),
                text: doc.text.clone(),
                raw_sentences: sentences,
                sentence_count: stats.sentence_count,
                word_count: stats.word_count,
                vocabulary_size: stats.vocabulary_size,
                lexical_richness: richness,
            });
        } else {
            tracing::debug!(source = %stats.source_id, "excluding empty document");
        }
        analysis.report.rows.push(stats);
    }

    tracing::info!(
        documents = documents.len(),
        records = analysis.records.len(),
        "analyzed corpus"
    );

    Ok(analysis)
}

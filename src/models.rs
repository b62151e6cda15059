//! Core data models that flow through the ingestion pipeline.
//!
//! The derivation chain is strictly one-to-many:
//! [`RawDocument`] → [`CorpusRecord`] → [`Chunk`] → [`IngestionRecord`].
//! Every stage returns new values; nothing is mutated after creation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key holding the unique source identifier (the file path).
pub const SOURCE_KEY: &str = "source";

/// A single metadata value. Serialized untagged so the JSON form is a
/// plain string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(v) => write!(f, "{}", v),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Str(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

/// Ordered string-keyed metadata map.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Look up the source identifier in a metadata map, or `""` if absent.
pub fn source_id_of(metadata: &Metadata) -> String {
    metadata
        .get(SOURCE_KEY)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// A decoded input file. One per successfully loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub metadata: Metadata,
    pub text: String,
}

impl RawDocument {
    pub fn new(metadata: Metadata, text: impl Into<String>) -> Self {
        Self {
            metadata,
            text: text.into(),
        }
    }

    pub fn source_id(&self) -> String {
        source_id_of(&self.metadata)
    }
}

/// An analyzed document that passed the non-empty filter.
///
/// Invariant: `word_count > 0` and `sentence_count > 0`, so
/// `lexical_richness` is always defined and within `(0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRecord {
    pub metadata: Metadata,
    pub text: String,
    pub raw_sentences: Vec<String>,
    pub sentence_count: usize,
    pub word_count: usize,
    pub vocabulary_size: usize,
    pub lexical_richness: f64,
}

impl CorpusRecord {
    pub fn source_id(&self) -> String {
        source_id_of(&self.metadata)
    }
}

/// A bounded unit of text ready for a single embedding call.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub metadata: Metadata,
    pub text: String,
    pub chunk_index: usize,
    pub source_id: String,
}

/// A contiguous group of chunks written with one store call.
pub type Batch = Vec<Chunk>;

/// The unit written to the Document Store.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionRecord {
    pub id: Uuid,
    pub text: String,
    pub metadata: Metadata,
}

impl IngestionRecord {
    /// Build a record with a fresh v4 identifier. The chunk's position and
    /// source are folded into the stored metadata.
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let mut metadata = chunk.metadata.clone();
        metadata.insert(
            "chunk_index".to_string(),
            MetadataValue::Int(chunk.chunk_index as i64),
        );
        metadata
            .entry(SOURCE_KEY.to_string())
            .or_insert_with(|| MetadataValue::Str(chunk.source_id.clone()));

        Self {
            id: Uuid::new_v4(),
            text: chunk.text.clone(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, index: usize) -> Chunk {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), "docs/a.txt".into());
        Chunk {
            metadata,
            text: text.to_string(),
            chunk_index: index,
            source_id: "docs/a.txt".to_string(),
        }
    }

    #[test]
    fn ingestion_records_get_unique_ids() {
        let c = chunk("hello", 0);
        let a = IngestionRecord::from_chunk(&c);
        let b = IngestionRecord::from_chunk(&c);
        assert_ne!(a.id, b.id);
        assert_eq!(a.text, "hello");
    }

    #[test]
    fn ingestion_record_carries_chunk_index() {
        let rec = IngestionRecord::from_chunk(&chunk("x", 4));
        assert_eq!(rec.metadata.get("chunk_index"), Some(&MetadataValue::Int(4)));
        assert_eq!(
            rec.metadata.get(SOURCE_KEY),
            Some(&MetadataValue::Str("docs/a.txt".to_string()))
        );
    }

    #[test]
    fn metadata_serializes_untagged() {
        let mut m = Metadata::new();
        m.insert("n".to_string(), 3i64.into());
        m.insert("s".to_string(), "x".into());
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"n":3,"s":"x"}"#);
    }
}

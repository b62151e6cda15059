//! Document Store abstraction.
//!
//! The [`DocumentStore`] trait is the only way the pipeline touches
//! persistent state: it resolves a named collection, appends batches of
//! records to it, and counts what is there. Backends:
//!
//! - [`InMemoryStore`]: process-local, used by tests and `kind = "memory"`.
//! - [`SqliteStore`]: single-file SQLite database, `kind = "local"`.
//!
//! Each `add` call is all-or-nothing. When the store was given an enabled
//! embedding provider, texts are embedded before anything is written and
//! a provider failure rejects the whole batch.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

mod memory;
mod sqlite;

pub use memory::{InMemoryStore, StoredItem};
pub use sqlite::SqliteStore;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Similarity, StoreConfig, StoreKind};
use crate::embedding::EmbeddingProvider;
use crate::models::Metadata;

/// A resolved collection. Obtained from
/// [`DocumentStore::get_or_create_collection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    pub name: String,
    /// Metric the collection was created with. For an existing collection
    /// this is the stored metric, which may differ from the one requested.
    pub similarity: Similarity,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return the named collection, creating it with `similarity` if it
    /// does not exist yet.
    async fn get_or_create_collection(
        &self,
        name: &str,
        similarity: Similarity,
    ) -> Result<CollectionHandle>;

    /// Append one batch. The three slices must have equal lengths.
    async fn add(
        &self,
        collection: &CollectionHandle,
        ids: &[Uuid],
        texts: &[String],
        metadatas: &[Metadata],
    ) -> Result<()>;

    /// Number of items in the collection.
    async fn count(&self, collection: &CollectionHandle) -> Result<u64>;
}

/// Open the backend selected by `config.kind`.
pub async fn open_store(
    config: &StoreConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn DocumentStore>> {
    Ok(match config.kind {
        StoreKind::Memory => Arc::new(InMemoryStore::with_embedder(embedder)),
        StoreKind::Local => Arc::new(SqliteStore::connect(&config.path, embedder).await?),
    })
}

fn check_lengths(ids: &[Uuid], texts: &[String], metadatas: &[Metadata]) -> Result<()> {
    if ids.len() != texts.len() || texts.len() != metadatas.len() {
        bail!(
            "mismatched batch: {} ids, {} texts, {} metadatas",
            ids.len(),
            texts.len(),
            metadatas.len()
        );
    }
    Ok(())
}

/// Embed a batch when the provider is enabled. `None` means the store
/// keeps text and metadata only.
async fn embed_texts(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
) -> Result<Option<Vec<Vec<f32>>>> {
    if !embedder.is_enabled() || texts.is_empty() {
        return Ok(None);
    }
    let vectors = embedder.embed(texts).await?;
    if vectors.len() != texts.len() {
        bail!(
            "embedding provider returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        );
    }
    Ok(Some(vectors))
}

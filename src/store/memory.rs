//! In-memory [`DocumentStore`] implementation for testing.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`. Nothing
//! survives the process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::{check_lengths, embed_texts, CollectionHandle, DocumentStore};
use crate::config::Similarity;
use crate::embedding::{DisabledProvider, EmbeddingProvider};
use crate::models::Metadata;

/// One stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub id: Uuid,
    pub text: String,
    pub metadata: Metadata,
    pub embedding: Option<Vec<f32>>,
}

struct Collection {
    similarity: Similarity,
    items: Vec<StoredItem>,
}

pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_embedder(Arc::new(DisabledProvider))
    }

    pub fn with_embedder(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    /// Snapshot of a collection's items in insertion order.
    pub fn items(&self, collection: &str) -> Vec<StoredItem> {
        self.collections
            .read()
            .map(|c| {
                c.get(collection)
                    .map(|col| col.items.clone())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_or_create_collection(
        &self,
        name: &str,
        similarity: Similarity,
    ) -> Result<CollectionHandle> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let collection = collections.entry(name.to_string()).or_insert_with(|| Collection {
            similarity,
            items: Vec::new(),
        });
        Ok(CollectionHandle {
            name: name.to_string(),
            similarity: collection.similarity,
        })
    }

    async fn add(
        &self,
        collection: &CollectionHandle,
        ids: &[Uuid],
        texts: &[String],
        metadatas: &[Metadata],
    ) -> Result<()> {
        check_lengths(ids, texts, metadatas)?;
        let vectors = embed_texts(self.embedder.as_ref(), texts).await?;

        let mut collections = self.collections.write().map_err(poisoned)?;
        let target = collections
            .get_mut(&collection.name)
            .ok_or_else(|| anyhow!("collection '{}' does not exist", collection.name))?;

        if let Some(dup) = ids.iter().find(|id| target.items.iter().any(|i| i.id == **id)) {
            return Err(anyhow!("duplicate id {} in collection '{}'", dup, collection.name));
        }

        for (i, id) in ids.iter().enumerate() {
            target.items.push(StoredItem {
                id: *id,
                text: texts[i].clone(),
                metadata: metadatas[i].clone(),
                embedding: vectors.as_ref().map(|v| v[i].clone()),
            });
        }
        Ok(())
    }

    async fn count(&self, collection: &CollectionHandle) -> Result<u64> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(&collection.name)
            .map(|c| c.items.len() as u64)
            .unwrap_or(0))
    }
}

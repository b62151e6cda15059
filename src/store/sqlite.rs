//! SQLite-backed [`DocumentStore`].
//!
//! Schema:
//!
//! ```text
//! collections(name PK, similarity, created_at)
//! items(id PK, collection, text, metadata_json, content_hash,
//!       embedding BLOB NULL, dims NULL, created_at)
//! ```
//!
//! Tables are created on connect. Every `add` runs in one transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::{check_lengths, embed_texts, CollectionHandle, DocumentStore};
use crate::chunk::content_hash;
use crate::config::Similarity;
use crate::embedding::{vec_to_blob, EmbeddingProvider};
use crate::models::Metadata;

pub struct SqliteStore {
    pool: SqlitePool,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the
    /// schema exists.
    pub async fn connect(path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open store at {}", path.display()))?;

        let store = Self { pool, embedder };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "sqlite store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                similarity TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                text TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                content_hash TEXT NOT NULL,
                embedding BLOB,
                dims INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (collection) REFERENCES collections(name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_collection ON items(collection)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get_or_create_collection(
        &self,
        name: &str,
        similarity: Similarity,
    ) -> Result<CollectionHandle> {
        sqlx::query(
            "INSERT OR IGNORE INTO collections (name, similarity, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(similarity.as_str())
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        let stored: String =
            sqlx::query_scalar("SELECT similarity FROM collections WHERE name = ?")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        let stored = Similarity::from_str(&stored)?;

        if stored != similarity {
            tracing::warn!(
                collection = name,
                requested = similarity.as_str(),
                existing = stored.as_str(),
                "collection exists with a different similarity metric"
            );
        }

        Ok(CollectionHandle {
            name: name.to_string(),
            similarity: stored,
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
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        for (i, id) in ids.iter().enumerate() {
            let metadata_json = serde_json::to_string(&metadatas[i])?;
            let (blob, dims) = match &vectors {
                Some(v) => (Some(vec_to_blob(&v[i])), Some(v[i].len() as i64)),
                None => (None, None),
            };
            sqlx::query(
                r#"
                INSERT INTO items (id, collection, text, metadata_json, content_hash,
                                   embedding, dims, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(&collection.name)
            .bind(&texts[i])
            .bind(metadata_json)
            .bind(content_hash(&texts[i]))
            .bind(blob)
            .bind(dims)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn count(&self, collection: &CollectionHandle) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE collection = ?")
            .bind(&collection.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

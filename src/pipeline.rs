//! Ingestion driver.
//!
//! Runs the stages in order and tracks where the run is:
//!
//! ```text
//! Idle → Loading → Analyzing → Splitting → Batching → Ingesting{1..n} → Done
//!                        (any stage) → Failed
//! ```
//!
//! The corpus report is printed to stdout before the first store write.
//! Batches are written one at a time; a rejected batch stops the run and
//! leaves earlier batches committed.

use std::fmt;
use std::sync::Arc;

use crate::analyze::{analyze, CorpusReport};
use crate::batch::partition;
use crate::chunk::{build_splitter, Splitter};
use crate::config::{self, Config};
use crate::embedding::EmbeddingProvider;
use crate::error::{LoaderError, PipelineError, StoreWriteError};
use crate::loader::{self, LoadOptions, LoadOutcome};
use crate::models::IngestionRecord;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::{CollectionHandle, DocumentStore};
use crate::tokenize::ensure_tokenizer_ready;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Analyzing,
    Splitting,
    Batching,
    /// Writing batch `batch` (1-based) of `total`.
    Ingesting { batch: usize, total: usize },
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Loading => f.write_str("loading"),
            PipelineState::Analyzing => f.write_str("analyzing"),
            PipelineState::Splitting => f.write_str("splitting"),
            PipelineState::Batching => f.write_str("batching"),
            PipelineState::Ingesting { batch, total } => {
                write!(f, "ingesting {}/{}", batch, total)
            }
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed => f.write_str("failed"),
        }
    }
}

/// What a run did. Store counts are `None` for dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub documents_loaded: usize,
    pub documents_skipped: usize,
    pub records: usize,
    pub chunks: usize,
    pub batches: usize,
    pub count_before: Option<u64>,
    pub count_after: Option<u64>,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  documents loaded: {}", self.documents_loaded)?;
        writeln!(f, "  documents skipped: {}", self.documents_skipped)?;
        writeln!(f, "  records analyzed: {}", self.records)?;
        writeln!(f, "  chunks: {}", self.chunks)?;
        write!(f, "  batches: {}", self.batches)?;
        if let (Some(before), Some(after)) = (self.count_before, self.count_after) {
            write!(f, "\n  collection count: {} -> {}", before, after)?;
        }
        Ok(())
    }
}

/// Load every configured source, in configuration order.
pub fn load_sources(
    config: &Config,
    reporter: &dyn ProgressReporter,
) -> Result<LoadOutcome, LoaderError> {
    let mut outcome = LoadOutcome::default();
    for source in &config.sources {
        reporter.report(ProgressEvent::Loading {
            source: source.path.display().to_string(),
        });
        let options = LoadOptions {
            recursive: config.loader.recursive,
            multithread: config.loader.multithread,
            exclude_globs: config.loader.exclude_globs.clone(),
            data_type: source.data_type.as_str().to_string(),
        };
        let loaded = loader::load(&source.path, &source.filter(), &options)?;
        outcome.documents.extend(loaded.documents);
        outcome.skipped.extend(loaded.skipped);
    }
    Ok(outcome)
}

pub struct Pipeline {
    config: Config,
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    reporter: Box<dyn ProgressReporter>,
    splitter: Option<Box<dyn Splitter>>,
    dry_run: bool,
    state: PipelineState,
    transitions: Vec<PipelineState>,
    report: Option<CorpusReport>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        reporter: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
            reporter,
            splitter: None,
            dry_run: false,
            state: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
            report: None,
        }
    }

    /// Use `splitter` instead of the one described by the configuration.
    pub fn with_splitter(mut self, splitter: Box<dyn Splitter>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Stop after batching without touching the store.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    /// The corpus report of the last run, once analysis has finished.
    pub fn report(&self) -> Option<&CorpusReport> {
        self.report.as_ref()
    }

    fn enter(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
        self.transitions.push(next);
    }

    /// Execute one full run.
    pub async fn run(&mut self) -> Result<IngestSummary, PipelineError> {
        match self.execute().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::error!(state = %self.state, error = %e, "pipeline failed");
                self.enter(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<IngestSummary, PipelineError> {
        config::validate(&self.config).map_err(|e| PipelineError::Config(e.to_string()))?;
        ensure_tokenizer_ready(&self.config.splitter.language)?;

        let splitter = match self.splitter.take() {
            Some(s) => s,
            None => build_splitter(&self.config.splitter, Arc::clone(&self.embedder))?,
        };

        let mut summary = IngestSummary::default();

        let collection = if self.dry_run {
            None
        } else {
            let handle = self
                .store
                .get_or_create_collection(
                    &self.config.store.collection,
                    self.config.store.similarity,
                )
                .await
                .map_err(PipelineError::Store)?;
            summary.count_before = Some(self.count(&handle).await?);
            Some(handle)
        };

        self.enter(PipelineState::Loading);
        let loaded = load_sources(&self.config, self.reporter.as_ref())?;
        summary.documents_loaded = loaded.documents.len();
        summary.documents_skipped = loaded.skipped.len();

        self.enter(PipelineState::Analyzing);
        self.reporter.report(ProgressEvent::Analyzing {
            documents: loaded.documents.len() as u64,
        });
        let analysis = analyze(&loaded.documents, &self.config.splitter.language)?;
        println!("{}", analysis.report);
        self.report = Some(analysis.report);
        summary.records = analysis.records.len();

        if analysis.records.is_empty() {
            tracing::warn!("no documents with text to ingest");
            return self.finish(summary, collection.as_ref()).await;
        }

        self.enter(PipelineState::Splitting);
        self.reporter.report(ProgressEvent::Splitting {
            records: analysis.records.len() as u64,
            strategy: splitter.name().to_string(),
        });
        let chunks = splitter.split(&analysis.records).await?;
        summary.chunks = chunks.len();
        tracing::info!(
            strategy = splitter.name(),
            records = analysis.records.len(),
            chunks = chunks.len(),
            "split corpus"
        );

        if chunks.is_empty() {
            tracing::warn!("splitter produced no chunks");
            return self.finish(summary, collection.as_ref()).await;
        }

        self.enter(PipelineState::Batching);
        let batches = partition(chunks, self.config.ingest.batch_count);
        summary.batches = batches.len();

        let Some(collection) = collection else {
            tracing::info!(batches = batches.len(), "dry run, skipping store writes");
            return self.finish(summary, None).await;
        };

        let total = batches.len();
        for (i, batch) in batches.into_iter().enumerate() {
            let number = i + 1;
            self.enter(PipelineState::Ingesting {
                batch: number,
                total,
            });
            self.reporter.report(ProgressEvent::Ingesting {
                batch: number as u64,
                total: total as u64,
                items: batch.len() as u64,
            });

            let records: Vec<IngestionRecord> =
                batch.iter().map(IngestionRecord::from_chunk).collect();
            let ids: Vec<_> = records.iter().map(|r| r.id).collect();
            let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
            let metadatas: Vec<_> = records.into_iter().map(|r| r.metadata).collect();

            self.store
                .add(&collection, &ids, &texts, &metadatas)
                .await
                .map_err(|source| StoreWriteError {
                    batch: number,
                    total,
                    source,
                })?;
            tracing::info!(batch = number, total, items = ids.len(), "batch written");
        }

        self.finish(summary, Some(&collection)).await
    }

    async fn finish(
        &mut self,
        mut summary: IngestSummary,
        collection: Option<&CollectionHandle>,
    ) -> Result<IngestSummary, PipelineError> {
        if let Some(handle) = collection {
            let after = self.count(handle).await?;
            summary.count_after = Some(after);
            self.reporter.report(ProgressEvent::Done { count: after });
        }
        self.enter(PipelineState::Done);
        tracing::info!(
            documents = summary.documents_loaded,
            chunks = summary.chunks,
            batches = summary.batches,
            "pipeline finished"
        );
        Ok(summary)
    }

    async fn count(&self, handle: &CollectionHandle) -> Result<u64, PipelineError> {
        self.store.count(handle).await.map_err(PipelineError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::embedding::DisabledProvider;
    use crate::progress::NoProgress;
    use crate::store::InMemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn pipeline(config: Config, store: Arc<InMemoryStore>) -> Pipeline {
        Pipeline::new(
            config,
            store,
            Arc::new(DisabledProvider),
            Box::new(NoProgress),
        )
    }

    fn config_for(root: &std::path::Path) -> Config {
        let mut config = Config::minimal();
        config.sources.push(SourceConfig {
            path: root.to_path_buf(),
            data_type: crate::config::DataType::Text,
            pattern: None,
            extensions: None,
        });
        config
    }

    #[test]
    fn state_display() {
        assert_eq!(
            PipelineState::Ingesting { batch: 2, total: 3 }.to_string(),
            "ingesting 2/3"
        );
    }

    #[tokio::test]
    async fn fresh_pipeline_is_idle() {
        let p = pipeline(Config::minimal(), Arc::new(InMemoryStore::new()));
        assert_eq!(p.state(), PipelineState::Idle);
        assert_eq!(p.transitions(), &[PipelineState::Idle]);
    }

    #[tokio::test]
    async fn invalid_config_fails_before_loading() {
        let mut config = Config::minimal();
        config.ingest.batch_count = 0;
        let mut p = pipeline(config, Arc::new(InMemoryStore::new()));
        let err = p.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(p.transitions(), &[PipelineState::Idle, PipelineState::Failed]);
    }

    #[tokio::test]
    async fn bad_splitter_config_fails_before_loading() {
        let mut config = Config::minimal();
        config.splitter.chunk_overlap = config.splitter.chunk_size;
        let mut p = pipeline(config, Arc::new(InMemoryStore::new()));
        let err = p.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::SplitterConfig(_)));
        assert!(!p.transitions().contains(&PipelineState::Loading));
    }

    #[tokio::test]
    async fn missing_source_is_fatal() {
        let mut p = pipeline(
            config_for(std::path::Path::new("/no/such/corpus")),
            Arc::new(InMemoryStore::new()),
        );
        let err = p.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Loader(LoaderError::NotFound(_))));
        assert_eq!(p.state(), PipelineState::Failed);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "Some text here. And more.").unwrap();
        let store = Arc::new(InMemoryStore::new());
        let mut p = pipeline(config_for(tmp.path()), store.clone()).dry_run(true);

        let summary = p.run().await.unwrap();
        assert_eq!(summary.chunks, 1);
        assert_eq!(summary.batches, 1);
        assert_eq!(summary.count_before, None);
        assert_eq!(p.state(), PipelineState::Done);
        assert!(store.items("default").is_empty());
        assert!(p.report().is_some());
    }
}

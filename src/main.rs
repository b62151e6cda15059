//! # corpus-ingest CLI (`ingest`)
//!
//! ## Usage
//!
//! ```bash
//! ingest --config ./config/ingest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest init` | Create the store and its collection |
//! | `ingest analyze` | Load every source and print corpus statistics |
//! | `ingest run` | Load, analyze, split, and write all batches |
//! | `ingest count` | Print the number of items in the collection |
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use corpus_ingest::analyze::analyze;
use corpus_ingest::config::{self, Config};
use corpus_ingest::embedding::{create_provider, EmbeddingProvider};
use corpus_ingest::pipeline::{load_sources, Pipeline};
use corpus_ingest::progress::ProgressMode;
use corpus_ingest::store::{open_store, CollectionHandle, DocumentStore};

/// Configuration-driven document ingestion into a vector store.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ingest.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "ingest", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ingest.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store and the configured collection. Idempotent.
    Init,

    /// Load and analyze every source, printing the corpus report.
    ///
    /// Nothing is written to the store.
    Analyze,

    /// Run the full ingestion pipeline.
    Run {
        /// Stop after batching and report chunk and batch counts.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr. Defaults to `human` on a terminal,
        /// `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Print the number of items in the configured collection.
    Count,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let (_, store) = connect(&cfg).await?;
            let handle = collection(&cfg, store.as_ref()).await?;
            println!(
                "Collection '{}' ready ({}).",
                handle.name,
                handle.similarity.as_str()
            );
        }
        Commands::Analyze => {
            let progress = ProgressMode::default_for_tty().reporter();
            let loaded = load_sources(&cfg, progress.as_ref())?;
            let analysis = analyze(&loaded.documents, &cfg.splitter.language)?;
            println!("{}", analysis.report);
            if !loaded.skipped.is_empty() {
                println!("  skipped files: {}", loaded.skipped.len());
                for (path, error) in &loaded.skipped {
                    println!("    {}: {}", path.display(), error);
                }
            }
        }
        Commands::Run { dry_run, progress } => {
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            let (embedder, store) = connect(&cfg).await?;
            let mut pipeline = Pipeline::new(cfg, store, embedder, reporter).dry_run(dry_run);
            let summary = pipeline.run().await?;
            if dry_run {
                println!("ingest (dry-run)");
            } else {
                println!("ingest");
            }
            println!("{}", summary);
            println!("ok");
        }
        Commands::Count => {
            let (_, store) = connect(&cfg).await?;
            let handle = collection(&cfg, store.as_ref()).await?;
            println!("{}", store.count(&handle).await?);
        }
    }

    Ok(())
}

async fn connect(
    cfg: &Config,
) -> anyhow::Result<(
    std::sync::Arc<dyn EmbeddingProvider>,
    std::sync::Arc<dyn DocumentStore>,
)> {
    let embedder = create_provider(&cfg.embedding)?;
    let store = open_store(&cfg.store, embedder.clone()).await?;
    Ok((embedder, store))
}

async fn collection(cfg: &Config, store: &dyn DocumentStore) -> anyhow::Result<CollectionHandle> {
    store
        .get_or_create_collection(&cfg.store.collection, cfg.store.similarity)
        .await
}

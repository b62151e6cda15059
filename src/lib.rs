//! # corpus-ingest
//!
//! A configuration-driven pipeline that turns a directory of text or PDF
//! files into chunked, embedded records in a document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐   ┌───────────┐
//! │ Loader │──▶│ Analyzer │──▶│ Splitter │──▶│ Batcher │──▶│   Store   │
//! │ fs+pdf │   │  stats   │   │ rec/sent │   │         │   │ sqlite/mem│
//! └────────┘   └──────────┘   │ semantic │   └─────────┘   └───────────┘
//!                             └──────────┘
//! ```
//!
//! The [`pipeline::Pipeline`] drives the stages and owns the run state.
//!
//! ## Quick Start
//!
//! ```bash
//! ingest init                       # create the store and collection
//! ingest analyze                    # print corpus statistics only
//! ingest run --dry-run              # chunk and batch without writing
//! ingest run                        # full ingestion
//! ingest count                      # items in the collection
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`extract`] | Text and PDF decoding |
//! | [`loader`] | Directory walking and file matching |
//! | [`tokenize`] | Word and sentence tokenization |
//! | [`analyze`] | Corpus statistics and filtering |
//! | [`chunk`] | Splitting strategies |
//! | [`batch`] | Batch partitioning |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Document store abstraction |
//! | [`progress`] | Progress reporting |
//! | [`pipeline`] | Ingestion driver |

pub mod analyze;
pub mod batch;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod tokenize;

//! Document Loader: walks a directory tree and decodes matching files into
//! [`RawDocument`]s.
//!
//! Files are matched against their path relative to the root, either by
//! extension or by glob. Decoding failures do not abort the run: each file
//! yields a [`FileOutcome`], and skipped files are logged and reported in
//! [`LoadOutcome::skipped`].

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{DecodeError, LoaderError};
use crate::extract::{content_type_for, extract_text};
use crate::models::{Metadata, MetadataValue, RawDocument, SOURCE_KEY};

/// Which files under the root are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Case-insensitive extensions, with or without the leading dot.
    Extensions(Vec<String>),
    /// Glob matched against the root-relative path, e.g. `**/*.pdf`.
    Glob(String),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub recursive: bool,
    pub multithread: bool,
    pub exclude_globs: Vec<String>,
    /// Label stored in each document's `data_type` metadata.
    pub data_type: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            multithread: false,
            exclude_globs: Vec::new(),
            data_type: "text".to_string(),
        }
    }
}

/// Result of decoding a single file.
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(RawDocument),
    Skipped { path: PathBuf, error: DecodeError },
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<RawDocument>,
    pub skipped: Vec<(PathBuf, DecodeError)>,
}

impl LoadOutcome {
    fn merge(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Loaded(doc) => self.documents.push(doc),
            FileOutcome::Skipped { path, error } => self.skipped.push((path, error)),
        }
    }
}

/// Load every file under `root` matching `filter`.
///
/// Fails only when the root is unusable or a pattern is invalid. The
/// returned documents are sorted by source path regardless of whether
/// decoding ran in parallel.
pub fn load(
    root: &Path,
    filter: &DocumentFilter,
    options: &LoadOptions,
) -> Result<LoadOutcome, LoaderError> {
    if !root.exists() {
        return Err(LoaderError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(LoaderError::NotADirectory(root.to_path_buf()));
    }

    let matcher = Matcher::new(filter)?;
    let exclude_set = build_globset(&options.exclude_globs)?;

    let mut walker = WalkDir::new(root);
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(LoaderError::Walk {
                    root: root.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);

        if exclude_set.is_match(relative) {
            continue;
        }
        if !matcher.is_match(relative) {
            continue;
        }
        paths.push(path.to_path_buf());
    }

    tracing::debug!(root = %root.display(), files = paths.len(), "matched files");

    let outcomes: Vec<FileOutcome> = if options.multithread {
        paths
            .par_iter()
            .map(|p| load_file(p, &options.data_type))
            .collect()
    } else {
        paths
            .iter()
            .map(|p| load_file(p, &options.data_type))
            .collect()
    };

    let mut result = LoadOutcome::default();
    for outcome in outcomes {
        if let FileOutcome::Skipped { path, error } = &outcome {
            tracing::warn!(path = %path.display(), error = %error, "skipping file");
        }
        result.merge(outcome);
    }

    result
        .documents
        .sort_by(|a, b| a.source_id().cmp(&b.source_id()));

    tracing::info!(
        root = %root.display(),
        loaded = result.documents.len(),
        skipped = result.skipped.len(),
        "loaded documents"
    );

    Ok(result)
}

/// Read and decode one file.
pub fn load_file(path: &Path, data_type: &str) -> FileOutcome {
    match decode_file(path, data_type) {
        Ok(doc) => FileOutcome::Loaded(doc),
        Err(error) => FileOutcome::Skipped {
            path: path.to_path_buf(),
            error,
        },
    }
}

fn decode_file(path: &Path, data_type: &str) -> Result<RawDocument, DecodeError> {
    let bytes = std::fs::read(path)?;
    let content_type = content_type_for(path);
    let extracted = extract_text(&bytes, content_type)?;

    let mut metadata = Metadata::new();
    metadata.insert(
        SOURCE_KEY.to_string(),
        MetadataValue::Str(path.display().to_string()),
    );
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    metadata.insert("file_name".to_string(), file_name.into());
    metadata.insert("content_type".to_string(), content_type.into());
    metadata.insert("data_type".to_string(), data_type.into());
    if let Some(encoding) = extracted.encoding {
        metadata.insert("encoding".to_string(), encoding.into());
    }
    if let Some(modified) = modified_rfc3339(path) {
        metadata.insert("modified".to_string(), modified.into());
    }

    Ok(RawDocument::new(metadata, extracted.text))
}

fn modified_rfc3339(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified).to_rfc3339())
}

enum Matcher {
    Extensions(Vec<String>),
    Glob(GlobSet),
}

impl Matcher {
    fn new(filter: &DocumentFilter) -> Result<Self, LoaderError> {
        Ok(match filter {
            DocumentFilter::Extensions(exts) => Matcher::Extensions(
                exts.iter()
                    .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                    .collect(),
            ),
            DocumentFilter::Glob(pattern) => {
                Matcher::Glob(build_globset(std::slice::from_ref(pattern))?)
            }
        })
    }

    fn is_match(&self, relative: &Path) -> bool {
        match self {
            Matcher::Extensions(exts) => relative
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
                .unwrap_or(false),
            Matcher::Glob(set) => set.is_match(relative),
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, LoaderError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| LoaderError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| LoaderError::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}

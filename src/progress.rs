//! Pipeline progress reporting.
//!
//! Reports observable progress during `ingest run` so users see which
//! stage is running and how many batches are left. Progress is emitted on
//! **stderr** so stdout (the corpus report and summary) stays parseable.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Walking and decoding a source directory.
    Loading { source: String },
    /// Tokenizing and computing statistics.
    Analyzing { documents: u64 },
    /// Chunking the records that passed analysis.
    Splitting { records: u64, strategy: String },
    /// Writing batch `batch` (1-based) of `total`, holding `items` chunks.
    Ingesting { batch: u64, total: u64, items: u64 },
    /// Run finished; `count` is the collection size afterwards.
    Done { count: u64 },
}

impl ProgressEvent {
    fn human(&self) -> String {
        match self {
            ProgressEvent::Loading { source } => format!("ingest  loading {}", source),
            ProgressEvent::Analyzing { documents } => {
                format!("ingest  analyzing {} documents", format_number(*documents))
            }
            ProgressEvent::Splitting { records, strategy } => format!(
                "ingest  splitting {} records ({})",
                format_number(*records),
                strategy
            ),
            ProgressEvent::Ingesting { batch, total, items } => format!(
                "ingest  batch {} / {}  {} chunks",
                format_number(*batch),
                format_number(*total),
                format_number(*items)
            ),
            ProgressEvent::Done { count } => {
                format!("ingest  done, collection holds {} items", format_number(*count))
            }
        }
    }

    fn json(&self) -> serde_json::Value {
        match self {
            ProgressEvent::Loading { source } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "source": source
            }),
            ProgressEvent::Analyzing { documents } => serde_json::json!({
                "event": "progress",
                "phase": "analyzing",
                "documents": documents
            }),
            ProgressEvent::Splitting { records, strategy } => serde_json::json!({
                "event": "progress",
                "phase": "splitting",
                "records": records,
                "strategy": strategy
            }),
            ProgressEvent::Ingesting { batch, total, items } => serde_json::json!({
                "event": "progress",
                "phase": "ingesting",
                "batch": batch,
                "total": total,
                "items": items
            }),
            ProgressEvent::Done { count } => serde_json::json!({
                "event": "done",
                "count": count
            }),
        }
    }
}

/// Receives progress events from the pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "ingest  batch 2 / 4  250 chunks".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", event.human());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event.json()) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn human_lines() {
        let e = ProgressEvent::Ingesting {
            batch: 2,
            total: 4,
            items: 1250,
        };
        assert_eq!(e.human(), "ingest  batch 2 / 4  1,250 chunks");
    }

    #[test]
    fn json_events() {
        let e = ProgressEvent::Ingesting {
            batch: 1,
            total: 3,
            items: 3,
        };
        assert_eq!(
            e.json(),
            serde_json::json!({
                "event": "progress",
                "phase": "ingesting",
                "batch": 1,
                "total": 3,
                "items": 3
            })
        );
        assert_eq!(
            ProgressEvent::Done { count: 10 }.json()["event"],
            serde_json::json!("done")
        );
    }
}

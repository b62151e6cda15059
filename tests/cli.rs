//! Runs the `ingest` binary against a temporary corpus and SQLite store.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn ingest_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ingest"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let files_dir = root.join("corpus");
    fs::create_dir_all(files_dir.join("nested")).unwrap();
    fs::write(
        files_dir.join("alpha.txt"),
        "Alpha document about Rust programming.\n\nIt covers cargo and crates.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.txt"),
        "Beta document on machine learning. Frameworks are compared.",
    )
    .unwrap();
    fs::write(
        files_dir.join("nested/gamma.txt"),
        "Gamma notes about deployment and infrastructure.",
    )
    .unwrap();
    fs::write(files_dir.join("empty.txt"), "").unwrap();
    fs::write(files_dir.join("ignored.md"), "Markdown is not matched.").unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("ingest.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[store]
kind = "local"
path = "{db}"
collection = "knowledge"
similarity = "cosine"

[[sources]]
path = "{corpus}"
data_type = "text"

[splitter]
strategy = "recursive"
chunk_size = 1000

[ingest]
batch_count = 2
"#,
            db = root.join("data/ingest.sqlite").display(),
            corpus = files_dir.display(),
        ),
    )
    .unwrap();

    (tmp, config_path)
}

fn run_ingest(config: &Path, args: &[&str]) -> Output {
    Command::new(ingest_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run ingest binary")
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config) = setup_test_env();
    for _ in 0..2 {
        let out = run_ingest(&config, &["init"]);
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("Collection 'knowledge' ready (cosine)"));
    }
}

#[test]
fn test_analyze_prints_report_without_writing() {
    let (tmp, config) = setup_test_env();
    let out = run_ingest(&config, &["analyze"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("DATASET"));
    assert!(stdout.contains("empty.txt"));
    assert!(stdout.contains("4 documents, 3 included, 1 excluded"));
    assert!(!stdout.contains("ignored.md"));
    assert!(!tmp.path().join("data/ingest.sqlite").exists());
}

#[test]
fn test_run_then_count() {
    let (_tmp, config) = setup_test_env();

    let out = run_ingest(&config, &["run", "--progress", "off"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("chunks: 3"));
    assert!(stdout.contains("batches: 2"));
    assert!(stdout.contains("collection count: 0 -> 3"));
    assert!(stdout.trim_end().ends_with("ok"));

    let out = run_ingest(&config, &["count"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "3");
}

#[test]
fn test_dry_run_leaves_collection_empty() {
    let (_tmp, config) = setup_test_env();

    let out = run_ingest(&config, &["run", "--dry-run", "--progress", "json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ingest (dry-run)"));
    assert!(stdout.contains("chunks: 3"));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(r#""phase":"loading""#));

    let out = run_ingest(&config, &["count"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "0");
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[ingest]\nbatch_count = 0\n").unwrap();
    let out = run_ingest(&bad, &["run"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("batch_count"));
}

#[test]
fn test_missing_source_fails() {
    let (tmp, _) = setup_test_env();
    let cfg = tmp.path().join("missing.toml");
    fs::write(
        &cfg,
        format!(
            "[store]\nkind = \"memory\"\n\n[[sources]]\npath = \"{}\"\n",
            tmp.path().join("nowhere").display()
        ),
    )
    .unwrap();
    let out = run_ingest(&cfg, &["run", "--progress", "off"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist"));
}

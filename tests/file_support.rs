//! Decoding of PDF and non-UTF-8 text files through the loader.

use std::fs;

use tempfile::TempDir;

use corpus_ingest::error::DecodeError;
use corpus_ingest::loader::{load, DocumentFilter, LoadOptions};

/// Minimal single-page PDF with one line of Helvetica text.
fn minimal_pdf_with_phrase() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(b"4 0 obj << /Length 44 >> stream\nBT /F1 12 Tf 100 700 Td (sample pdf words) Tj ET\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

#[test]
fn pdf_text_is_extracted() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("paper.pdf"), minimal_pdf_with_phrase()).unwrap();
    fs::write(tmp.path().join("notes.txt"), "not a pdf").unwrap();

    let options = LoadOptions {
        data_type: "pdf".to_string(),
        ..LoadOptions::default()
    };
    let out = load(tmp.path(), &DocumentFilter::Glob("**/*.pdf".into()), &options).unwrap();

    assert_eq!(out.documents.len(), 1);
    assert!(out.skipped.is_empty());
    let doc = &out.documents[0];
    assert!(doc.text.contains("sample pdf words"), "got {:?}", doc.text);
    assert_eq!(doc.metadata["content_type"].to_string(), "application/pdf");
    assert_eq!(doc.metadata["data_type"].to_string(), "pdf");
    assert!(!doc.metadata.contains_key("encoding"));
}

#[test]
fn corrupt_pdf_is_skipped_alongside_good_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("good.pdf"), minimal_pdf_with_phrase()).unwrap();
    fs::write(tmp.path().join("bad.pdf"), b"%PDF-1.4\ngarbage").unwrap();

    let out = load(
        tmp.path(),
        &DocumentFilter::Extensions(vec!["pdf".into()]),
        &LoadOptions::default(),
    )
    .unwrap();

    assert_eq!(out.documents.len(), 1);
    assert_eq!(out.skipped.len(), 1);
    assert!(out.skipped[0].0.ends_with("bad.pdf"));
    assert!(matches!(
        out.skipped[0].1,
        DecodeError::Pdf(_) | DecodeError::Empty
    ));
}

#[test]
fn legacy_encodings_are_detected() {
    let tmp = TempDir::new().unwrap();
    let (latin1, _, _) = encoding_rs::WINDOWS_1252.encode("Café crème, déjà vu à la française.");
    fs::write(tmp.path().join("latin.txt"), &latin1).unwrap();

    let mut utf16 = vec![0xFF, 0xFE];
    for unit in "Grüße aus Köln.".encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(tmp.path().join("utf16.txt"), &utf16).unwrap();

    let out = load(
        tmp.path(),
        &DocumentFilter::Extensions(vec!["txt".into()]),
        &LoadOptions::default(),
    )
    .unwrap();

    assert_eq!(out.documents.len(), 2);
    let latin = &out.documents[0];
    assert_eq!(latin.text, "Café crème, déjà vu à la française.");
    let utf16_doc = &out.documents[1];
    assert_eq!(utf16_doc.text, "Grüße aus Köln.");
    assert_eq!(utf16_doc.metadata["encoding"].to_string(), "UTF-16LE");
}

//! Per-content-type text extraction.
//!
//! The loader hands over raw bytes and a content type; this module returns
//! UTF-8 text or a [`DecodeError`]. Extraction never panics, a failing file
//! is skipped by the caller.

use encoding_rs::Encoding;

use crate::error::DecodeError;

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";

/// Text extracted from a file, plus the encoding it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub text: String,
    pub encoding: Option<&'static str>,
}

/// Content type for a path, decided by extension. Anything that is not a
/// PDF is treated as text.
pub fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => MIME_PDF,
        _ => MIME_TEXT,
    }
}

pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<Extracted, DecodeError> {
    match content_type {
        MIME_PDF => extract_pdf(bytes),
        _ => decode_text(bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<Extracted, DecodeError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| DecodeError::Pdf(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(Extracted {
        text,
        encoding: None,
    })
}

/// Decode bytes with encoding auto-detection: BOM first, then strict
/// UTF-8, then a statistical guess.
pub fn decode_text(bytes: &[u8]) -> Result<Extracted, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(encoding, &bytes[bom_len..]);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Extracted {
            text: text.to_string(),
            encoding: Some(encoding_rs::UTF_8.name()),
        });
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);
    decode_with(guessed, bytes)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<Extracted, DecodeError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DecodeError::Encoding {
            encoding: encoding.name(),
        });
    }
    Ok(Extracted {
        text: text.into_owned(),
        encoding: Some(encoding.name()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn utf8_passes_through() {
        let out = decode_text("héllo wörld".as_bytes()).unwrap();
        assert_eq!(out.text, "héllo wörld");
        assert_eq!(out.encoding, Some("UTF-8"));
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"plain");
        let out = decode_text(&bytes).unwrap();
        assert_eq!(out.text, "plain");
    }

    #[test]
    fn utf16le_bom_is_detected() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hi there".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let out = decode_text(&bytes).unwrap();
        assert_eq!(out.text, "hi there");
        assert_eq!(out.encoding, Some("UTF-16LE"));
    }

    #[test]
    fn latin1_is_guessed() {
        // "café crème" in windows-1252
        let bytes = b"caf\xe9 cr\xe8me, d\xe9j\xe0 vu";
        let out = decode_text(bytes).unwrap();
        assert!(out.text.contains("café"));
        assert_ne!(out.encoding, Some("UTF-8"));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, DecodeError::Pdf(_)));
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("a/b.PDF")), MIME_PDF);
        assert_eq!(content_type_for(Path::new("a/b.txt")), MIME_TEXT);
        assert_eq!(content_type_for(Path::new("README")), MIME_TEXT);
    }
}

//! Recursive character splitting.
//!
//! Text is cut at the coarsest separator that yields small enough pieces:
//! blank lines first, then line breaks, then spaces, then single
//! characters. Pieces keep their trailing separator, so every chunk is an
//! exact substring of the input. Pieces are packed greedily up to
//! `chunk_size` characters, and each chunk after the first starts with the
//! last `chunk_overlap` characters of its predecessor.

use async_trait::async_trait;

use super::{make_chunks, Splitter};
use crate::error::{SplitError, SplitterConfigError};
use crate::models::{Chunk, CorpusRecord};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitterConfigError> {
        if chunk_size == 0 {
            return Err(SplitterConfigError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(SplitterConfigError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Room left in a chunk once the overlap is in place.
    fn budget(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Split one text into chunk strings. Sizes are in characters.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.collect_pieces(text, 0, &mut pieces);

        let mut chunks = Vec::new();
        // Byte range of the chunk under construction and its char length.
        let mut start = 0;
        let mut end = 0;
        let mut len = 0;
        // Set once the current chunk holds text beyond the carried overlap.
        let mut fresh = false;

        for piece in pieces {
            let piece_len = piece.chars().count();
            if fresh && len + piece_len > self.chunk_size {
                chunks.push(&text[start..end]);
                let keep = self.chunk_overlap.min(len);
                start = end - tail_bytes(&text[start..end], keep);
                len = keep;
                fresh = false;
            }
            end += piece.len();
            len += piece_len;
            fresh = true;
        }

        if fresh {
            chunks.push(&text[start..end]);
        }
        chunks
    }

    /// Break `text` into contiguous pieces of at most `budget` chars.
    fn collect_pieces<'a>(&self, text: &'a str, level: usize, out: &mut Vec<&'a str>) {
        let budget = self.budget();
        if text.chars().count() <= budget {
            out.push(text);
            return;
        }

        let separator = SEPARATORS[level.min(SEPARATORS.len() - 1)];
        if separator.is_empty() {
            hard_cut(text, budget, out);
            return;
        }

        let parts: Vec<&str> = text.split_inclusive(separator).collect();
        if parts.len() == 1 {
            self.collect_pieces(text, level + 1, out);
            return;
        }

        for part in parts {
            if part.chars().count() <= budget {
                out.push(part);
            } else {
                self.collect_pieces(part, level + 1, out);
            }
        }
    }
}

/// Byte length of the last `n` chars of `s`.
fn tail_bytes(s: &str, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    s.char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| s.len() - i)
        .unwrap_or(s.len())
}

fn hard_cut<'a>(text: &'a str, size: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == size {
            out.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}

#[async_trait]
impl Splitter for RecursiveSplitter {
    fn name(&self) -> &'static str {
        "recursive"
    }

    async fn split(&self, records: &[CorpusRecord]) -> Result<Vec<Chunk>, SplitError> {
        Ok(records
            .iter()
            .flat_map(|record| make_chunks(record, self.split_text(&record.text)))
            .collect())
    }
}

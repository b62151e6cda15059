//! Sentence-boundary splitting.

use async_trait::async_trait;
use std::collections::VecDeque;

use super::{make_chunks, Splitter};
use crate::error::{SplitError, SplitterConfigError};
use crate::models::{Chunk, CorpusRecord};
use crate::tokenize::{ensure_tokenizer_ready, sent_tokenize, LanguageResources};

/// Joins consecutive sentences with `separator` until the next one would
/// push the chunk past `chunk_size` characters. A single sentence longer
/// than the limit becomes a chunk of its own.
///
/// With a non-zero `chunk_overlap`, each chunk starts with the trailing
/// whole sentences of the previous one, as many as fit in `chunk_overlap`
/// characters.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
    resources: &'static LanguageResources,
}

impl SentenceSplitter {
    pub fn new(
        separator: &str,
        language: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, SplitterConfigError> {
        if separator.is_empty() {
            return Err(SplitterConfigError::EmptySeparator);
        }
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
            separator: separator.to_string(),
            chunk_size,
            chunk_overlap,
            resources: ensure_tokenizer_ready(language)?,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let sep_len = self.separator.chars().count();
        let mut chunks = Vec::new();
        // Sentences of the chunk being built, with their char lengths.
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut len = 0;

        for sentence in sent_tokenize(text, self.resources) {
            let sentence_len = sentence.chars().count();
            let joined = |len: usize| {
                if len == 0 {
                    sentence_len
                } else {
                    len + sep_len + sentence_len
                }
            };

            if !window.is_empty() && joined(len) > self.chunk_size {
                chunks.push(self.join(&window));
                while len > self.chunk_overlap || (len > 0 && joined(len) > self.chunk_size) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    len = if window.is_empty() {
                        0
                    } else {
                        len - dropped - sep_len
                    };
                }
            }
            len = joined(len);
            window.push_back((sentence, sentence_len));
        }

        if !window.is_empty() {
            chunks.push(self.join(&window));
        }
        chunks
    }

    fn join(&self, window: &VecDeque<(String, usize)>) -> String {
        window
            .iter()
            .map(|(s, _)| s.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

#[async_trait]
impl Splitter for SentenceSplitter {
    fn name(&self) -> &'static str {
        "sentence"
    }

    async fn split(&self, records: &[CorpusRecord]) -> Result<Vec<Chunk>, SplitError> {
        Ok(records
            .iter()
            .flat_map(|record| make_chunks(record, self.split_text(&record.text)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::test_support::record;
    use crate::error::TokenizerInitError;

    #[test]
    fn rejects_empty_separator_and_unknown_language() {
        assert_eq!(
            SentenceSplitter::new("", "english", 100, 0).unwrap_err(),
            SplitterConfigError::EmptySeparator
        );
        assert_eq!(
            SentenceSplitter::new("\n\n", "english", 0, 0).unwrap_err(),
            SplitterConfigError::ZeroChunkSize
        );
        assert_eq!(
            SentenceSplitter::new("\n\n", "english", 50, 50).unwrap_err(),
            SplitterConfigError::OverlapTooLarge {
                size: 50,
                overlap: 50
            }
        );
        assert!(matches!(
            SentenceSplitter::new("\n\n", "quenya", 100, 0).unwrap_err(),
            SplitterConfigError::Tokenizer(TokenizerInitError::UnsupportedLanguage { language, .. })
                if language == "quenya"
        ));
    }

    #[test]
    fn overlap_carries_trailing_sentences() {
        let s = SentenceSplitter::new(" ", "english", 40, 15).unwrap();
        let chunks = s.split_text("Alpha one. Beta two. Gamma three. Delta four.");
        assert_eq!(
            chunks,
            vec!["Alpha one. Beta two. Gamma three.", "Gamma three. Delta four."]
        );
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn overlap_never_repeats_an_oversized_sentence() {
        let s = SentenceSplitter::new(" ", "english", 20, 10).unwrap();
        let long = "This sentence runs far past twenty characters.";
        let chunks = s.split_text(&format!("Hi. {} Bye.", long));
        assert_eq!(chunks, vec!["Hi.".to_string(), long.to_string(), "Bye.".to_string()]);
    }

    #[test]
    fn joins_sentences_up_to_limit() {
        let s = SentenceSplitter::new("\n\n", "english", 30, 0).unwrap();
        let chunks = s.split_text("One two three. Four five six. Seven eight nine.");
        assert_eq!(
            chunks,
            vec!["One two three.\n\nFour five six.", "Seven eight nine."]
        );
    }

    #[test]
    fn large_limit_keeps_everything_together() {
        let s = SentenceSplitter::new(" | ", "english", 4000, 200).unwrap();
        let chunks = s.split_text("A cat. A dog. A bird.");
        assert_eq!(chunks, vec!["A cat. | A dog. | A bird."]);
    }

    #[test]
    fn oversized_sentence_stands_alone() {
        let s = SentenceSplitter::new("\n\n", "english", 10, 0).unwrap();
        let long = "This sentence is much longer than ten characters.";
        let chunks = s.split_text(&format!("Hi. {} Bye.", long));
        assert_eq!(chunks, vec!["Hi.", long, "Bye."]);
    }

    #[test]
    fn whitespace_text_has_no_chunks() {
        let s = SentenceSplitter::new("\n\n", "english", 100, 0).unwrap();
        assert!(s.split_text("   ").is_empty());
    }

    #[tokio::test]
    async fn split_keeps_record_order() {
        let s = SentenceSplitter::new("\n\n", "english", 5, 0).unwrap();
        let records = vec![
            record("a.txt", "First. Second."),
            record("b.txt", "Third."),
        ];
        let chunks = s.split(&records).await.unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["First.", "Second.", "Third."]);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[2].chunk_index, 0);
        assert_eq!(chunks[2].source_id, "b.txt");
    }
}

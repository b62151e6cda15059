//! Language-aware word and sentence tokenization.
//!
//! Boundaries come from Unicode text segmentation (UAX #29). Sentence
//! boundaries are then corrected with per-language abbreviation lists so
//! that "Dr. Smith" or "e.g. this" do not end a sentence.
//!
//! Resources for all bundled languages are built once per process behind
//! a single initialization barrier. [`ensure_tokenizer_ready`] is cheap to
//! call repeatedly and from concurrent pipeline runs.

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::TokenizerInitError;

pub const DEFAULT_LANGUAGE: &str = "english";

/// Sentence-boundary resources for one language.
#[derive(Debug)]
pub struct LanguageResources {
    pub language: &'static str,
    abbreviations: HashSet<String>,
}

impl LanguageResources {
    fn new(language: &'static str, abbreviations: &[&str]) -> Self {
        Self {
            language,
            abbreviations: abbreviations.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// True when `word` (without its trailing period) is a known
    /// abbreviation for this language.
    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviations.contains(&word.to_lowercase())
    }
}

static RESOURCES: OnceCell<HashMap<&'static str, LanguageResources>> = OnceCell::new();

fn build_resources() -> HashMap<&'static str, LanguageResources> {
    tracing::debug!("initializing tokenizer resources");
    let table: [(&'static str, &[&str]); 7] = [
        (
            "english",
            &[
                "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e",
                "inc", "ltd", "co", "corp", "no", "fig", "vol", "approx", "dept", "est", "jan",
                "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
                "u.s", "a.m", "p.m", "ph.d",
            ],
        ),
        (
            "german",
            &[
                "z.b", "bzw", "usw", "d.h", "dr", "prof", "nr", "str", "ca", "vgl", "evtl",
                "ggf", "u.a", "s", "hr", "fr",
            ],
        ),
        (
            "french",
            &[
                "m", "mme", "mlle", "dr", "pr", "etc", "p.ex", "cf", "av", "bd", "st", "ste",
                "env", "n°",
            ],
        ),
        (
            "spanish",
            &[
                "sr", "sra", "srta", "dr", "dra", "etc", "ej", "pág", "núm", "ud", "uds", "av",
                "p.ej",
            ],
        ),
        (
            "italian",
            &[
                "sig", "sig.ra", "dott", "prof", "ecc", "es", "pag", "n", "avv", "ing", "geom",
            ],
        ),
        (
            "portuguese",
            &["sr", "sra", "dr", "dra", "etc", "ex", "pág", "av", "prof", "nº"],
        ),
        (
            "dutch",
            &["dhr", "mevr", "dr", "prof", "bijv", "enz", "o.a", "d.w.z", "m.b.t", "nr"],
        ),
    ];
    table
        .iter()
        .map(|(lang, abbrevs)| (*lang, LanguageResources::new(lang, abbrevs)))
        .collect()
}

/// Make tokenizer resources available and return those for `language`.
///
/// The first call builds resources for every bundled language; later calls
/// only look them up. Concurrent first calls block on the same barrier and
/// the build runs exactly once.
pub fn ensure_tokenizer_ready(
    language: &str,
) -> Result<&'static LanguageResources, TokenizerInitError> {
    let resources = RESOURCES.get_or_init(build_resources);
    resources
        .get(language.to_lowercase().as_str())
        .ok_or_else(|| TokenizerInitError::UnsupportedLanguage {
            language: language.to_string(),
            available: supported_languages().join(", "),
        })
}

/// Languages with bundled resources.
pub fn supported_languages() -> Vec<&'static str> {
    let mut langs: Vec<&'static str> = RESOURCES
        .get_or_init(build_resources)
        .keys()
        .copied()
        .collect();
    langs.sort_unstable();
    langs
}

/// Split text into word tokens. Punctuation marks are kept as their own
/// tokens and whitespace is dropped.
pub fn word_tokenize(text: &str) -> Vec<&str> {
    text.split_word_bounds()
        .filter(|w| !w.trim().is_empty())
        .collect()
}

/// Split text into trimmed, non-empty sentences.
pub fn sent_tokenize(text: &str, resources: &LanguageResources) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut pending = String::new();

    for segment in text.split_sentence_bounds() {
        pending.push_str(segment);
        if ends_with_abbreviation(&pending, resources) {
            continue;
        }
        let trimmed = pending.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
        pending.clear();
    }

    let trimmed = pending.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }

    sentences
}

/// A segment ending in "<abbrev>. " must not close the sentence. Single
/// letters followed by a period are treated as initials.
fn ends_with_abbreviation(segment: &str, resources: &LanguageResources) -> bool {
    let trimmed = segment.trim_end();
    let Some(body) = trimmed.strip_suffix('.') else {
        return false;
    };
    let last_word = body
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '"')
        .next()
        .unwrap_or("");
    if last_word.is_empty() {
        return false;
    }
    let mut chars = last_word.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_alphabetic() && c.is_uppercase() {
            return true;
        }
    }
    resources.is_abbreviation(last_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> &'static LanguageResources {
        ensure_tokenizer_ready(DEFAULT_LANGUAGE).unwrap()
    }

    #[test]
    fn init_is_idempotent() {
        let a = ensure_tokenizer_ready("english").unwrap();
        let b = ensure_tokenizer_ready("English").unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn init_from_many_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| ensure_tokenizer_ready("german").map(|r| r.language)))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Ok("german"));
        }
    }

    #[test]
    fn unknown_language_fails() {
        let err = ensure_tokenizer_ready("klingon").unwrap_err();
        match &err {
            TokenizerInitError::UnsupportedLanguage { language, available } => {
                assert_eq!(language, "klingon");
                assert!(available.starts_with("dutch, english"));
            }
        }
        assert!(err.to_string().contains("available: dutch, english, french"));
    }

    #[test]
    fn words_keep_punctuation() {
        let words = word_tokenize("Hello, world!");
        assert_eq!(words, vec!["Hello", ",", "world", "!"]);
    }

    #[test]
    fn words_of_simple_sentence() {
        let words = word_tokenize("the cat sat on the mat");
        assert_eq!(words.len(), 6);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(word_tokenize("").is_empty());
        assert!(word_tokenize("  \n\t ").is_empty());
        assert!(sent_tokenize("", english()).is_empty());
        assert!(sent_tokenize("   \n", english()).is_empty());
    }

    #[test]
    fn sentences_split_on_terminators() {
        let s = sent_tokenize("First one. Second one? Third!", english());
        assert_eq!(s, vec!["First one.", "Second one?", "Third!"]);
    }

    #[test]
    fn abbreviations_do_not_split() {
        let s = sent_tokenize("Dr. Smith arrived at noon. He left early.", english());
        assert_eq!(s, vec!["Dr. Smith arrived at noon.", "He left early."]);
    }

    #[test]
    fn initials_do_not_split() {
        let s = sent_tokenize("Written by J. Doe in town. The end.", english());
        assert_eq!(s, vec!["Written by J. Doe in town.", "The end."]);
    }

    #[test]
    fn language_specific_abbreviations() {
        let german = ensure_tokenizer_ready("german").unwrap();
        let s = sent_tokenize("Das ist bzw. war gut. Ende.", german);
        assert_eq!(s, vec!["Das ist bzw. war gut.", "Ende."]);
    }
}

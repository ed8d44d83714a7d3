// Description cleaning and tokenization
use crate::listing::{Description, Listing};
use crate::model::CountError;
use crate::utils::unescape_unicode;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z]").expect("letter scrub pattern is valid"));

/// Which characters survive cleaning. Everything the scrub pattern matches becomes a space.
#[derive(Debug, Clone)]
pub struct KeepPattern {
    scrub: Regex,
}

impl KeepPattern {
    /// Keeps ASCII letters only.
    pub fn letters() -> Self {
        Self {
            scrub: NON_LETTERS.clone(),
        }
    }

    /// Keeps ASCII letters plus every character of `extra`, e.g. `".+3"` so that
    /// "C++" and "D3.js" stay in one piece.
    pub fn letters_and(extra: &str) -> Result<Self, regex::Error> {
        Self::scrub(&format!("[^a-zA-Z{}]", regex::escape(extra)))
    }

    /// Uses `pattern` as the set of characters to replace.
    pub fn scrub(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            scrub: Regex::new(pattern)?,
        })
    }

    fn apply(&self, text: &str) -> String {
        self.scrub.replace_all(text, " ").into_owned()
    }
}

impl Default for KeepPattern {
    fn default() -> Self {
        Self::letters()
    }
}

/// Turns a description into the set of distinct, meaningful lowercase words.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    keywords: HashSet<String>,
    stopwords: HashSet<String>,
}

impl TextNormalizer {
    /// `keywords` are matched case-insensitively and keep their periods ("d3.js").
    /// `stopwords` are expected in lowercase.
    pub fn new<S: AsRef<str>>(keywords: &[S], stopwords: HashSet<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
            stopwords,
        }
    }

    pub fn tokens(&self, description: &str, keep: &KeepPattern) -> BTreeSet<String> {
        // Runs of two or more spaces usually separate columns or headlines.
        let text = description
            .lines()
            .flat_map(|line| line.trim().split("  "))
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let text = keep.apply(&unescape_unicode(&text)).to_lowercase();

        text.split_whitespace()
            .map(|word| {
                if self.keywords.contains(word) {
                    word.to_string()
                } else {
                    word.replace('.', "")
                }
            })
            .filter(|word| !word.is_empty() && !self.stopwords.contains(word))
            .collect()
    }

    /// Tokens of a listing's description. A dead listing yields no tokens.
    pub fn listing_tokens(&self, listing: &Listing, keep: &KeepPattern) -> Result<BTreeSet<String>, CountError> {
        match &listing.description {
            Description::NotFetched => Err(CountError::DescriptionNotFetched {
                job_id: listing.job_id.clone(),
            }),
            description => Ok(self.tokens(description.text(), keep)),
        }
    }
}

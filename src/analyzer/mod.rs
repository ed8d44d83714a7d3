// Analyzer module: keyword frequency analysis over listing descriptions.

pub mod keyword_counter;

pub use keyword_counter::{DATA_SCI_KEYWORDS, KeywordCounter, KeywordScore, KeywordTable, TokenSource};

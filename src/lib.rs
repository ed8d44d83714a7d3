pub mod analyzer;
pub mod config;
pub mod listing;
pub mod location;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod scraper;
pub mod search;
pub mod stopwords;
pub mod storage;
pub mod utils;

pub use crate::analyzer::{KeywordCounter, KeywordTable, TokenSource};
pub use crate::listing::{Description, Listing};
pub use crate::location::Location;
pub use crate::normalizer::{KeepPattern, TextNormalizer};
pub use crate::scraper::Fetcher;
pub use crate::search::{FetchStatus, Search};

use crate::model::{RawResult, ScraperError};

/// Page-fetching collaborator. The core only sees these two shapes.
pub trait Fetcher {
    /// Fetches one search-results page and returns its raw result records in page order.
    fn search_page(&self, url: &str) -> Result<Vec<RawResult>, ScraperError>;

    /// Fetches a listing's detail page and returns its description text,
    /// or `None` when the page carries no description.
    fn fetch_page_text(&self, url: &str) -> Result<Option<String>, ScraperError>;
}

// Shared types: raw scrape records and the error taxonomy
use thiserror::Error;

/// City/state value for listings whose location could not be read.
/// Matches no real search location.
pub const NA: &str = "NA";

/// One search-result entry as the page fetcher hands it over, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub job_id: String,
    /// Raw location text, usually "City, ST" or "City, ST-extra".
    pub location: String,
    pub job_title: String,
    pub company: String,
    pub job_url: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed location {0:?}: expected \"City, ST\"")]
    MalformedLocation(String),
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid response status {0}")]
    InvalidResponse(u16),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("html parse error: {0}")]
    HtmlParseError(String),
    #[error("missing field: {0}")]
    MissingField(String),
}

/// Failure to rebuild a listing or search from its persisted JSON form.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid json record: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Location(#[from] ParseError),
    #[error("job ids do not match results: {0}")]
    InconsistentJobIds(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CountError {
    #[error("description of listing {job_id} has not been fetched")]
    DescriptionNotFetched { job_id: String },
}

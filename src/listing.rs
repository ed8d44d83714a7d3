// A single job posting and its persisted record form
use crate::location::Location;
use crate::model::{RawResult, RecordError, ScraperError};
use crate::scraper::Fetcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const JOB_LOOKUP_URL: &str = "https://www.monster.com/jobs/search/?jobid=";

/// Fetch state of a listing's description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Description {
    #[default]
    NotFetched,
    /// Fetched, but the page had no description (dead or removed listing).
    Empty,
    Present(String),
}

impl Description {
    fn from_fetched(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.is_empty() => Self::Present(text),
            _ => Self::Empty,
        }
    }

    pub fn is_fetched(&self) -> bool {
        !matches!(self, Self::NotFetched)
    }

    /// Description text; empty when missing or not fetched.
    pub fn text(&self) -> &str {
        match self {
            Self::Present(text) => text,
            _ => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub job_id: String,
    /// Static page of the posting, not the search page it was found on.
    pub job_url: String,
    pub location: Location,
    pub company: String,
    pub job_title: String,
    pub description: Description,
}

/// Persisted JSON form of a [`Listing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub job_id: String,
    pub job_url: String,
    pub location: String,
    pub company: String,
    pub job_title: String,
    /// Empty until a description was fetched.
    #[serde(default)]
    pub description: String,
}

impl Listing {
    pub fn new(job_id: &str, job_url: &str, location: Location, company: &str, job_title: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            job_url: job_url.to_string(),
            location,
            company: company.to_string(),
            job_title: job_title.to_string(),
            description: Description::NotFetched,
        }
    }

    /// Builds a listing from a scraped search result. The description is left unfetched.
    ///
    /// A location without a comma becomes [`Location::unknown`]; the state part is cut
    /// to two characters so "NY-10001" reads as "NY".
    pub fn from_raw_result(raw: Option<&RawResult>) -> Option<Self> {
        let raw = raw?;
        let location = match raw.location.split_once(',') {
            Some((city, state)) => {
                let state: String = state.trim().chars().take(2).collect();
                Location::new(city.trim(), &state)
            }
            None => Location::unknown(),
        };
        Some(Self::new(&raw.job_id, &raw.job_url, location, &raw.company, &raw.job_title))
    }

    /// Looks a posting up by id on the job board.
    pub fn from_id(fetcher: &dyn Fetcher, job_id: &str) -> Result<Option<Self>, ScraperError> {
        let url = format!("{}{}", JOB_LOOKUP_URL, job_id);
        let results = fetcher.search_page(&url)?;
        Ok(Self::from_raw_result(results.first()))
    }

    /// Fetches the description from `job_url`, replacing any previous one.
    /// On failure the description is left as it was.
    pub fn fetch_description(&mut self, fetcher: &dyn Fetcher) -> Result<(), ScraperError> {
        let text = fetcher.fetch_page_text(&self.job_url)?;
        self.description = Description::from_fetched(text);
        debug!("Fetched description for {} ({} chars)", self.job_id, self.description.text().len());
        Ok(())
    }

    /// First `limit` characters of the description followed by `ellipsis`.
    ///
    /// The limit counts characters, not words, and the ellipsis is appended even when
    /// nothing was cut.
    pub fn excerpt(&self, limit: usize, ellipsis: &str) -> String {
        let mut out: String = self.description.text().chars().take(limit).collect();
        out.push_str(ellipsis);
        out
    }

    pub fn to_record(&self) -> ListingRecord {
        ListingRecord {
            job_id: self.job_id.clone(),
            job_url: self.job_url.clone(),
            location: self.location.to_string(),
            company: self.company.clone(),
            job_title: self.job_title.clone(),
            description: self.description.text().to_string(),
        }
    }

    /// Rebuilds a listing. The location is re-parsed, so alternates never survive.
    /// An empty description reads back as not fetched, since the record cannot tell
    /// a dead listing from one never fetched.
    pub fn from_record(record: ListingRecord) -> Result<Self, RecordError> {
        let location = Location::parse(&record.location)?;
        Ok(Self {
            job_id: record.job_id,
            job_url: record.job_url,
            location,
            company: record.company,
            job_title: record.job_title,
            description: match record.description {
                text if text.is_empty() => Description::NotFetched,
                text => Description::Present(text),
            },
        })
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Self::from_record(serde_json::from_str(json)?)
    }
}

/// Listings are the same posting when their job ids match.
impl PartialEq for Listing {
    fn eq(&self, other: &Self) -> bool {
        self.job_id == other.job_id
    }
}

impl Eq for Listing {}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job Title: {}", self.job_title)?;
        writeln!(f, "Company: {}", self.company)?;
        writeln!(f, "Location: {}", self.location)?;
        write!(f, "ID: {}", self.job_id)
    }
}

use crate::model::{RawResult, ScraperError};
use crate::parser::{MonsterParser, Parser};
use crate::scraper::Fetcher;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) JobScoutBot/0.1";

/// Blocking HTTP fetcher for the job board.
pub struct ScraperImpl {
    client: Client,
    parser: MonsterParser,
}

impl ScraperImpl {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(http_error)?;

        Ok(Self {
            client,
            parser: MonsterParser::new(),
        })
    }

    fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(http_error)?;

        if !response.status().is_success() {
            return Err(ScraperError::InvalidResponse(response.status().as_u16()));
        }

        response.text().map_err(http_error)
    }
}

impl Fetcher for ScraperImpl {
    fn search_page(&self, url: &str) -> Result<Vec<RawResult>, ScraperError> {
        let html = self.fetch(url)?;
        Ok(self.parser.parse(&html)?)
    }

    /// A removed posting (404/410) counts as a page without a description.
    fn fetch_page_text(&self, url: &str) -> Result<Option<String>, ScraperError> {
        match self.fetch(url) {
            Ok(html) => Ok(self.parser.extract_description(&html)?),
            Err(ScraperError::InvalidResponse(status))
                if status == StatusCode::NOT_FOUND.as_u16() || status == StatusCode::GONE.as_u16() =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn http_error(e: reqwest::Error) -> ScraperError {
    if e.is_timeout() {
        ScraperError::Timeout
    } else {
        ScraperError::HttpError(e.to_string())
    }
}

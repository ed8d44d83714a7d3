// Monster-specific HTML parsing
use crate::model::{ParserError, RawResult};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub trait Parser {
    fn parse(&self, html: &str) -> Result<Vec<RawResult>, ParserError>;
}

pub struct MonsterParser;

impl MonsterParser {
    pub fn new() -> Self {
        Self
    }

    /// Text of the `#JobDescription` block, with a space between the text of adjacent nodes.
    /// `None` when the page has no description block.
    pub fn extract_description(&self, html: &str) -> Result<Option<String>, ParserError> {
        let document = Html::parse_document(html);
        let body_selector = selector("div#JobDescription")?;

        Ok(document
            .select(&body_selector)
            .next()
            .map(|body| body.text().collect::<Vec<_>>().join(" ")))
    }
}

impl Default for MonsterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MonsterParser {
    fn parse(&self, html: &str) -> Result<Vec<RawResult>, ParserError> {
        let document = Html::parse_document(html);

        let item_selector = selector("section[data-jobid]")?;
        let location_selector = selector("div.location span.name")?;
        let title_selector = selector("h2.title a[href]")?;
        let company_selector = selector("div.company span.name")?;

        let mut results = Vec::new();

        for element in document.select(&item_selector) {
            let Some(job_id) = element.value().attr("data-jobid").filter(|id| !id.is_empty()) else {
                debug!("Skipping search result without a job id");
                continue;
            };
            let location = first_text(element, &location_selector);
            let company = first_text(element, &company_selector);
            let title_node = element.select(&title_selector).next();

            match (location, company, title_node) {
                (Some(location), Some(company), Some(title_node)) => {
                    results.push(RawResult {
                        job_id: job_id.to_string(),
                        location,
                        job_title: title_node.text().collect::<String>().trim().to_string(),
                        company,
                        job_url: title_node.value().attr("href").unwrap_or_default().to_string(),
                    });
                }
                _ => debug!("Skipping incomplete search result {}", job_id),
            }
        }

        Ok(results)
    }
}

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::HtmlParseError(e.to_string()))
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
}

// Ordered, deduplicated search results keyed by job id
use crate::listing::{Description, Listing, ListingRecord};
use crate::location::Location;
use crate::model::{RecordError, ScraperError};
use crate::scraper::Fetcher;
use crate::utils::to_kebab_case;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const SEARCH_URL: &str = "https://www.monster.com/jobs/search/";

/// Pause between two description requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Results of one query in one location.
///
/// Listings are kept in the order they were first seen; the job ids are the keys of the
/// result map, so they can neither repeat nor drift from the stored listings.
#[derive(Debug, Clone)]
pub struct Search {
    pub location: Location,
    pub query: String,
    /// Other acceptable job-title substrings besides the query itself.
    pub extra_titles: Option<Vec<String>>,
    results: Option<IndexMap<String, Listing>>,
    request_delay: Duration,
}

/// Outcome of [`Search::fetch_listings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Results were already present and no refetch was forced.
    AlreadyFetched,
    Fetched {
        accepted: usize,
        /// Wrong location or title.
        rejected: usize,
        duplicates: usize,
    },
}

/// Outcome of [`Search::fetch_descriptions`].
#[derive(Debug, Default)]
pub struct DescriptionReport {
    pub already_present: usize,
    pub fetched: usize,
    /// Pages that answered without a description.
    pub dead: usize,
    pub failed: Vec<(String, ScraperError)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub main: String,
    pub alternates: Vec<String>,
}

/// Persisted JSON form of a [`Search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub location: LocationRecord,
    pub query: String,
    pub extra_titles: Option<Vec<String>>,
    #[serde(default)]
    pub base_url: String,
    pub results: IndexMap<String, ListingRecord>,
    pub job_ids: Vec<String>,
}

impl Search {
    /// A search that has not been fetched yet.
    pub fn new(location: Location, query: &str, extra_titles: Option<Vec<String>>) -> Self {
        Self {
            location,
            query: query.to_string(),
            extra_titles,
            results: None,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn base_url(&self) -> String {
        format!(
            "{}?q={}&where={}",
            SEARCH_URL,
            to_kebab_case(&self.query),
            self.location.search_token()
        )
    }

    fn page_url(&self, page_limit: u32) -> String {
        format!("{}&stpage=1&page={}", self.base_url(), page_limit)
    }

    /// True when the listing is in a matching location and its title contains the query
    /// or one of the extra titles, ignoring case.
    pub fn is_valid(&self, listing: &Listing) -> bool {
        if !self.location.matches(&listing.location) {
            return false;
        }
        let title = listing.job_title.to_lowercase();
        title.contains(&self.query.to_lowercase())
            || self
                .extra_titles
                .iter()
                .flatten()
                .any(|extra| title.contains(&extra.to_lowercase()))
    }

    /// Fetches the result pages `1..=page_limit` and keeps valid listings in page order,
    /// dropping repeated job ids.
    ///
    /// Does nothing when results are already present, unless `force_refetch` is set.
    /// A failed request leaves the results empty and returns the error.
    pub fn fetch_listings(
        &mut self,
        fetcher: &dyn Fetcher,
        page_limit: u32,
        force_refetch: bool,
    ) -> Result<FetchStatus, ScraperError> {
        if !self.is_empty() && !force_refetch {
            info!(
                "Results for '{}' already fetched. Set force_refetch to fetch them again.",
                self.query
            );
            return Ok(FetchStatus::AlreadyFetched);
        }

        self.results = Some(IndexMap::new());
        let url = self.page_url(page_limit);
        info!("Fetching listings: {}", url);

        let raw_results = fetcher
            .search_page(&url)
            .inspect_err(|e| warn!("Listing fetch for '{}' failed: {}", self.query, e))?;

        let mut accepted = IndexMap::new();
        let (mut rejected, mut duplicates) = (0, 0);
        for raw in &raw_results {
            let Some(listing) = Listing::from_raw_result(Some(raw)) else {
                continue;
            };
            if !self.is_valid(&listing) {
                rejected += 1;
            } else if accepted.contains_key(&listing.job_id) {
                duplicates += 1;
            } else {
                accepted.insert(listing.job_id.clone(), listing);
            }
        }

        let status = FetchStatus::Fetched {
            accepted: accepted.len(),
            rejected,
            duplicates,
        };
        info!("Fetched listings for '{}': {:?}", self.query, status);
        self.results = Some(accepted);
        Ok(status)
    }

    /// Fetches missing descriptions one listing at a time, sleeping the request delay
    /// after every request.
    ///
    /// Only listings holding a non-empty description are skipped; dead listings are
    /// asked for again. Failures are collected per listing and never stop the run.
    pub fn fetch_descriptions(&mut self, fetcher: &dyn Fetcher, quiet: bool) -> DescriptionReport {
        let mut report = DescriptionReport::default();
        let delay = self.request_delay;

        let Some(results) = self.results.as_mut() else {
            warn!("No listings yet for '{}': call fetch_listings first", self.query);
            return report;
        };

        for (index, listing) in results.values_mut().enumerate() {
            let n = index + 1;
            if matches!(listing.description, Description::Present(_)) {
                report.already_present += 1;
                if !quiet {
                    info!("Description #{} is already present.", n);
                }
                continue;
            }

            match listing.fetch_description(fetcher) {
                Ok(()) if matches!(listing.description, Description::Present(_)) => {
                    report.fetched += 1;
                    if !quiet {
                        info!("Description #{} successfully fetched.", n);
                    }
                }
                Ok(()) => {
                    report.dead += 1;
                    if !quiet {
                        warn!("Listing #{} ({}) appears to be dead...", n, listing.job_id);
                    }
                }
                Err(e) => {
                    warn!("Description #{} ({}) failed: {}", n, listing.job_id, e);
                    report.failed.push((listing.job_id.clone(), e));
                }
            }
            thread::sleep(delay);
        }

        report
    }

    /// Whether `fetch_listings` has run (or the search was loaded with results).
    pub fn is_fetched(&self) -> bool {
        self.results.is_some()
    }

    pub fn len(&self) -> usize {
        self.results.as_ref().map_or(0, IndexMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, job_id: &str) -> Option<&Listing> {
        self.results.as_ref()?.get(job_id)
    }

    /// Job ids in fetch order.
    pub fn job_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.results
            .iter()
            .flat_map(|results| results.keys().map(String::as_str))
    }

    /// Listings in fetch order. Every call gets its own cursor.
    pub fn iter(&self) -> Listings<'_> {
        Listings {
            inner: self.results.as_ref().map(IndexMap::values),
        }
    }

    pub fn to_record(&self) -> SearchRecord {
        SearchRecord {
            location: LocationRecord {
                main: self.location.to_string(),
                alternates: self
                    .location
                    .alternates()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            },
            query: self.query.clone(),
            extra_titles: self.extra_titles.clone(),
            base_url: self.base_url(),
            results: self
                .iter()
                .map(|listing| (listing.job_id.clone(), listing.to_record()))
                .collect(),
            job_ids: self.job_ids().map(str::to_string).collect(),
        }
    }

    /// Rebuilds a search in `job_ids` order. Every job id needs exactly one result
    /// and every result needs a job id.
    pub fn from_record(record: SearchRecord) -> Result<Self, RecordError> {
        let location = Location::parse_with_alternates(&record.location.main, record.location.alternates.as_slice())?;

        let mut pending = record.results;
        let mut seen = HashSet::new();
        let mut results = IndexMap::with_capacity(record.job_ids.len());
        for job_id in record.job_ids {
            if !seen.insert(job_id.clone()) {
                return Err(RecordError::InconsistentJobIds(format!("duplicate job id {}", job_id)));
            }
            let listing = pending
                .shift_remove(&job_id)
                .ok_or_else(|| RecordError::InconsistentJobIds(format!("no result for job id {}", job_id)))?;
            if listing.job_id != job_id {
                return Err(RecordError::InconsistentJobIds(format!(
                    "result {} holds job id {}",
                    job_id, listing.job_id
                )));
            }
            results.insert(job_id, Listing::from_record(listing)?);
        }
        if let Some(orphan) = pending.keys().next() {
            return Err(RecordError::InconsistentJobIds(format!("result {} is not in job_ids", orphan)));
        }

        Ok(Self {
            location,
            query: record.query,
            extra_titles: record.extra_titles,
            results: Some(results),
            request_delay: DEFAULT_REQUEST_DELAY,
        })
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Self::from_record(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Query: {}", self.query)?;
        writeln!(f, "Location: {}", self.location)?;
        write!(f, "Number of Listings: {}", self.len())
    }
}

/// Iterator over a search's listings in fetch order.
#[derive(Debug, Clone)]
pub struct Listings<'a> {
    inner: Option<indexmap::map::Values<'a, String, Listing>>,
}

impl<'a> Iterator for Listings<'a> {
    type Item = &'a Listing;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.as_ref().map_or((0, Some(0)), Iterator::size_hint)
    }
}

impl ExactSizeIterator for Listings<'_> {}

impl<'a> IntoIterator for &'a Search {
    type Item = &'a Listing;
    type IntoIter = Listings<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawResult;
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct StubBoard {
        page: Vec<RawResult>,
        offline: bool,
        dead_urls: Vec<String>,
        failing_urls: Vec<String>,
        searches: Cell<usize>,
        fetched_urls: RefCell<Vec<String>>,
    }

    impl Fetcher for StubBoard {
        fn search_page(&self, _url: &str) -> Result<Vec<RawResult>, ScraperError> {
            self.searches.set(self.searches.get() + 1);
            if self.offline {
                return Err(ScraperError::HttpError("dns failure".into()));
            }
            Ok(self.page.clone())
        }

        fn fetch_page_text(&self, url: &str) -> Result<Option<String>, ScraperError> {
            self.fetched_urls.borrow_mut().push(url.to_string());
            if self.failing_urls.iter().any(|u| u == url) {
                return Err(ScraperError::Timeout);
            }
            if self.dead_urls.iter().any(|u| u == url) {
                return Ok(None);
            }
            Ok(Some(format!("Description at {url}")))
        }
    }

    fn raw(id: &str, location: &str, title: &str) -> RawResult {
        RawResult {
            job_id: id.into(),
            location: location.into(),
            job_title: title.into(),
            company: "Acme".into(),
            job_url: format!("https://jobs.example/{id}"),
        }
    }

    fn nyc_search() -> Search {
        let location = Location::parse_with_alternates("New York, NY", &["Brooklyn, NY", "Hoboken, NJ"]).unwrap();
        Search::new(
            location,
            "Data Scientist",
            Some(vec!["Data Science".into(), "Data Engineer".into()]),
        )
        .with_request_delay(Duration::ZERO)
    }

    fn board() -> StubBoard {
        StubBoard {
            page: vec![
                raw("1", "New York, NY", "Senior Data Scientist"),
                raw("2", "Brooklyn, NY-11201", "data engineer"),
                raw("3", "Boston, MA", "Data Scientist"),
                raw("1", "New York, NY", "Senior Data Scientist"),
                raw("4", "Hoboken, NJ", "Head of Data Science"),
                raw("5", "New York, NY", "Accountant"),
                raw("6", "Remote", "Data Scientist"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn base_url_uses_slugs() {
        assert_eq!(
            nyc_search().base_url(),
            "https://www.monster.com/jobs/search/?q=data-scientist&where=New-York__2C-NY"
        );
    }

    #[test]
    fn validity_needs_location_and_title() {
        let search = nyc_search();
        let ok = Listing::from_raw_result(Some(&raw("1", "Brooklyn, NY", "Data Engineer II"))).unwrap();
        let wrong_place = Listing::from_raw_result(Some(&raw("2", "Austin, TX", "Data Scientist"))).unwrap();
        let wrong_title = Listing::from_raw_result(Some(&raw("3", "New York, NY", "Chef"))).unwrap();
        assert!(search.is_valid(&ok));
        assert!(!search.is_valid(&wrong_place));
        assert!(!search.is_valid(&wrong_title));
    }

    #[test]
    fn without_extra_titles_only_query_counts() {
        let search = Search::new(Location::new("New York", "NY"), "Data Scientist", None);
        let engineer = Listing::from_raw_result(Some(&raw("1", "New York, NY", "Data Engineer"))).unwrap();
        let scientist = Listing::from_raw_result(Some(&raw("2", "New York, NY", "DATA SCIENTIST"))).unwrap();
        assert!(!search.is_valid(&engineer));
        assert!(search.is_valid(&scientist));
    }

    #[test]
    fn fetch_listings_filters_and_dedups_in_order() {
        let mut search = nyc_search();
        let status = search.fetch_listings(&board(), 1, false).unwrap();
        assert_eq!(
            status,
            FetchStatus::Fetched { accepted: 3, rejected: 3, duplicates: 1 }
        );
        assert_eq!(search.job_ids().collect::<Vec<_>>(), ["1", "2", "4"]);
        assert_eq!(search.len(), 3);
    }

    #[test]
    fn second_fetch_is_a_no_op_unless_forced() {
        let board = board();
        let mut search = nyc_search();
        search.fetch_listings(&board, 1, false).unwrap();
        let before: Vec<String> = search.job_ids().map(str::to_string).collect();

        assert_eq!(search.fetch_listings(&board, 1, false).unwrap(), FetchStatus::AlreadyFetched);
        assert_eq!(board.searches.get(), 1);
        assert_eq!(search.job_ids().collect::<Vec<_>>(), before);

        assert!(matches!(search.fetch_listings(&board, 1, true).unwrap(), FetchStatus::Fetched { .. }));
        assert_eq!(board.searches.get(), 2);
        assert_eq!(search.len(), 3);
    }

    #[test]
    fn failed_fetch_leaves_empty_results() {
        let mut search = nyc_search();
        let offline = StubBoard { offline: true, ..Default::default() };
        assert!(search.fetch_listings(&offline, 1, false).is_err());
        assert!(search.is_fetched());
        assert!(search.is_empty());
    }

    #[test]
    fn fetch_descriptions_skips_present_and_collects_failures() {
        let mut board = board();
        board.dead_urls.push("https://jobs.example/2".into());
        board.failing_urls.push("https://jobs.example/4".into());

        let mut search = nyc_search();
        search.fetch_listings(&board, 1, false).unwrap();
        let report = search.fetch_descriptions(&board, true);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.dead, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "4");
        assert_eq!(
            search.get("1").unwrap().description,
            Description::Present("Description at https://jobs.example/1".into())
        );
        assert_eq!(search.get("2").unwrap().description, Description::Empty);
        assert_eq!(search.get("4").unwrap().description, Description::NotFetched);

        board.fetched_urls.borrow_mut().clear();
        let again = search.fetch_descriptions(&board, false);
        assert_eq!(again.already_present, 1);
        assert_eq!(
            *board.fetched_urls.borrow(),
            ["https://jobs.example/2", "https://jobs.example/4"]
        );
    }

    #[test]
    fn saved_file_with_empty_descriptions_is_fetched_on_resume() {
        let saved = r#"{
            "location": {"main": "New York, NY", "alternates": ["Brooklyn, NY"]},
            "query": "Data Scientist",
            "extra_titles": ["Data Science", "Data Engineer"],
            "base_url": "https://www.monster.com/jobs/search/?q=data-scientist&where=New-York__2C-NY",
            "results": {
                "1": {"job_id": "1", "job_url": "https://jobs.example/1", "location": "Brooklyn, NY",
                      "company": "Acme", "job_title": "Data Scientist", "description": ""}
            },
            "job_ids": ["1"]
        }"#;
        let board = board();
        let mut search = Search::from_json(saved).unwrap().with_request_delay(Duration::ZERO);
        assert_eq!(search.get("1").unwrap().description, Description::NotFetched);

        let report = search.fetch_descriptions(&board, true);
        assert_eq!(report.already_present, 0);
        assert_eq!(report.fetched, 1);
        assert_eq!(*board.fetched_urls.borrow(), ["https://jobs.example/1"]);
    }

    #[test]
    fn written_records_use_string_descriptions() {
        let mut search = nyc_search();
        search.fetch_listings(&board(), 1, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&search.to_json().unwrap()).unwrap();
        for job_id in ["1", "2", "4"] {
            assert_eq!(value["results"][job_id]["description"], serde_json::json!(""));
            assert_eq!(value["results"][job_id]["job_id"], serde_json::json!(job_id));
        }
    }

    #[test]
    fn result_key_must_match_inner_job_id() {
        let mut search = nyc_search();
        search.fetch_listings(&board(), 1, false).unwrap();
        let mut record = search.to_record();
        record.results.get_mut("1").unwrap().job_id = "2".into();
        assert!(matches!(Search::from_record(record), Err(RecordError::InconsistentJobIds(_))));
    }

    #[test]
    fn fetch_descriptions_before_listings_does_nothing() {
        let board = board();
        let report = nyc_search().fetch_descriptions(&board, false);
        assert_eq!(report.fetched + report.already_present + report.dead, 0);
        assert!(board.fetched_urls.borrow().is_empty());
    }

    #[test]
    fn iterators_are_independent() {
        let mut search = nyc_search();
        search.fetch_listings(&board(), 1, false).unwrap();

        let mut first = search.iter();
        assert_eq!(first.next().unwrap().job_id, "1");
        let second: Vec<_> = search.iter().map(|l| l.job_id.as_str()).collect();
        assert_eq!(second, ["1", "2", "4"]);
        assert_eq!(first.next().unwrap().job_id, "2");
        assert_eq!((&search).into_iter().len(), 3);
    }

    #[test]
    fn record_round_trip_preserves_order_and_alternates() {
        let board = board();
        let mut search = nyc_search();
        search.fetch_listings(&board, 1, false).unwrap();
        search.fetch_descriptions(&board, true);

        let back = Search::from_json(&search.to_json().unwrap()).unwrap();
        assert_eq!(back.len(), search.len());
        assert_eq!(back.job_ids().collect::<Vec<_>>(), search.job_ids().collect::<Vec<_>>());
        assert_eq!(back.location.alternates().len(), 2);
        assert_eq!(back.extra_titles, search.extra_titles);
        for listing in &search {
            let other = back.get(&listing.job_id).unwrap();
            assert_eq!(other, listing);
            assert_eq!(other.description, listing.description);
        }
        assert_eq!(back.to_record(), search.to_record());
    }

    #[test]
    fn record_layout_matches_persisted_files() {
        let search = Search::new(Location::parse_with_alternates("New York, NY", &["Brooklyn, NY"]).unwrap(), "Data Scientist", None);
        let value: serde_json::Value = serde_json::from_str(&search.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "location": {"main": "New York, NY", "alternates": ["Brooklyn, NY"]},
                "query": "Data Scientist",
                "extra_titles": null,
                "base_url": "https://www.monster.com/jobs/search/?q=data-scientist&where=New-York__2C-NY",
                "results": {},
                "job_ids": []
            })
        );
    }

    #[test]
    fn inconsistent_job_ids_are_rejected() {
        let mut search = nyc_search();
        search.fetch_listings(&board(), 1, false).unwrap();

        let mut missing = search.to_record();
        missing.job_ids.push("99".into());
        assert!(matches!(Search::from_record(missing), Err(RecordError::InconsistentJobIds(_))));

        let mut orphan = search.to_record();
        orphan.job_ids.pop();
        assert!(matches!(Search::from_record(orphan), Err(RecordError::InconsistentJobIds(_))));

        let mut duplicate = search.to_record();
        duplicate.job_ids.push("1".into());
        assert!(matches!(Search::from_record(duplicate), Err(RecordError::InconsistentJobIds(_))));
    }

    #[test]
    fn missing_fields_fail_hard() {
        assert!(matches!(Search::from_json(r#"{"query":"x"}"#), Err(RecordError::Json(_))));
    }

    #[test]
    fn display_summarizes() {
        assert_eq!(
            nyc_search().to_string(),
            "Search Query: Data Scientist\nLocation: New York, NY\nNumber of Listings: 0"
        );
    }

    proptest! {
        #[test]
        fn job_ids_never_repeat(ids in proptest::collection::vec(0u8..8, 0..30)) {
            let page = ids
                .iter()
                .map(|id| raw(&id.to_string(), "New York, NY", "Data Scientist"))
                .collect();
            let board = StubBoard { page, ..Default::default() };
            let mut search = nyc_search();
            search.fetch_listings(&board, 1, false).unwrap();

            let job_ids: Vec<&str> = search.job_ids().collect();
            let unique: HashSet<&str> = job_ids.iter().copied().collect();
            prop_assert_eq!(search.len(), job_ids.len());
            prop_assert_eq!(job_ids.len(), unique.len());
        }
    }
}

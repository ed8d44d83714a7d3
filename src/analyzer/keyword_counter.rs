use crate::listing::Listing;
use crate::model::CountError;
use crate::normalizer::{KeepPattern, TextNormalizer};
use crate::search::Search;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::debug;

/// Skills commonly asked for in data-science postings.
pub const DATA_SCI_KEYWORDS: &[&str] = &[
    "Python", "R", "Spark", "Hadoop", "SQL", "NoSQL", "Matlab", "Linux", "Excel", "Azure", "AWS",
    "H2O", "Java", "C", "C++", "C#", "Scala", "Tableau", "MongoDB", "Postgres", "PyTorch",
    "TensorFlow", "SAS", "Octave", "Julia", "Shell Script", "JavaScript", "Haskell", "Hive",
    "PowerBI", "Cloudera", "D3", "SPSS", "Perl",
];

/// Anything that can hand over one token set per posting.
pub trait TokenSource {
    fn token_sets(
        &self,
        normalizer: &TextNormalizer,
        keep: &KeepPattern,
    ) -> Result<Vec<BTreeSet<String>>, CountError>;
}

impl TokenSource for Listing {
    fn token_sets(
        &self,
        normalizer: &TextNormalizer,
        keep: &KeepPattern,
    ) -> Result<Vec<BTreeSet<String>>, CountError> {
        Ok(vec![normalizer.listing_tokens(self, keep)?])
    }
}

impl TokenSource for Search {
    fn token_sets(
        &self,
        normalizer: &TextNormalizer,
        keep: &KeepPattern,
    ) -> Result<Vec<BTreeSet<String>>, CountError> {
        self.iter()
            .map(|listing| normalizer.listing_tokens(listing, keep))
            .collect()
    }
}

/// A hand-picked group of listings, e.g. only those whose description was fetched.
impl TokenSource for [&Listing] {
    fn token_sets(
        &self,
        normalizer: &TextNormalizer,
        keep: &KeepPattern,
    ) -> Result<Vec<BTreeSet<String>>, CountError> {
        self.iter()
            .map(|listing| normalizer.listing_tokens(listing, keep))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScore {
    pub keyword: String,
    /// Number of postings mentioning the keyword, or their percentage.
    pub score: f64,
}

/// Keyword scores ranked from most to least mentioned.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    rows: Vec<KeywordScore>,
    as_percentage: bool,
}

impl KeywordTable {
    pub fn rows(&self) -> &[KeywordScore] {
        &self.rows
    }

    pub fn top(&self, n: usize) -> &[KeywordScore] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn score(&self, keyword: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.keyword == keyword)
            .map(|row| row.score)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_percentage(&self) -> bool {
        self.as_percentage
    }
}

impl fmt::Display for KeywordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|row| row.keyword.chars().count())
            .max()
            .unwrap_or(0)
            .max("Keyword".len());
        write!(f, "{:<width$} | Frequency", "Keyword")?;
        for row in &self.rows {
            if self.as_percentage {
                write!(f, "\n{:<width$} | {:.2}%", row.keyword, row.score)?;
            } else {
                write!(f, "\n{:<width$} | {}", row.keyword, row.score)?;
            }
        }
        Ok(())
    }
}

/// Counts, for a fixed keyword vocabulary, how many postings mention each keyword.
#[derive(Debug, Clone)]
pub struct KeywordCounter {
    keywords: Vec<String>,
    normalizer: TextNormalizer,
}

impl KeywordCounter {
    /// Repeated keywords are counted once, at their first position.
    pub fn new<S: AsRef<str>>(keywords: &[S], stopwords: HashSet<String>) -> Self {
        let mut seen = HashSet::new();
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().to_string())
            .filter(|k| seen.insert(k.clone()))
            .collect();
        let normalizer = TextNormalizer::new(keywords.as_slice(), stopwords);
        Self { keywords, normalizer }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Scores every keyword over the target's postings. With `as_percentage` the
    /// count becomes a percentage of the number of postings.
    ///
    /// Every keyword gets a row, zero scores included. Ties keep keyword order.
    pub fn count<T: TokenSource + ?Sized>(
        &self,
        target: &T,
        as_percentage: bool,
        keep: &KeepPattern,
    ) -> Result<KeywordTable, CountError> {
        let token_sets = target.token_sets(&self.normalizer, keep)?;
        let postings = token_sets.len();
        debug!("Counting {} keywords over {} postings", self.keywords.len(), postings);

        let mut rows: Vec<KeywordScore> = self
            .keywords
            .iter()
            .map(|keyword| {
                let needle = keyword.to_lowercase();
                let hits = token_sets.iter().filter(|tokens| tokens.contains(&needle)).count();
                let score = match (as_percentage, postings) {
                    (false, _) => hits as f64,
                    (true, 0) => 0.0,
                    (true, n) => hits as f64 * 100.0 / n as f64,
                };
                KeywordScore {
                    keyword: keyword.clone(),
                    score,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(KeywordTable { rows, as_percentage })
    }

    /// Presence (0 or 1) of every keyword in one listing.
    pub fn count_one(&self, listing: &Listing, keep: &KeepPattern) -> Result<KeywordTable, CountError> {
        self.count(listing, false, keep)
    }

    pub fn count_many(
        &self,
        search: &Search,
        as_percentage: bool,
        keep: &KeepPattern,
    ) -> Result<KeywordTable, CountError> {
        self.count(search, as_percentage, keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Description, ListingRecord};
    use crate::location::Location;
    use crate::search::{LocationRecord, SearchRecord};
    use crate::stopwords;
    use indexmap::IndexMap;
    use proptest::prelude::*;

    fn listing(id: &str, text: &str) -> Listing {
        let mut listing = Listing::new(id, "u", Location::new("New York", "NY"), "Acme", "Data Scientist");
        listing.description = Description::Present(text.into());
        listing
    }

    fn search(descriptions: &[&str]) -> Search {
        let results: IndexMap<String, ListingRecord> = descriptions
            .iter()
            .enumerate()
            .map(|(i, text)| (i.to_string(), listing(&i.to_string(), text).to_record()))
            .collect();
        Search::from_record(SearchRecord {
            location: LocationRecord {
                main: "New York, NY".into(),
                alternates: vec![],
            },
            query: "Data Scientist".into(),
            extra_titles: None,
            base_url: String::new(),
            job_ids: results.keys().cloned().collect(),
            results,
        })
        .unwrap()
    }

    fn counter(keywords: &[&str]) -> KeywordCounter {
        KeywordCounter::new(keywords, stopwords::english())
    }

    #[test]
    fn d3_inside_d3js_is_not_counted() {
        let keep = KeepPattern::letters_and(".0123456789").unwrap();
        let posting = listing("1", "We use Python and SQL daily. Also D3.js for charts.");
        let table = counter(&["Python", "SQL", "D3"]).count_one(&posting, &keep).unwrap();
        assert_eq!(table.score("Python"), Some(1.0));
        assert_eq!(table.score("SQL"), Some(1.0));
        assert_eq!(table.score("D3"), Some(0.0));
        assert_eq!(table.rows()[2].keyword, "D3");
    }

    #[test]
    fn standalone_d3_is_counted() {
        let keep = KeepPattern::letters_and(".0123456789").unwrap();
        let posting = listing("1", "Charts with D3 and D3.js.");
        let table = counter(&["Python", "D3"]).count_one(&posting, &keep).unwrap();
        assert_eq!(table.score("D3"), Some(1.0));
        assert_eq!(table.rows()[0].keyword, "D3");
    }

    #[test]
    fn presence_not_frequency_within_a_listing() {
        let table = counter(&["Python"])
            .count_one(&listing("1", "Python python PYTHON"), &KeepPattern::default())
            .unwrap();
        assert_eq!(table.score("Python"), Some(1.0));
    }

    #[test]
    fn search_counts_postings_and_percentages() {
        let results = search(&["Python and SQL", "Python only", "Java shop", "Spark"]);
        let c = counter(&["SQL", "Java", "Python", "Scala"]);

        let counts = c.count_many(&results, false, &KeepPattern::default()).unwrap();
        let order: Vec<_> = counts.rows().iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(order, ["Python", "SQL", "Java", "Scala"]);
        assert_eq!(counts.score("Python"), Some(2.0));
        assert_eq!(counts.score("Scala"), Some(0.0));

        let percent = c.count(&results, true, &KeepPattern::default()).unwrap();
        assert_eq!(percent.score("Python"), Some(50.0));
        assert_eq!(percent.score("SQL"), Some(25.0));
        assert!(percent.is_percentage());
    }

    #[test]
    fn empty_search_scores_zero() {
        let table = counter(&["R", "C"]).count(&search(&[]), true, &KeepPattern::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows().iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn unfetched_description_fails_the_count() {
        let posting = Listing::new("9", "u", Location::new("Boston", "MA"), "c", "t");
        assert_eq!(
            counter(&["R"]).count_one(&posting, &KeepPattern::default()),
            Err(CountError::DescriptionNotFetched { job_id: "9".into() })
        );
    }

    #[test]
    fn slices_of_listings_can_be_counted() {
        let fetched = listing("1", "Spark and Hive");
        let unfetched = Listing::new("2", "u", Location::new("Boston", "MA"), "c", "t");
        let picked: Vec<&Listing> = [&fetched, &unfetched]
            .into_iter()
            .filter(|l| l.description.is_fetched())
            .collect();
        let table = counter(&["Hive"]).count(picked.as_slice(), true, &KeepPattern::default()).unwrap();
        assert_eq!(table.score("Hive"), Some(100.0));
    }

    #[test]
    fn multi_word_keywords_never_match_single_tokens() {
        let table = counter(&["Shell Script"])
            .count_one(&listing("1", "Shell Script experience"), &KeepPattern::default())
            .unwrap();
        assert_eq!(table.score("Shell Script"), Some(0.0));
    }

    #[test]
    fn repeated_keywords_get_one_row() {
        assert_eq!(counter(&["R", "SQL", "R"]).keywords(), ["R", "SQL"]);
    }

    #[test]
    fn display_renders_two_columns() {
        let table = counter(&["Python", "R"])
            .count_one(&listing("1", "Python"), &KeepPattern::default())
            .unwrap();
        assert_eq!(table.to_string(), "Keyword | Frequency\nPython  | 1\nR       | 0");
        assert_eq!(table.top(1).len(), 1);
        assert_eq!(table.top(10).len(), 2);
    }

    proptest! {
        #[test]
        fn one_sorted_row_per_keyword(
            descriptions in proptest::collection::vec("(python|sql|java|rust|and|the| ){0,12}", 0..6),
            as_percentage in any::<bool>(),
        ) {
            let keywords = ["Python", "SQL", "Java", "Go"];
            let texts: Vec<&str> = descriptions.iter().map(String::as_str).collect();
            let table = counter(&keywords)
                .count(&search(&texts), as_percentage, &KeepPattern::default())
                .unwrap();

            prop_assert_eq!(table.len(), keywords.len());
            for keyword in keywords {
                prop_assert_eq!(table.rows().iter().filter(|r| r.keyword == keyword).count(), 1);
            }
            prop_assert!(table.rows().windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}

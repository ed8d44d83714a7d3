// Search/listing locations with alternate-name matching
use crate::model::{NA, ParseError};
use std::fmt;

/// A "City, ST" location, normalized on construction.
///
/// Alternates are other names a search accepts for the same area
/// ("Brooklyn, NY" for "New York, NY"). They never carry alternates of their own.
#[derive(Debug, Clone)]
pub struct Location {
    city: String,
    state: String,
    alternates: Vec<Location>,
}

impl Location {
    pub fn new(city: &str, state: &str) -> Self {
        let (city, state) = Self::normalize(city, state);
        Self {
            city,
            state,
            alternates: Vec::new(),
        }
    }

    /// Sentinel for listings without a readable location.
    pub fn unknown() -> Self {
        Self::new(NA, NA)
    }

    /// Uppercases the state and title-cases every space-separated word of the city.
    pub fn normalize(city: &str, state: &str) -> (String, String) {
        let city = city
            .split(' ')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");
        (city, state.to_uppercase())
    }

    /// Parses "City, ST". Exactly one comma is accepted.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut parts = text.split(',');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(city), Some(state), None) => Ok(Self::new(city.trim(), state.trim())),
            _ => Err(ParseError::MalformedLocation(text.to_string())),
        }
    }

    /// Parses the main location and each alternate.
    pub fn parse_with_alternates<S: AsRef<str>>(text: &str, alternates: &[S]) -> Result<Self, ParseError> {
        let alternates = alternates
            .iter()
            .map(|alt| Self::parse(alt.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::parse(text)?.with_alternates(alternates))
    }

    /// Replaces the alternates. Nested alternates are dropped.
    pub fn with_alternates(mut self, alternates: Vec<Location>) -> Self {
        self.alternates = alternates
            .into_iter()
            .map(|alt| Self {
                alternates: Vec::new(),
                ..alt
            })
            .collect();
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn alternates(&self) -> &[Location] {
        &self.alternates
    }

    /// "Is compatible with": same city and state, or either side lists the other
    /// among its alternates.
    ///
    /// Reflexive and symmetric but not transitive: A may match B and B match C
    /// while A does not match C.
    pub fn matches(&self, other: &Location) -> bool {
        self.same_place(other)
            || self.alternates.iter().any(|alt| alt.same_place(other))
            || other.alternates.iter().any(|alt| alt.same_place(self))
    }

    /// Exact city/state comparison, ignoring alternates.
    pub fn same_place(&self, other: &Location) -> bool {
        self.city == other.city && self.state == other.state
    }

    /// Slug used in the job board's `where=` query parameter, e.g. `New-York__2C-NY`.
    pub fn search_token(&self) -> String {
        format!("{}__2C-{}", self.city.replace(' ', "-"), self.state)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state)
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

use crate::analyzer::DATA_SCI_KEYWORDS;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    pub query: String,
    /// "City, ST"
    pub location: String,
    #[serde(default)]
    pub alternates: Vec<String>,
    #[serde(default)]
    pub extra_titles: Option<Vec<String>>,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Characters kept besides letters when tokenizing, e.g. ".+3".
    #[serde(default)]
    pub keep_chars: String,
    #[serde(default = "default_true")]
    pub as_percentage: bool,
    #[serde(default = "default_top")]
    pub top: usize,
    /// File name inside `data_dir`.
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub searches: Vec<SearchConfig>,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_page_limit() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_top() -> usize {
    10
}

fn default_keywords() -> Vec<String> {
    DATA_SCI_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_data_dir() -> String {
    "data".into()
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_json::Error> {
    serde_json::from_str(content)
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok(config)
}

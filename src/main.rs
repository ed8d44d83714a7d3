use job_scout::analyzer::KeywordCounter;
use job_scout::config::{AppConfig, SearchConfig, load_config};
use job_scout::listing::Listing;
use job_scout::location::Location;
use job_scout::normalizer::KeepPattern;
use job_scout::scraper::ScraperImpl;
use job_scout::search::Search;
use job_scout::stopwords;
use job_scout::storage::JsonStorage;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".into());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let fetcher = match ScraperImpl::new(Duration::from_secs(config.timeout_seconds)) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let storage = match JsonStorage::new(&config.data_dir) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open data dir {}: {}", config.data_dir, e);
            return;
        }
    };

    let counter = KeywordCounter::new(config.keywords.as_slice(), stopwords::english());

    info!("Searches to process: {}", config.searches.len());
    for search_cfg in &config.searches {
        process_search(search_cfg, &config, &fetcher, &storage, &counter);
    }
    info!("🏁 Done.");
}

/// Resumes or starts one search, fetches what is missing, saves it and logs the keyword table.
fn process_search(
    search_cfg: &SearchConfig,
    config: &AppConfig,
    fetcher: &ScraperImpl,
    storage: &JsonStorage,
    counter: &KeywordCounter,
) {
    info!("Processing search: {} in {}", search_cfg.query, search_cfg.location);

    let search = match storage.load_search(&search_cfg.output) {
        Ok(Some(saved)) => saved,
        Ok(None) => match Location::parse_with_alternates(&search_cfg.location, search_cfg.alternates.as_slice()) {
            Ok(location) => Search::new(location, &search_cfg.query, search_cfg.extra_titles.clone()),
            Err(e) => {
                warn!("Skipping search '{}': {}", search_cfg.query, e);
                return;
            }
        },
        Err(e) => {
            warn!("Could not load {}: {}", search_cfg.output, e);
            return;
        }
    };
    let mut search = search.with_request_delay(Duration::from_millis(config.request_delay_ms));

    if let Err(e) = search.fetch_listings(fetcher, search_cfg.page_limit, false) {
        warn!("Continuing with {} listings after fetch error: {}", search.len(), e);
    }

    info!("Fetching descriptions...");
    let report = search.fetch_descriptions(fetcher, false);
    info!(
        "Descriptions: {} fetched, {} already present, {} dead, {} failed",
        report.fetched,
        report.already_present,
        report.dead,
        report.failed.len()
    );
    for (job_id, e) in &report.failed {
        warn!("Description for {} not fetched: {}", job_id, e);
    }

    if let Err(e) = storage.save_search(&search_cfg.output, &search) {
        warn!("Save failed: {}", e);
    }

    let keep = match KeepPattern::letters_and(&search_cfg.keep_chars) {
        Ok(keep) => keep,
        Err(e) => {
            warn!("Invalid keep_chars {:?}: {}", search_cfg.keep_chars, e);
            return;
        }
    };

    // Unfetched listings cannot be tokenized; count the rest.
    let fetched: Vec<&Listing> = search
        .iter()
        .filter(|listing| listing.description.is_fetched())
        .collect();
    if fetched.len() < search.len() {
        warn!("Counting {} of {} listings", fetched.len(), search.len());
    }

    match counter.count(fetched.as_slice(), search_cfg.as_percentage, &keep) {
        Ok(table) => {
            info!("Top {} keywords for '{}':", search_cfg.top, search.query);
            for row in table.top(search_cfg.top) {
                if table.is_percentage() {
                    info!("  {:<14} {:>6.1}%", row.keyword, row.score);
                } else {
                    info!("  {:<14} {:>6}", row.keyword, row.score);
                }
            }
        }
        Err(e) => warn!("Keyword count failed: {}", e),
    }

    info!("Finished processing search: {}", search_cfg.query);
}

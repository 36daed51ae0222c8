//! Web research: turns a goal into a handful of (title, link) pairs.
//!
//! The only implementation scrapes a public search results page, so it breaks
//! whenever the provider changes its markup or blocks the client. That is the
//! known contract; callers treat an empty list as "nothing useful found".

use std::fmt::Write as _;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::constants::{MAX_SEARCH_RESULTS, RESEARCH_KEYWORDS, SEARCH_USER_AGENT};
use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
}

/// Search backend seam. Implementations return at most [`MAX_SEARCH_RESULTS`] results.
#[async_trait]
pub trait ResourceFinder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// True when the goal mentions one of the research trigger words.
/// Plain substring match: "relearn" and "findings" count too.
pub fn wants_research(goal: &str) -> bool {
    let lowered = goal.to_lowercase();
    RESEARCH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Markdown block appended to a plan when resources were found.
pub fn format_resources(results: &[SearchResult]) -> String {
    let mut block = String::from("\n\n🌐 **Additional Resources I Found:**\n");
    for result in results {
        let _ = writeln!(block, "• [{}]({})", result.title, result.link);
    }
    block
}

/// Scrapes the HTML results page of a generic web search endpoint.
pub struct WebSearchScraper {
    http: Client,
    search_url: String,
}

impl WebSearchScraper {
    pub fn new(http: Client, search_url: impl Into<String>) -> Self {
        Self {
            http,
            search_url: search_url.into(),
        }
    }

    /// `{search_url}?q={percent-encoded query}`
    pub fn query_url(&self, query: &str) -> Result<Url, SearchError> {
        let raw = format!("{}?q={}", self.search_url, urlencoding::encode(query));
        Url::parse(&raw).map_err(|_| SearchError::InvalidEndpoint(self.search_url.clone()))
    }
}

#[async_trait]
impl ResourceFinder for WebSearchScraper {
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.query_url(query)?;
        let response = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, SEARCH_USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Block and consent pages still get parsed; they just yield nothing.
            warn!(%status, "Search endpoint answered with a non-success status");
        }
        let body = response.text().await?;
        let results = parse_results(&body);
        debug!(found = results.len(), "Parsed search results");
        Ok(results)
    }
}

/// Pulls up to three results out of `div.g` containers.
///
/// Only the first three containers are inspected; a container without both an
/// `a[href]` and an `h3` is skipped rather than replaced by a later one.
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let (Ok(container), Ok(anchor), Ok(heading)) = (
        Selector::parse("div.g"),
        Selector::parse("a"),
        Selector::parse("h3"),
    ) else {
        return Vec::new();
    };

    document
        .select(&container)
        .take(MAX_SEARCH_RESULTS)
        .filter_map(|block| {
            let link = block.select(&anchor).next()?.value().attr("href")?;
            let title = block.select(&heading).next()?;
            Some(SearchResult {
                title: title.text().collect::<String>(),
                link: link.to_string(),
            })
        })
        .collect()
}

//! Web search provider and rendered page fetching.
//!
//! The [`SearchProvider`] trait decouples orchestration from the actual
//! search backend (currently Google Custom Search, see [`GoogleSearch`]).
//! Tests use scripted providers.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::types::{PageContent, SearchResult};
use crate::io::config::SearchConfig;
use crate::io::page::visible_text;

/// Sentinel returned when a page cannot be fetched or rendered.
pub const FETCH_FAILED: &str = "Could not fetch content";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search response invalid: {0}")]
    Response(String),
}

/// Abstraction over web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Ranked results for one free-text query.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;

    /// Visible text of the page at `url`, or [`FETCH_FAILED`].
    async fn fetch_rendered_content(&self, url: &str) -> String;
}

static QUOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'“”‘’]"#).expect("quotes regex should be valid"));

/// Remove quote characters that make generated queries overly literal.
pub fn strip_quotes(query: &str) -> String {
    QUOTES_RE.replace_all(query, "").into_owned()
}

/// Run every query in order and concatenate the results.
///
/// A query with no results is retried once without quotes. Failures are
/// logged and count as zero results.
#[instrument(skip_all, fields(queries = queries.len()))]
pub async fn fetch_many<S: SearchProvider + ?Sized>(
    search: &S,
    queries: &[String],
) -> Vec<SearchResult> {
    let mut results = Vec::new();
    for query in queries {
        results.extend(search_with_fallback(search, query).await);
    }
    debug!(results = results.len(), "search batch collected");
    results
}

async fn search_with_fallback<S: SearchProvider + ?Sized>(
    search: &S,
    query: &str,
) -> Vec<SearchResult> {
    let first = search_or_empty(search, query).await;
    if !first.is_empty() {
        return first;
    }
    let unquoted = strip_quotes(query);
    if unquoted == query {
        debug!(query, "query returned no results");
        return first;
    }
    debug!(query, "query returned no results, retrying without quotes");
    search_or_empty(search, &unquoted).await
}

async fn search_or_empty<S: SearchProvider + ?Sized>(search: &S, query: &str) -> Vec<SearchResult> {
    match search.search(query).await {
        Ok(results) => results,
        Err(err) => {
            warn!(query, error = %err, "search failed");
            Vec::new()
        }
    }
}

/// Fetch every result's page concurrently, keeping the input order.
pub async fn fetch_pages<S: SearchProvider + ?Sized>(
    search: &S,
    results: &[SearchResult],
) -> Vec<PageContent> {
    let contents = join_all(
        results
            .iter()
            .map(|result| search.fetch_rendered_content(&result.link)),
    )
    .await;
    results
        .iter()
        .zip(contents)
        .map(|(result, content)| PageContent {
            title: result.title.clone(),
            link: result.link.clone(),
            snippet: result.snippet.clone(),
            content,
        })
        .collect()
}

/// Google Custom Search JSON API client.
#[derive(Debug, Clone)]
pub struct GoogleSearch {
    api_key: String,
    engine_id: String,
    base_url: String,
    results_per_query: u32,
    max_page_bytes: usize,
    page_char_limit: usize,
    client: Client,
}

impl GoogleSearch {
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build search http client")?;
        Ok(Self {
            api_key: config.resolve_api_key()?,
            engine_id: config.resolve_engine_id()?,
            base_url: config.base_url.clone(),
            results_per_query: config.results_per_query,
            max_page_bytes: config.max_page_bytes,
            page_char_limit: config.page_char_limit,
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let num = self.results_per_query.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|err| SearchError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Response(format!("status {status}")));
        }
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|err| SearchError::Response(err.to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| SearchResult {
                title: item.title,
                link: item.link,
                snippet: item.snippet,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_rendered_content(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "page fetch returned error status");
                return FETCH_FAILED.to_string();
            }
            Err(err) => {
                warn!(error = %err, "page fetch failed");
                return FETCH_FAILED.to_string();
            }
        };
        match read_capped(response, self.max_page_bytes).await {
            Ok(html) => {
                let text = visible_text(&html, self.page_char_limit);
                if text.is_empty() {
                    FETCH_FAILED.to_string()
                } else {
                    text
                }
            }
            Err(err) => {
                warn!(error = %err, "page body unreadable");
                FETCH_FAILED.to_string()
            }
        }
    }
}

/// Read at most `max_bytes` of the body; the rest is never downloaded.
async fn read_capped(mut response: Response, max_bytes: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!(max_bytes, "page body truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

//! Search via a self-hosted SearXNG instance's JSON API.
//!
//! Failures are reported in-band: `search` always returns a `SearchResponse`,
//! and anything that went wrong lands in its `error` field with the query and
//! paging arguments echoed back. Callers never see a transport-level error.

use std::time::Duration;

use serde::Deserialize;
use webexplorer_core::{Error, Result, SearchResponse, SearchResult};

use crate::USER_AGENT;

#[derive(Debug, Clone)]
pub struct SearxngClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Subset of SearXNG's `format=json` response we care about.
#[derive(Debug, Deserialize)]
struct SearxngSearchResponse {
    #[serde(default)]
    results: Vec<SearxngRow>,
}

#[derive(Debug, Deserialize)]
struct SearxngRow {
    #[serde(default)]
    title: Option<String>,
    /// SearXNG calls the snippet `content`.
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl SearxngRow {
    fn into_result(self) -> SearchResult {
        SearchResult {
            title: self.title.unwrap_or_default(),
            description: self.content.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
        }
    }
}

impl SearxngClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::NotConfigured("SearXNG base URL is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base.to_string(),
            timeout,
        })
    }

    /// Run one search. `page` is forwarded to SearXNG as `pageno`;
    /// `page_size` is applied client-side because SearXNG has no per-request
    /// result limit.
    pub async fn search(&self, query: &str, page: i64, page_size: i64) -> SearchResponse {
        if query.trim().is_empty() {
            return SearchResponse::failed(
                query,
                page,
                page_size,
                "Search query must be a non-empty string",
            );
        }
        if page < 1 {
            return SearchResponse::failed(
                query,
                page,
                page_size,
                "Page number must be greater than 0",
            );
        }
        if page_size < 1 {
            return SearchResponse::failed(
                query,
                page,
                page_size,
                "Page size must be greater than 0",
            );
        }

        let rows = match self.fetch_rows(query.trim(), page).await {
            Ok(rows) => rows,
            Err(msg) => return SearchResponse::failed(query, page, page_size, msg),
        };

        let total_results = rows.len();
        let results: Vec<SearchResult> = rows
            .into_iter()
            .take(page_size.max(0) as usize)
            .map(SearxngRow::into_result)
            .collect();

        tracing::debug!(
            query = query.trim(),
            page,
            total_results,
            returned = results.len(),
            "searxng search completed"
        );

        SearchResponse {
            query: query.to_string(),
            page,
            page_size,
            total_results,
            results,
            error: None,
        }
    }

    async fn fetch_rows(
        &self,
        query: &str,
        page: i64,
    ) -> std::result::Result<Vec<SearxngRow>, String> {
        let url = format!("{}/search", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("pageno", &page.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("Request timeout after {} seconds", self.timeout.as_secs())
                } else if e.is_connect() {
                    format!("Cannot connect to SearxNG: {e}")
                } else {
                    format!("Search error: {e}")
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP error from SearxNG: {}", status.as_u16()));
        }

        let parsed: SearxngSearchResponse = resp
            .json()
            .await
            .map_err(|e| format!("Search error: {e}"))?;
        Ok(parsed.results)
    }
}

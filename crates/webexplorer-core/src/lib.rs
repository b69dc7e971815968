use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod paginate;

pub use paginate::{paginate, PageSlice};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("HTTP error: {0}")]
    HttpStatus(u16),
    #[error("Parsing error: {0}")]
    Parse(String),
    #[error("Playwright extraction error: {0}")]
    Extraction(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One row of a search response, mapped from the aggregator's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Tool-level search response. Failures are carried in `error`, never raised:
/// the transport call always succeeds and clients branch on this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub page: i64,
    pub page_size: i64,
    pub total_results: usize,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
}

impl SearchResponse {
    /// Empty failure payload that echoes the caller's arguments unchanged.
    pub fn failed(query: &str, page: i64, page_size: i64, error: impl ToString) -> Self {
        Self {
            query: query.to_string(),
            page,
            page_size,
            total_results: 0,
            results: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1..=6, mirroring h1..h6.
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
}

/// Everything extracted from one webpage.
///
/// `article_body` holds text found inside the primary container (article/main);
/// `main_text` is the paginated slice of the secondary pool (blocks outside the
/// primary container). The two never duplicate content. `main_content` is the
/// untruncated concatenation of both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebpageContent {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub main_content: String,
    pub article_body: String,
    pub main_text: String,
    pub headings: Vec<Heading>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub metadata: BTreeMap<String, String>,
    pub content_type: String,
    pub pagination: Pagination,
    pub length: usize,
    pub error: Option<String>,
}

impl WebpageContent {
    /// Failure payload: url and error set, every extracted field at its
    /// empty/zero default.
    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            description: None,
            author: None,
            published_date: None,
            main_content: String::new(),
            article_body: String::new(),
            main_text: String::new(),
            headings: Vec::new(),
            links: Vec::new(),
            images: Vec::new(),
            metadata: BTreeMap::new(),
            content_type: "webpage".to_string(),
            pagination: Pagination::default(),
            length: 0,
            error: Some(error.to_string()),
        }
    }
}

/// A fetched page, before any parsing.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub html: String,
}

/// Capability seam between the orchestration layer and the two fetch
/// strategies (plain HTTP vs browser-rendered). Selected by configuration at
/// construction time, never by downcasting.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage>;
}

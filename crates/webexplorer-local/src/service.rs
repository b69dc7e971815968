//! Orchestration: fetch → sanitize/select → classify → paginate.
//!
//! Tool-facing entry points live here. Like search, extraction reports
//! failures in-band: `extract_content` always returns a `WebpageContent`
//! and puts whatever went wrong in its `error` field.

use std::sync::Arc;
use std::time::Duration;

use webexplorer_core::{
    paginate, PageFetcher, Pagination, Result, SearchResponse, WebpageContent,
};

use crate::classify::{ContentClassifier, HeuristicClassifier};
use crate::select::{document_text, extract_page};
use crate::settings::{AppSettings, FetchBackend};
use crate::{HttpFetcher, PlaywrightFetcher, SearxngClient};

#[derive(Clone)]
pub struct ContentService {
    fetcher: Arc<dyn PageFetcher>,
    classifier: Arc<dyn ContentClassifier>,
}

fn failed_at_page(url: &str, page: usize, error: impl ToString) -> WebpageContent {
    let mut c = WebpageContent::failed(url, error);
    c.pagination.page = page;
    c
}

impl ContentService {
    pub fn new(fetcher: Arc<dyn PageFetcher>, classifier: Arc<dyn ContentClassifier>) -> Self {
        Self { fetcher, classifier }
    }

    /// Extract one page. `page`/`max_chars` drive pagination of the secondary
    /// text pool; `raw_content` skips the article/secondary split and returns
    /// the sanitized whole-document text instead.
    pub async fn extract_content(
        &self,
        url: &str,
        max_chars: usize,
        page: usize,
        timeout: Duration,
        raw_content: bool,
    ) -> WebpageContent {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return failed_at_page(url, page, "A valid url (non-empty string) is required");
        }
        if max_chars == 0 {
            return failed_at_page(url, page, "max_chars must be positive");
        }
        if page == 0 {
            return failed_at_page(url, page, "page must be 1 or greater");
        }

        let fetched = match self.fetcher.fetch(trimmed, timeout).await {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(url = trimmed, backend = self.fetcher.name(), error = %e, "fetch failed");
                return failed_at_page(url, page, e);
            }
        };

        let extract = match extract_page(&fetched.html, &fetched.final_url) {
            Ok(x) => x,
            Err(e) => return failed_at_page(url, page, e),
        };

        let (article_body, secondary) = if raw_content {
            (String::new(), document_text(&fetched.html))
        } else {
            (extract.article_body.clone(), extract.secondary_text.clone())
        };

        // Arguments were validated above, so pagination cannot fail here.
        let slice = match paginate(&secondary, max_chars, page) {
            Ok(s) => s,
            Err(e) => return failed_at_page(url, page, e),
        };

        let content_type = self.classifier.classify(&fetched.final_url, &extract);

        let main_content = match (article_body.is_empty(), secondary.is_empty()) {
            (false, false) => format!("{article_body}\n\n{secondary}"),
            (false, true) => article_body.clone(),
            (true, _) => secondary.clone(),
        };

        let length = slice.text.chars().count();
        tracing::debug!(
            url = trimmed,
            content_type,
            page,
            total_pages = slice.total_pages,
            length,
            "extraction completed"
        );

        WebpageContent {
            url: url.to_string(),
            title: extract.title,
            description: extract.description,
            author: extract.author,
            published_date: extract.published_date,
            main_content,
            article_body,
            main_text: slice.text,
            headings: extract.headings,
            links: extract.links,
            images: extract.images,
            metadata: extract.metadata,
            content_type: content_type.to_string(),
            pagination: Pagination {
                page,
                total_pages: slice.total_pages,
                has_next_page: slice.has_next,
            },
            length,
            error: None,
        }
    }
}

/// Bundles the search client and content service behind configured defaults.
/// One instance serves all tool calls; it holds no per-request state.
#[derive(Clone)]
pub struct WebExplorerService {
    search: SearxngClient,
    content: ContentService,
    settings: AppSettings,
}

impl WebExplorerService {
    pub fn from_env() -> Result<Self> {
        Self::from_settings(AppSettings::from_env()?)
    }

    pub fn from_settings(settings: AppSettings) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = match settings.webpage.fetch_backend {
            FetchBackend::Http => Arc::new(HttpFetcher::new()?),
            FetchBackend::Browser => Arc::new(PlaywrightFetcher::new()),
        };
        let search = SearxngClient::new(&settings.search.searxng_url, settings.search.timeout())?;
        let content = ContentService::new(fetcher, Arc::new(HeuristicClassifier));
        Ok(Self {
            search,
            content,
            settings,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub async fn search_web(
        &self,
        query: &str,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> SearchResponse {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(self.settings.search.page_size);
        self.search.search(query, page, page_size).await
    }

    pub async fn extract_webpage_content(
        &self,
        url: &str,
        max_chars: Option<usize>,
        page: Option<usize>,
        timeout_s: Option<u64>,
        raw_content: bool,
    ) -> WebpageContent {
        let w = &self.settings.webpage;
        let default_timeout = match w.fetch_backend {
            FetchBackend::Http => w.timeout_s,
            FetchBackend::Browser => w.browser_timeout_s,
        };
        let timeout = Duration::from_secs(timeout_s.unwrap_or(default_timeout));
        self.content
            .extract_content(
                url,
                max_chars.unwrap_or(w.max_chars),
                page.unwrap_or(1),
                timeout,
                raw_content,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::Html, routing::get, Router};
    use std::net::SocketAddr;

    fn service() -> ContentService {
        ContentService::new(
            Arc::new(HttpFetcher::new().unwrap()),
            Arc::new(HeuristicClassifier),
        )
    }

    async fn spawn_fixture(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    const PAGE: &str = r#"<html>
<head><title>Fixture</title><meta name="description" content="desc"></head>
<body>
  <nav><p>Navigation links that are long enough to pass the filter.</p></nav>
  <article><h1>Article Title</h1><p>Body paragraph inside the article element.</p></article>
  <p>An outside paragraph easily longer than the thirty character floor.</p>
</body>
</html>"#;

    #[tokio::test]
    async fn empty_url_is_an_in_band_error() {
        let r = service()
            .extract_content("   ", 5000, 1, Duration::from_secs(1), false)
            .await;
        assert_eq!(
            r.error.as_deref(),
            Some("A valid url (non-empty string) is required")
        );
        assert!(r.main_content.is_empty());
    }

    #[tokio::test]
    async fn zero_page_is_an_in_band_error_with_page_echoed() {
        let r = service()
            .extract_content("https://example.com", 5000, 0, Duration::from_secs(1), false)
            .await;
        assert_eq!(r.error.as_deref(), Some("page must be 1 or greater"));
        assert_eq!(r.pagination.page, 0);
    }

    #[tokio::test]
    async fn zero_max_chars_is_an_in_band_error() {
        let r = service()
            .extract_content("https://example.com", 0, 1, Duration::from_secs(1), false)
            .await;
        assert_eq!(r.error.as_deref(), Some("max_chars must be positive"));
    }

    #[tokio::test]
    async fn happy_path_extracts_and_classifies() {
        let app = Router::new().route("/", get(|| async { Html(PAGE) }));
        let addr = spawn_fixture(app).await;

        let r = service()
            .extract_content(
                &format!("http://{addr}/"),
                5000,
                1,
                Duration::from_secs(2),
                false,
            )
            .await;
        assert!(r.error.is_none());
        assert_eq!(r.title.as_deref(), Some("Fixture"));
        assert_eq!(r.description.as_deref(), Some("desc"));
        assert!(r.article_body.contains("Article Title"));
        assert!(r.main_text.contains("outside paragraph"));
        assert!(!r.main_text.contains("Navigation"));
        assert!(r.main_content.contains("Article Title"));
        assert!(r.main_content.contains("outside paragraph"));
        assert_eq!(r.content_type, "article");
        assert_eq!(r.pagination.page, 1);
        assert_eq!(r.pagination.total_pages, 1);
        assert!(!r.pagination.has_next_page);
        assert_eq!(r.length, r.main_text.chars().count());
    }

    #[tokio::test]
    async fn fetch_failures_land_in_the_error_field() {
        let app = Router::new().route("/", get(|| async { (StatusCode::NOT_FOUND, "gone") }));
        let addr = spawn_fixture(app).await;

        let r = service()
            .extract_content(
                &format!("http://{addr}/"),
                5000,
                1,
                Duration::from_secs(2),
                false,
            )
            .await;
        assert_eq!(r.error.as_deref(), Some("HTTP error: 404"));
        assert!(r.main_content.is_empty());
        assert!(r.headings.is_empty());
    }

    #[tokio::test]
    async fn pagination_truncates_the_secondary_pool_only() {
        let long = "words and more words in a sentence. ".repeat(30);
        let page_html = format!(
            "<html><body><article><p>Article text stays whole.</p></article><p>{long}</p></body></html>"
        );
        let app = Router::new().route("/", get(move || async move { Html(page_html.clone()) }));
        let addr = spawn_fixture(app).await;

        let svc = service();
        let url = format!("http://{addr}/");
        let first = svc
            .extract_content(&url, 100, 1, Duration::from_secs(2), false)
            .await;
        assert!(first.error.is_none());
        assert!(first.pagination.total_pages > 1);
        assert!(first.pagination.has_next_page);
        assert!(first.main_text.ends_with("..."));
        assert_eq!(first.main_text.chars().count(), 103);
        // Article body is never paginated.
        assert!(first.article_body.contains("Article text stays whole."));

        let past = svc
            .extract_content(
                &url,
                100,
                first.pagination.total_pages + 1,
                Duration::from_secs(2),
                false,
            )
            .await;
        assert!(past.error.is_none());
        assert_eq!(past.main_text, "");
        assert!(!past.pagination.has_next_page);
    }

    #[tokio::test]
    async fn raw_content_skips_the_split_but_stays_sanitized() {
        let app = Router::new().route(
            "/",
            get(|| async {
                Html(
                    "<html><body><p>tiny</p><script>var x;</script>\
                     <article><p>article words</p></article></body></html>",
                )
            }),
        );
        let addr = spawn_fixture(app).await;

        let r = service()
            .extract_content(
                &format!("http://{addr}/"),
                5000,
                1,
                Duration::from_secs(2),
                true,
            )
            .await;
        assert!(r.error.is_none());
        assert!(r.article_body.is_empty());
        // Raw mode keeps short blocks the secondary filter would drop.
        assert!(r.main_content.contains("tiny"));
        assert!(r.main_content.contains("article words"));
        assert!(!r.main_content.contains("var x"));
    }

    #[tokio::test]
    async fn service_defaults_come_from_settings() {
        let app = Router::new().route("/", get(|| async { Html(PAGE) }));
        let addr = spawn_fixture(app).await;

        let mut settings = AppSettings::default();
        settings.webpage.max_chars = 40;
        let svc = WebExplorerService::from_settings(settings).unwrap();

        let r = svc
            .extract_webpage_content(&format!("http://{addr}/"), None, None, None, false)
            .await;
        assert!(r.error.is_none());
        // max_chars=40 forces pagination of the outside paragraph.
        assert!(r.main_text.chars().count() <= 43);
    }
}

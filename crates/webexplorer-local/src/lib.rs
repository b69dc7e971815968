use std::time::Duration;
use webexplorer_core::{Error, FetchedPage, PageFetcher, Result};

pub mod classify;
pub mod render_playwright;
pub mod sanitize;
pub mod searxng;
pub mod select;
pub mod service;
pub mod settings;

pub use render_playwright::PlaywrightFetcher;
pub use searxng::SearxngClient;
pub use service::{ContentService, WebExplorerService};
pub use settings::AppSettings;

/// Desktop-browser User-Agent; some sites serve stripped or blocked pages to
/// unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Plain-HTTP fetch strategy: one GET with redirect-follow and a per-request
/// timeout. Suitable for static HTML; JavaScript-heavy pages need
/// [`PlaywrightFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            // Safety defaults: avoid hanging forever on DNS/TLS stalls.
            // The per-request timeout still applies on top.
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::InvalidArgument(format!("invalid url: {e}")))?;

        let resp = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Connection(format!("Request timeout after {} seconds", timeout.as_secs()))
                } else {
                    Error::Connection(e.to_string())
                }
            })?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            html,
        })
    }
}

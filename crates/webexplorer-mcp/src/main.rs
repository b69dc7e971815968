use anyhow::Result;
use clap::{Parser, Subcommand};

use webexplorer_local::settings::{FetchBackend, LogFormat, LoggingSettings};
use webexplorer_local::AppSettings;

#[derive(Parser, Debug)]
#[command(name = "webexplorer")]
#[command(about = "Web search + webpage content extraction (MCP stdio server)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as an MCP stdio server (for Cursor / MCP clients).
    #[cfg(feature = "stdio")]
    McpStdio,
    /// Diagnose configuration/launch issues (json; no secrets).
    Doctor,
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn backend_name(b: FetchBackend) -> &'static str {
    match b {
        FetchBackend::Http => "http",
        FetchBackend::Browser => "browser",
    }
}

/// Console logging goes to stderr: stdout is the MCP transport and must stay
/// JSON-RPC only. The optional file layer gets its own level and format.
fn init_logging(s: &LoggingSettings) -> Result<()> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    // RUST_LOG, when set, overrides the configured console level.
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&s.console_level));
    layers.push(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed(),
    );

    if let Some(path) = &s.file_path {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let file = std::sync::Arc::new(file);
        let layer = match s.file_format {
            LogFormat::Json => fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(&s.file_level))
                .boxed(),
            LogFormat::Text => fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_filter(EnvFilter::new(&s.file_level))
                .boxed(),
        };
        layers.push(layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(())
}

fn doctor_report() -> serde_json::Value {
    let settings = match AppSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            return serde_json::json!({
                "ok": false,
                "error": e.to_string(),
            })
        }
    };

    // Browser backend needs Node on PATH; report it so misconfigurations are
    // visible before the first tool call.
    let node_version = std::process::Command::new(
        std::env::var("WEBEXPLORER_NODE").unwrap_or_else(|_| "node".to_string()),
    )
    .arg("--version")
    .output()
    .ok()
    .filter(|o| o.status.success())
    .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string());

    serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "search": {
            "searxng_url": settings.search.searxng_url,
            "page_size": settings.search.page_size,
            "timeout_s": settings.search.timeout_s,
        },
        "webpage": {
            "fetch_backend": backend_name(settings.webpage.fetch_backend),
            "max_chars": settings.webpage.max_chars,
            "timeout_s": settings.webpage.timeout_s,
            "browser_timeout_s": settings.webpage.browser_timeout_s,
        },
        "logging": {
            "console_level": settings.logging.console_level,
            "file_path": settings.logging.file_path,
            "file_level": settings.logging.file_level,
        },
        "node": {
            "available": node_version.is_some(),
            "version": node_version,
        },
    })
}

#[cfg(feature = "stdio")]
mod mcp {
    use rmcp::{
        handler::server::router::tool::ToolRouter as RmcpToolRouter,
        handler::server::wrapper::Parameters,
        model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
        tool, tool_handler, tool_router,
        transport::stdio,
        ErrorData as McpError, ServiceExt,
    };
    use schemars::JsonSchema;
    use serde::Deserialize;
    use std::sync::Arc;
    use webexplorer_local::WebExplorerService;

    #[derive(Clone)]
    pub(crate) struct WebExplorerMcp {
        tool_router: RmcpToolRouter<Self>,
        service: Arc<WebExplorerService>,
    }

    fn tool_result(payload: serde_json::Value) -> CallToolResult {
        // Always attach structured content for machine consumers, and include
        // a text fallback for older clients/tests that only read
        // `content[0].text`.
        let mut r = CallToolResult::structured(payload.clone());
        r.content = vec![Content::text(payload.to_string())];
        r
    }

    #[derive(Debug, Deserialize, JsonSchema, Default)]
    struct WebSearchArgs {
        /// Search query (required).
        #[serde(default)]
        query: Option<String>,
        /// 1-based results page, forwarded to SearXNG (default: 1).
        #[serde(default)]
        page: Option<i64>,
        /// Maximum number of results to return (default from configuration).
        #[serde(default)]
        page_size: Option<i64>,
    }

    #[derive(Debug, Deserialize, JsonSchema, Default)]
    struct WebpageContentArgs {
        /// Absolute URL to fetch (required).
        #[serde(default)]
        url: Option<String>,
        /// Characters per content page (default from configuration).
        #[serde(default)]
        max_chars: Option<usize>,
        /// 1-based content page to return (default: 1).
        #[serde(default)]
        page: Option<usize>,
        /// Fetch timeout in seconds (default from configuration).
        #[serde(default)]
        timeout: Option<u64>,
        /// Return the sanitized whole-document text instead of the
        /// article/secondary split (default: false).
        #[serde(default)]
        raw_content: Option<bool>,
    }

    #[tool_router]
    impl WebExplorerMcp {
        pub(crate) fn new() -> Result<Self, McpError> {
            let service = WebExplorerService::from_env()
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(Self {
                tool_router: Self::tool_router(),
                service: Arc::new(service),
            })
        }

        #[tool(
            description = "Search the web via the configured SearXNG instance. Failures are reported in the `error` field of the JSON result, never as a transport error."
        )]
        async fn web_search_tool(
            &self,
            params: Parameters<Option<WebSearchArgs>>,
        ) -> Result<CallToolResult, McpError> {
            let args = params.0.unwrap_or_default();
            let query = args.query.unwrap_or_default();
            let resp = self
                .service
                .search_web(&query, args.page, args.page_size)
                .await;
            let payload = serde_json::to_value(&resp)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            Ok(tool_result(payload))
        }

        #[tool(
            description = "Fetch a webpage and return its extracted content: title, article body, paginated main text, headings, links, images, and metadata. Failures are reported in the `error` field."
        )]
        async fn webpage_content_tool(
            &self,
            params: Parameters<Option<WebpageContentArgs>>,
        ) -> Result<CallToolResult, McpError> {
            let args = params.0.unwrap_or_default();
            let url = args.url.unwrap_or_default();
            let content = self
                .service
                .extract_webpage_content(
                    &url,
                    args.max_chars,
                    args.page,
                    args.timeout,
                    args.raw_content.unwrap_or(false),
                )
                .await;
            let mut payload = serde_json::to_value(&content)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            // Top-level pagination mirrors for clients that don't drill into
            // the nested object.
            payload["page"] = serde_json::json!(content.pagination.page);
            payload["total_pages"] = serde_json::json!(content.pagination.total_pages);
            payload["has_next_page"] = serde_json::json!(content.pagination.has_next_page);
            Ok(tool_result(payload))
        }
    }

    #[tool_handler]
    impl rmcp::ServerHandler for WebExplorerMcp {
        fn get_info(&self) -> ServerInfo {
            ServerInfo {
                instructions: Some(
                    "Web search (SearXNG) and webpage content extraction. Outputs are JSON; failures land in the `error` field of each result."
                        .to_string(),
                ),
                capabilities: ServerCapabilities::builder().enable_tools().build(),
                ..Default::default()
            }
        }
    }

    pub(crate) async fn serve_stdio() -> Result<(), McpError> {
        let svc = WebExplorerMcp::new()?;
        let running = svc
            .serve(stdio())
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        // Keep the stdio server alive until the client closes.
        running
            .waiting()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn payload_from_result(r: &CallToolResult) -> serde_json::Value {
            if let Some(v) = r.structured_content.clone() {
                return v;
            }
            let s = r
                .content
                .first()
                .and_then(|c| c.as_text())
                .map(|t| t.text.clone())
                .unwrap_or_default();
            serde_json::from_str(&s).unwrap_or_else(|_| serde_json::json!({}))
        }

        #[test]
        fn tool_result_carries_structured_and_text_content() {
            let r = tool_result(serde_json::json!({"query": "rust", "error": null}));
            let v = payload_from_result(&r);
            assert_eq!(v["query"].as_str(), Some("rust"));
            let text = r.content.first().and_then(|c| c.as_text()).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&text.text).unwrap();
            assert_eq!(parsed, v);
        }

        #[test]
        fn args_tolerate_missing_fields() {
            let a: WebSearchArgs = serde_json::from_str("{}").unwrap();
            assert!(a.query.is_none());
            let a: WebpageContentArgs =
                serde_json::from_str(r#"{"url":"https://example.com"}"#).unwrap();
            assert_eq!(a.url.as_deref(), Some("https://example.com"));
            assert!(a.max_chars.is_none());
            assert!(a.raw_content.is_none());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "stdio")]
        Commands::McpStdio => {
            let settings = AppSettings::from_env()?;
            init_logging(&settings.logging)?;
            tracing::info!(
                backend = backend_name(settings.webpage.fetch_backend),
                searxng_url = settings.search.searxng_url,
                "starting MCP stdio server"
            );
            mcp::serve_stdio()
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        }
        Commands::Doctor => {
            println!("{}", serde_json::to_string_pretty(&doctor_report())?);
        }
        Commands::Version(args) => {
            if args.output == "text" {
                println!("webexplorer {}", env!("CARGO_PKG_VERSION"));
            } else {
                println!(
                    "{}",
                    serde_json::json!({
                        "name": "webexplorer",
                        "version": env!("CARGO_PKG_VERSION"),
                    })
                );
            }
        }
    }
    Ok(())
}

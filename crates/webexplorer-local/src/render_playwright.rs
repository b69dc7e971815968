//! Browser-rendered fetching via a Node + Playwright shellout.
//!
//! We deliberately do not embed a browser automation stack in-process: the
//! Playwright npm package already solves launch/teardown/stealth, and a
//! short-lived child process cannot leak browser state between requests.
//! Arguments travel as JSON over stdin (no argv quoting issues) and the
//! child's stdout is JSON-only. The whole operation sits under a hard
//! wall-clock timeout with `kill_on_drop`, so a wedged browser can never
//! hang a tool call.

use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use webexplorer_core::{Error, FetchedPage, PageFetcher, Result};

use crate::USER_AGENT;

/// Grace period added to the page timeout before the child is killed.
const HARD_TIMEOUT_GRACE: Duration = Duration::from_secs(10);

// Expected setup: Node.js on PATH (or WEBEXPLORER_NODE), the `playwright`
// npm package resolvable by Node (globally or via NODE_PATH /
// WEBEXPLORER_NODE_PATH), and browsers installed
// (`npx playwright install chromium`). We never auto-install at runtime.
const JS: &str = r#"
const fs = require('fs');

function ok(obj) { process.stdout.write(JSON.stringify(obj)); }
function bad(code, message) { ok({ ok: false, error: { code, message } }); }

async function main() {
  let arg = '';
  try { arg = fs.readFileSync(0, 'utf8'); } catch (_) {}
  let req;
  try { req = JSON.parse(arg); } catch (e) { return bad('invalid_params', 'bad JSON args'); }

  let pw;
  try { pw = require('playwright'); } catch (e) {
    return bad('not_configured',
      'Playwright is not installed for Node.js (require("playwright") failed); run `npm i -g playwright` and `npx playwright install chromium`');
  }

  const url = String(req.url || '').trim();
  if (!url) return bad('invalid_params', 'url must be non-empty');
  const timeoutMs = Number(req.timeout_ms || 30000);
  const userAgent = String(req.user_agent || '');

  let browser;
  try {
    browser = await pw.chromium.launch({ headless: true });
    const contextOpts = { serviceWorkers: 'block' };
    if (userAgent) contextOpts.userAgent = userAgent;
    const context = await browser.newContext(contextOpts);
    const page = await context.newPage();

    const resp = await page.goto(url, { waitUntil: 'domcontentloaded', timeout: timeoutMs });
    // Best-effort settle; long-polling pages must not block us.
    try { await page.waitForLoadState('networkidle', { timeout: Math.min(5000, timeoutMs) }); } catch (_) {}

    ok({
      ok: true,
      final_url: page.url(),
      status: resp ? resp.status() : null,
      html: await page.content(),
    });
  } catch (e) {
    bad('render_failed', String(e && e.message ? e.message : e));
  } finally {
    try { if (browser) await browser.close(); } catch (_) {}
  }
}

main().catch((e) => bad('render_failed', String(e && e.message ? e.message : e)));
"#;

#[derive(Debug, Deserialize)]
struct RenderReport {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<RenderError>,
    #[serde(default)]
    final_url: Option<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenderError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaywrightFetcher;

impl PlaywrightFetcher {
    pub fn new() -> Self {
        Self
    }
}

fn node_bin() -> String {
    std::env::var("WEBEXPLORER_NODE").unwrap_or_else(|_| "node".to_string())
}

/// Explicit module-root override so users can point Node at a global
/// Playwright install without touching NODE_PATH system-wide.
fn node_path_override() -> Option<String> {
    std::env::var("WEBEXPLORER_NODE_PATH")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait::async_trait]
impl PageFetcher for PlaywrightFetcher {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage> {
        url::Url::parse(url).map_err(|e| Error::InvalidArgument(format!("invalid url: {e}")))?;

        let args_json = serde_json::json!({
            "url": url,
            "timeout_ms": timeout.as_millis() as u64,
            "user_agent": USER_AGENT,
        })
        .to_string();

        let mut cmd = tokio::process::Command::new(node_bin());
        if let Some(node_path) = node_path_override() {
            cmd.env("NODE_PATH", node_path);
        }
        let mut child = cmd
            .arg("-e")
            .arg(JS)
            .kill_on_drop(true)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::NotConfigured(format!(
                    "browser fetch requires Node.js (`node`) with the Playwright npm package: {e}"
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Best-effort: a failed write surfaces as a JSON error from the
            // child or as a wait failure below.
            let _ = stdin.write_all(args_json.as_bytes()).await;
            // EOF so the script's readFileSync(0) completes.
            let _ = stdin.shutdown().await;
        }

        // `wait_with_output` consumes the child, which would prevent killing
        // it on timeout; read the pipes concurrently and wait with a hard cap.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Extraction("missing stdout pipe".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Extraction("missing stderr pipe".to_string()))?;

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let hard_timeout = timeout.saturating_add(HARD_TIMEOUT_GRACE);
        let status = match tokio::time::timeout(hard_timeout, child.wait()).await {
            Ok(r) => r.map_err(|e| Error::Extraction(format!("node process failed: {e}")))?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(Error::Extraction(format!(
                    "timed out after {} seconds",
                    hard_timeout.as_secs()
                )));
            }
        };

        let stdout_buf = stdout_task.await.unwrap_or_default();
        let stderr_buf = stderr_task.await.unwrap_or_default();

        if stdout_buf.is_empty() {
            let err = String::from_utf8_lossy(&stderr_buf);
            let err = err.trim();
            return Err(Error::Extraction(format!(
                "node exited with {status} and no output{}{}",
                if err.is_empty() { "" } else { ": " },
                err
            )));
        }

        let report: RenderReport = serde_json::from_slice(&stdout_buf)
            .map_err(|e| Error::Extraction(format!("unreadable render report: {e}")))?;

        if !report.ok {
            let err = report.error.unwrap_or(RenderError {
                code: "render_failed".to_string(),
                message: "unknown failure".to_string(),
            });
            return Err(match err.code.as_str() {
                "not_configured" => Error::NotConfigured(err.message),
                _ => Error::Extraction(err.message),
            });
        }

        let http_status = report.status.unwrap_or(200);
        if !(200..300).contains(&http_status) {
            return Err(Error::HttpStatus(http_status));
        }

        tracing::debug!(url, final_url = report.final_url.as_deref(), "browser fetch completed");

        Ok(FetchedPage {
            url: url.to_string(),
            final_url: report.final_url.unwrap_or_else(|| url.to_string()),
            status: http_status,
            html: report.html.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_report_parses_success_shape() {
        let js = r#"{"ok":true,"final_url":"https://example.com/","status":200,"html":"<html></html>"}"#;
        let r: RenderReport = serde_json::from_str(js).unwrap();
        assert!(r.ok);
        assert_eq!(r.status, Some(200));
        assert_eq!(r.final_url.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn render_report_parses_failure_shape() {
        let js = r#"{"ok":false,"error":{"code":"not_configured","message":"no playwright"}}"#;
        let r: RenderReport = serde_json::from_str(js).unwrap();
        assert!(!r.ok);
        let e = r.error.unwrap();
        assert_eq!(e.code, "not_configured");
        assert_eq!(e.message, "no playwright");
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_spawning() {
        let err = PlaywrightFetcher::new()
            .fetch("nope", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid url"));
    }
}

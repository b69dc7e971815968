//! Environment-driven configuration, validated at startup.
//!
//! Every knob has a default; malformed values abort with `InvalidArgument`
//! rather than being silently replaced, so a typo in a deployment shows up
//! at boot instead of as surprising runtime behavior.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use webexplorer_core::{Error, Result};

const ENV_PREFIX: &str = "WEBEXPLORER_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBackend {
    /// Plain reqwest GET.
    Http,
    /// Node + Playwright rendering for JavaScript-heavy pages.
    Browser,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub console_level: String,
    pub file_level: String,
    /// `None` disables file logging entirely.
    pub file_path: Option<PathBuf>,
    pub file_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub searxng_url: String,
    pub page_size: i64,
    pub timeout_s: u64,
}

#[derive(Debug, Clone)]
pub struct WebpageSettings {
    pub max_chars: usize,
    pub timeout_s: u64,
    /// Browser rendering needs more headroom than a plain GET.
    pub browser_timeout_s: u64,
    pub fetch_backend: FetchBackend,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub debug: bool,
    pub logging: LoggingSettings,
    pub search: SearchSettings,
    pub webpage: WebpageSettings,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console_level: "info".to_string(),
            file_level: "info".to_string(),
            file_path: None,
            file_format: LogFormat::Text,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            searxng_url: "http://127.0.0.1:9011".to_string(),
            page_size: 5,
            timeout_s: 15,
        }
    }
}

impl Default for WebpageSettings {
    fn default() -> Self {
        Self {
            max_chars: 5000,
            timeout_s: 15,
            browser_timeout_s: 30,
            fetch_backend: FetchBackend::Http,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug: false,
            logging: LoggingSettings::default(),
            search: SearchSettings::default(),
            webpage: WebpageSettings::default(),
        }
    }
}

impl SearchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

/// Read `WEBEXPLORER_{suffix}`, trimmed; unset or blank is `None`.
fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(suffix: &str) -> Result<Option<T>> {
    match env_var(suffix) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            Error::InvalidArgument(format!(
                "{ENV_PREFIX}{suffix}: invalid value {raw:?}"
            ))
        }),
    }
}

fn env_bool(suffix: &str) -> Result<Option<bool>> {
    match env_var(suffix) {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::InvalidArgument(format!(
                "{ENV_PREFIX}{suffix}: expected a boolean, got {raw:?}"
            ))),
        },
    }
}

fn env_level(suffix: &str, default: &str) -> Result<String> {
    match env_var(suffix) {
        None => Ok(default.to_string()),
        Some(raw) => {
            let lower = raw.to_ascii_lowercase();
            if LOG_LEVELS.contains(&lower.as_str()) {
                Ok(lower)
            } else {
                Err(Error::InvalidArgument(format!(
                    "{ENV_PREFIX}{suffix}: unknown log level {raw:?}"
                )))
            }
        }
    }
}

impl AppSettings {
    pub fn from_env() -> Result<Self> {
        let mut s = Self::default();

        if let Some(debug) = env_bool("DEBUG")? {
            s.debug = debug;
        }

        if let Some(url) = env_var("SEARXNG_URL") {
            s.search.searxng_url = url;
        }
        if let Some(n) = env_parse::<i64>("SEARCH_PAGE_SIZE")? {
            if n < 1 {
                return Err(Error::InvalidArgument(format!(
                    "{ENV_PREFIX}SEARCH_PAGE_SIZE: must be 1 or greater, got {n}"
                )));
            }
            s.search.page_size = n;
        }
        if let Some(n) = env_parse::<u64>("SEARCH_TIMEOUT_S")? {
            s.search.timeout_s = n;
        }

        if let Some(n) = env_parse::<usize>("WEBPAGE_MAX_CHARS")? {
            if n == 0 {
                return Err(Error::InvalidArgument(format!(
                    "{ENV_PREFIX}WEBPAGE_MAX_CHARS: must be 1 or greater, got {n}"
                )));
            }
            s.webpage.max_chars = n;
        }
        if let Some(n) = env_parse::<u64>("WEBPAGE_TIMEOUT_S")? {
            s.webpage.timeout_s = n;
        }
        if let Some(n) = env_parse::<u64>("BROWSER_TIMEOUT_S")? {
            s.webpage.browser_timeout_s = n;
        }
        if let Some(raw) = env_var("FETCH_BACKEND") {
            s.webpage.fetch_backend = match raw.to_ascii_lowercase().as_str() {
                "http" => FetchBackend::Http,
                "browser" => FetchBackend::Browser,
                _ => {
                    return Err(Error::InvalidArgument(format!(
                        "{ENV_PREFIX}FETCH_BACKEND: expected \"http\" or \"browser\", got {raw:?}"
                    )))
                }
            };
        }

        s.logging.console_level = env_level("LOG_CONSOLE_LEVEL", &s.logging.console_level)?;
        s.logging.file_level = env_level("LOG_FILE_LEVEL", &s.logging.file_level)?;
        s.logging.file_path = env_var("LOG_FILE_PATH").map(PathBuf::from);
        if let Some(raw) = env_var("LOG_FILE_FORMAT") {
            s.logging.file_format = match raw.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(Error::InvalidArgument(format!(
                        "{ENV_PREFIX}LOG_FILE_FORMAT: expected \"text\" or \"json\", got {raw:?}"
                    )))
                }
            };
        }

        // Debug mode lowers the console floor unless an explicit level is set.
        if s.debug && env_var("LOG_CONSOLE_LEVEL").is_none() {
            s.logging.console_level = "debug".to_string();
        }

        Ok(s)
    }
}

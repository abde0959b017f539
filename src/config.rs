//! Runtime settings, optionally loaded from a YAML file (`--config`).
//!
//! Every field has a default, so a settings file only needs the keys it
//! wants to change:
//!
//! ```yaml
//! pace_ms: 200
//! retry:
//!   max_retries: 3
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::error::{CollectorError, Result};
use crate::retry::RetryPolicy;

pub const DEFAULT_NEWS_ENDPOINT: &str = "https://openapi.naver.com/v1/search/news.json";
pub const DEFAULT_YOUTUBE_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Full URL of the news search endpoint.
    pub news_endpoint: String,
    /// Base URL of the YouTube Data API (`/search`, `/videos`, `/commentThreads` are appended).
    pub youtube_endpoint: String,
    /// Per-request timeout; timeouts are retried under [`Settings::retry`].
    pub request_timeout_secs: u64,
    /// Pause after every successful paged or per-item call.
    pub pace_ms: u64,
    pub retry: RetryPolicy,
    /// Where exports are written unless `--output-dir` is given.
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            news_endpoint: DEFAULT_NEWS_ENDPOINT.to_string(),
            youtube_endpoint: DEFAULT_YOUTUBE_ENDPOINT.to_string(),
            request_timeout_secs: 10,
            pace_ms: 100,
            retry: RetryPolicy::default(),
            output_dir: "./output".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or return the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&raw)?;
        info!(path, "Loaded settings");
        Ok(settings)
    }

    /// Parse settings and check that both endpoints are absolute http(s) URLs.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(raw)?;
        settings.check_endpoints()?;
        Ok(settings)
    }

    fn check_endpoints(&self) -> Result<()> {
        let errors: Vec<String> = [
            ("news_endpoint", &self.news_endpoint),
            ("youtube_endpoint", &self.youtube_endpoint),
        ]
        .into_iter()
        .filter_map(|(name, raw)| match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => None,
            Ok(url) => Some(format!("{name} must be http(s), got scheme {:?}", url.scheme())),
            Err(e) => Some(format!("{name} {raw:?} is not a valid URL: {e}")),
        })
        .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CollectorError::Validation(errors))
        }
    }

    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

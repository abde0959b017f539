//! YouTube Data API v3 client shared by the video and comment adapters.
//!
//! The adapters themselves live in [`super::video`] and [`super::comments`];
//! this module holds the request plumbing, error classification, the
//! broadcaster allow-list and the key probe.
//!
//! # Error classification
//!
//! | Response | Result |
//! |----------|--------|
//! | 2xx | decoded body |
//! | 403 with reason `commentsDisabled` | [`CollectorError::CommentsDisabled`] |
//! | any other 403 | [`CollectorError::QuotaExceeded`] |
//! | 429 / timeout | retried, then [`CollectorError::RetriesExhausted`] |
//! | anything else | [`CollectorError::Api`] |

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::error::{CollectorError, Result};
use crate::models::KeyStatus;
use crate::retry::{RetryPolicy, send_with_backoff};
use crate::utils::truncate_for_log;

/// A broadcaster channel searched in restricted mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub name: &'static str,
    pub id: &'static str,
}

/// Major Korean broadcasters, searched in this order.
pub const BROADCAST_CHANNELS: [Channel; 10] = [
    Channel { name: "KBS 뉴스", id: "UCcQTRi69dsVYHN3exePtZ1A" },
    Channel { name: "JTBC News", id: "UCXQeWk31YT3MlhfizLA_xMw" },
    Channel { name: "연합뉴스TV", id: "UCxLR8OviGXLhE5BqgX23vhQ" },
    Channel { name: "MBC 뉴스", id: "UCF4Wxdo3inmxP-Y59wXDsFw" },
    Channel { name: "SBS 뉴스", id: "UCkinYTS9IHqOEwR1Sze2JTw" },
    Channel { name: "YTN", id: "UChlgI3UHCOnwUGzWzbJ3H5w" },
    Channel { name: "채널A 뉴스", id: "UCj9TF4paIhOerQ1j3dZiMpg" },
    Channel { name: "TV조선 뉴스", id: "UCZ4RZuXImih-dAoLXCL-aLg" },
    Channel { name: "MBN 뉴스", id: "UCIVSsrMlnj3QZYX0RvV_FTg" },
    Channel { name: "뉴스1", id: "UC4-3VgJLc96awTpZQG7Xx-A" },
];

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// `reason` strings from a Google API error body; empty if the body is not one.
fn error_reasons(body: &str) -> Vec<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.errors.into_iter().map(|e| e.reason).collect())
        .unwrap_or_default()
}

/// Map a non-success response to the error taxonomy.
pub(crate) fn classify_failure(status: StatusCode, body: String) -> CollectorError {
    if status == StatusCode::FORBIDDEN {
        if error_reasons(&body).iter().any(|r| r == "commentsDisabled") {
            return CollectorError::CommentsDisabled;
        }
        return CollectorError::QuotaExceeded;
    }
    CollectorError::Api {
        status: status.as_u16(),
        body,
    }
}

pub struct YouTubeClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    pub(crate) pace: Duration,
}

impl YouTubeClient {
    pub fn new(settings: &Settings, api_key: &str) -> Result<Self> {
        let http = Client::builder().timeout(settings.request_timeout()).build()?;
        Ok(Self {
            http,
            base_url: settings.youtube_endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry: settings.retry,
            pace: settings.pace(),
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// GET `resource` with `params` plus the API key, decoding a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(resource);
        let resp = send_with_backoff(&self.retry, resource, || {
            self.http
                .get(&url)
                .query(&[("key", self.api_key.as_str())])
                .query(params)
        })
        .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(
            resource,
            status = status.as_u16(),
            body = %truncate_for_log(&body, 300),
            "YouTube API call failed"
        );
        Err(classify_failure(status, body))
    }

    /// Lightweight search telling whether the API key is accepted.
    #[instrument(level = "info", skip_all)]
    pub async fn probe(&self) -> KeyStatus {
        let result = self
            .http
            .get(self.endpoint("search"))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", "test"),
                ("part", "id"),
                ("maxResults", "1"),
            ])
            .send()
            .await;

        let (valid, message) = match result {
            Ok(resp) if resp.status().is_success() => (true, "YouTube API key is valid".to_string()),
            Ok(resp) if resp.status() == StatusCode::BAD_REQUEST => {
                (false, "YouTube API key is invalid".to_string())
            }
            Ok(resp) if resp.status() == StatusCode::FORBIDDEN => (
                false,
                "YouTube API key lacks permission or its quota is exhausted".to_string(),
            ),
            Ok(resp) => (
                false,
                format!("YouTube API error (status {})", resp.status().as_u16()),
            ),
            Err(e) => (false, format!("YouTube API connection failed: {e}")),
        };
        info!(valid, %message, "Probed YouTube credentials");
        KeyStatus {
            source: "youtube",
            valid,
            message,
        }
    }
}

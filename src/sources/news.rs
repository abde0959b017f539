//! Naver News Search adapter.
//!
//! Pages through `news.json` sorted by date, 100 items per request, keeping
//! only items whose publication day falls inside the requested window.
//!
//! # Pagination
//!
//! The `start` offset begins at 1 and advances by 100 each round. Paging
//! stops when `max_results` items have been kept, when the API returns an
//! empty page, or when the offset passes `max_results` (or the provider's
//! 1000 ceiling). Items dropped by the date filter do not count toward
//! `max_results` and do not stop paging.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Settings;
use crate::error::{CollectorError, Result};
use crate::models::{Collected, KeyStatus, NewsItem, Warning};
use crate::retry::{RetryPolicy, send_with_backoff};
use crate::utils::{LOCAL_TIME_FORMAT, clean_html, truncate_for_log};

/// Items per request; also the offset step.
pub const PAGE_SIZE: usize = 100;
/// Largest `start` value the API accepts.
pub const MAX_START: usize = 1000;
/// `pubDate` format, e.g. `Mon, 03 Nov 2025 10:30:00 +0900`.
const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Debug, Deserialize)]
struct NewsPage {
    #[serde(default)]
    items: Vec<NewsHit>,
}

#[derive(Debug, Deserialize)]
struct NewsHit {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "originallink")]
    original_link: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "pubDate")]
    pub_date: String,
}

/// Parse `pubDate`, keeping the publisher's wall-clock time.
fn parse_pub_date(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    DateTime::parse_from_str(raw, PUB_DATE_FORMAT).map(|dt| dt.naive_local())
}

pub struct NaverNewsClient {
    http: Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
    retry: RetryPolicy,
    pace: Duration,
}

impl NaverNewsClient {
    pub fn new(settings: &Settings, client_id: &str, client_secret: &str) -> Result<Self> {
        let http = Client::builder().timeout(settings.request_timeout()).build()?;
        Ok(Self {
            http,
            endpoint: settings.news_endpoint.clone(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            retry: settings.retry,
            pace: settings.pace(),
        })
    }

    fn request(&self, params: &[(&str, String)]) -> RequestBuilder {
        self.http
            .get(&self.endpoint)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(params)
    }

    /// Collect up to `max_results` articles for `query` published between
    /// `start` and `end` (inclusive, publisher-local days).
    #[instrument(level = "info", skip_all, fields(%query, max_results))]
    pub async fn collect(
        &self,
        query: &str,
        start: NaiveDate,
        end: NaiveDate,
        max_results: u32,
    ) -> Result<Collected<NewsItem>> {
        let t0 = Instant::now();
        let max = max_results as usize;
        let mut out = Collected::default();
        let mut offset = 1usize;
        let mut pages = 0usize;
        let mut seen = 0usize;

        while out.records.len() < max && offset <= MAX_START {
            let display = PAGE_SIZE.min(max - out.records.len());
            let params = [
                ("query", query.to_string()),
                ("display", display.to_string()),
                ("start", offset.to_string()),
                ("sort", "date".to_string()),
            ];

            let resp = send_with_backoff(&self.retry, "naver news page", || self.request(&params)).await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!(
                    status = status.as_u16(),
                    offset,
                    body = %truncate_for_log(&body, 300),
                    "News API returned an error; aborting keyword"
                );
                return Err(CollectorError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let page: NewsPage = resp.json().await?;
            pages += 1;
            if page.items.is_empty() {
                debug!(offset, "Empty page; no more results");
                break;
            }

            for hit in page.items {
                if out.records.len() >= max {
                    break;
                }
                seen += 1;
                let published = match parse_pub_date(&hit.pub_date) {
                    Ok(published) => published,
                    Err(e) => {
                        warn!(link = %hit.link, pub_date = %hit.pub_date, error = %e, "Skipping item with unparseable date");
                        out.warnings.push(Warning::new(
                            hit.link,
                            format!("unparseable pubDate {:?}: {e}", hit.pub_date),
                        ));
                        continue;
                    }
                };
                let day = published.date();
                if day < start || day > end {
                    continue;
                }
                out.records.push(NewsItem {
                    title: clean_html(&hit.title),
                    description: clean_html(&hit.description),
                    link: hit.link,
                    original_link: hit.original_link,
                    published_at: published.format(LOCAL_TIME_FORMAT).to_string(),
                    source: None,
                    author: None,
                });
            }

            offset += PAGE_SIZE;
            sleep(self.pace).await;
        }

        info!(
            collected = out.records.len(),
            seen,
            pages,
            warnings = out.warnings.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Collected news"
        );
        Ok(out)
    }

    /// Lightweight request telling whether the credentials are accepted.
    #[instrument(level = "info", skip_all)]
    pub async fn probe(&self) -> KeyStatus {
        let params = [("query", "test".to_string()), ("display", "1".to_string())];
        let (valid, message) = match self.request(&params).send().await {
            Ok(resp) if resp.status().is_success() => (true, "Naver API key is valid".to_string()),
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED => {
                (false, "Naver API key is invalid".to_string())
            }
            Ok(resp) => (
                false,
                format!("Naver API error (status {})", resp.status().as_u16()),
            ),
            Err(e) => (false, format!("Naver API connection failed: {e}")),
        };
        info!(valid, %message, "Probed Naver credentials");
        KeyStatus {
            source: "naver",
            valid,
            message,
        }
    }
}

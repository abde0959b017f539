//! Collection inputs and their pre-flight validation.
//!
//! Validation never stops at the first problem: every issue found is
//! returned together in one [`CollectorError::Validation`].

use chrono::NaiveDate;
use itertools::Itertools;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{CollectorError, Result};
use crate::models::Source;

pub const NEWS_MAX_RANGE: RangeInclusive<u32> = 10..=1000;
pub const VIDEO_MAX_RANGE: RangeInclusive<u32> = 10..=200;
pub const COMMENTS_PER_VIDEO_RANGE: RangeInclusive<u32> = 10..=500;
pub const LIMIT_STEP: u32 = 10;

/// Split a comma-separated keyword string: trim, drop empties, and remove
/// duplicates while keeping first-seen order.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// API credentials for one run. `Debug` never prints the secrets.
#[derive(Clone, Default)]
pub struct Credentials {
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl Credentials {
    /// Both Naver values, if both are present and non-blank.
    pub fn naver(&self) -> Option<(&str, &str)> {
        match (non_blank(&self.naver_client_id), non_blank(&self.naver_client_secret)) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    pub fn youtube(&self) -> Option<&str> {
        non_blank(&self.youtube_api_key)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("naver_client_id", &mask(&self.naver_client_id))
            .field("naver_client_secret", &mask(&self.naver_client_secret))
            .field("youtube_api_key", &mask(&self.youtube_api_key))
            .finish()
    }
}

/// Which sources are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSelection {
    pub news: bool,
    pub video: bool,
    pub comments: bool,
}

impl SourceSelection {
    pub fn is_enabled(&self, source: Source) -> bool {
        match source {
            Source::News => self.news,
            Source::Video => self.video,
            Source::Comments => self.comments,
        }
    }

    pub fn enabled_count(&self) -> usize {
        Source::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Max news items per keyword.
    pub news_max: u32,
    /// Max videos per keyword.
    pub video_max: u32,
    /// Max comments per video (only the first provider page is fetched).
    pub comments_per_video: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            news_max: 100,
            video_max: 50,
            comments_per_video: 100,
        }
    }
}

/// Everything a collection run needs, as entered by the user.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    pub keywords: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sources: SourceSelection,
    pub limits: Limits,
    /// Search only the broadcaster allow-list instead of all of YouTube.
    pub restrict_channels: bool,
    pub credentials: Credentials,
}

impl CollectionRequest {
    /// Check the request before any network call is made.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.keywords.is_empty() {
            errors.push("enter at least one search keyword".to_string());
        }
        if self.start_date > self.end_date {
            errors.push(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            ));
        }
        if self.sources.news && self.credentials.naver().is_none() {
            errors.push("news collection needs a Naver client id and client secret".to_string());
        }
        if (self.sources.video || self.sources.comments) && self.credentials.youtube().is_none() {
            errors.push("video and comment collection need a YouTube API key".to_string());
        }
        if self.sources.enabled_count() == 0 {
            errors.push("select at least one source to collect".to_string());
        }

        for source in Source::ALL {
            if !self.sources.is_enabled(source) {
                continue;
            }
            let (name, value, range) = match source {
                Source::News => ("news max", self.limits.news_max, NEWS_MAX_RANGE),
                Source::Video => ("video max", self.limits.video_max, VIDEO_MAX_RANGE),
                Source::Comments => (
                    "comments per video",
                    self.limits.comments_per_video,
                    COMMENTS_PER_VIDEO_RANGE,
                ),
            };
            check_limit(&mut errors, name, value, range);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CollectorError::Validation(errors))
        }
    }

    /// Number of progress steps: one per keyword per enabled source.
    pub fn total_steps(&self) -> usize {
        self.keywords.len() * self.sources.enabled_count()
    }
}

fn check_limit(errors: &mut Vec<String>, name: &str, value: u32, range: RangeInclusive<u32>) {
    if !range.contains(&value) || value % LIMIT_STEP != 0 {
        errors.push(format!(
            "{name} must be a multiple of {LIMIT_STEP} between {} and {} (got {value})",
            range.start(),
            range.end()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request() -> CollectionRequest {
        CollectionRequest {
            keywords: vec!["중대재해".to_string()],
            start_date: date(2025, 11, 1),
            end_date: date(2025, 11, 25),
            sources: SourceSelection {
                news: true,
                video: true,
                comments: true,
            },
            limits: Limits::default(),
            restrict_channels: true,
            credentials: Credentials {
                naver_client_id: Some("id".to_string()),
                naver_client_secret: Some("secret".to_string()),
                youtube_api_key: Some("key".to_string()),
            },
        }
    }

    fn errors_of(req: &CollectionRequest) -> Vec<String> {
        match req.validate() {
            Err(CollectorError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_keywords_trims_and_dedupes_in_order() {
        assert_eq!(
            parse_keywords(" 중대재해, 산업재해 ,,중대재해, 건설사고 "),
            vec!["중대재해", "산업재해", "건설사고"]
        );
        assert!(parse_keywords(" , ,").is_empty());
    }

    #[test]
    fn test_valid_request_passes() {
        request().validate().unwrap();
    }

    #[test]
    fn test_collects_every_error() {
        let mut req = request();
        req.keywords.clear();
        req.start_date = date(2025, 12, 1);
        req.credentials = Credentials::default();
        let errors = errors_of(&req);
        assert_eq!(errors.len(), 4, "{errors:?}");
    }

    #[test]
    fn test_no_sources_enabled() {
        let mut req = request();
        req.sources = SourceSelection {
            news: false,
            video: false,
            comments: false,
        };
        let errors = errors_of(&req);
        assert_eq!(errors, vec!["select at least one source to collect"]);
    }

    #[test]
    fn test_comments_alone_need_youtube_key() {
        let mut req = request();
        req.sources = SourceSelection {
            news: false,
            video: false,
            comments: true,
        };
        req.credentials.youtube_api_key = Some("   ".to_string());
        let errors = errors_of(&req);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("YouTube"));
    }

    #[test]
    fn test_disabled_source_needs_no_credentials() {
        let mut req = request();
        req.sources.news = false;
        req.credentials.naver_client_id = None;
        req.validate().unwrap();
    }

    #[test]
    fn test_limits_must_be_in_range_and_step() {
        let mut req = request();
        req.limits.news_max = 1005;
        req.limits.video_max = 15;
        req.limits.comments_per_video = 600;
        assert_eq!(errors_of(&req).len(), 3);
    }

    #[test]
    fn test_total_steps() {
        let mut req = request();
        req.keywords = parse_keywords("a,b");
        assert_eq!(req.total_steps(), 6);
        req.sources.comments = false;
        assert_eq!(req.total_steps(), 4);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let printed = format!("{:?}", request().credentials);
        assert!(!printed.contains("secret\""));
        assert!(!printed.contains("\"key\""));
        assert!(printed.contains("<set>"));
    }
}

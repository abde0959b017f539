//! Command-line interface definitions for the collector.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials can also be provided via environment variables.

use chrono::{Duration, Local, NaiveDate};
use clap::Parser;

use crate::request::{
    CollectionRequest, Credentials, Limits, SourceSelection, parse_keywords,
};

/// Days covered when `--start` is not given.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Command-line arguments for a collection run.
///
/// # Examples
///
/// ```sh
/// # News and videos from the broadcaster channels, last 30 days
/// argos_collector -k "중대재해,산업재해"
///
/// # Only videos, all of YouTube, fixed window, with a JSON copy
/// argos_collector -k 중대재해 --no-news --no-comments --all-channels \
///     --start 2025-11-01 --end 2025-11-25 --json
///
/// # Check the configured keys and exit
/// argos_collector --validate-keys
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Comma-separated search keywords
    #[arg(short, long, default_value = "")]
    pub keywords: String,

    /// First publication day to collect (YYYY-MM-DD); defaults to 30 days ago
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last publication day to collect (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Skip news search
    #[arg(long)]
    pub no_news: bool,

    /// Skip video search
    #[arg(long)]
    pub no_video: bool,

    /// Skip video comments
    #[arg(long)]
    pub no_comments: bool,

    /// Max news items per keyword (10-1000, step 10)
    #[arg(long, default_value_t = 100)]
    pub news_max: u32,

    /// Max videos per keyword (10-200, step 10)
    #[arg(long, default_value_t = 50)]
    pub video_max: u32,

    /// Max comments per video (10-500, step 10)
    #[arg(long, default_value_t = 100)]
    pub comments_per_video: u32,

    /// Search all of YouTube instead of the major broadcaster channels
    #[arg(long)]
    pub all_channels: bool,

    /// Naver search API client id
    #[arg(long, env = "NAVER_CLIENT_ID", hide_env_values = true)]
    pub naver_client_id: Option<String>,

    /// Naver search API client secret
    #[arg(long, env = "NAVER_CLIENT_SECRET", hide_env_values = true)]
    pub naver_client_secret: Option<String>,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// Output directory for the export (overrides the settings file)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Also write the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Check the API keys and exit
    #[arg(long)]
    pub validate_keys: bool,
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            naver_client_id: self.naver_client_id.clone(),
            naver_client_secret: self.naver_client_secret.clone(),
            youtube_api_key: self.youtube_api_key.clone(),
        }
    }

    /// Build the collection request, filling the date window relative to `today`.
    pub fn to_request(&self, today: NaiveDate) -> CollectionRequest {
        CollectionRequest {
            keywords: parse_keywords(&self.keywords),
            start_date: self
                .start
                .unwrap_or(today - Duration::days(DEFAULT_WINDOW_DAYS)),
            end_date: self.end.unwrap_or(today),
            sources: SourceSelection {
                news: !self.no_news,
                video: !self.no_video,
                comments: !self.no_comments,
            },
            limits: Limits {
                news_max: self.news_max,
                video_max: self.video_max,
                comments_per_video: self.comments_per_video,
            },
            restrict_channels: !self.all_channels,
            credentials: self.credentials(),
        }
    }

    pub fn request_for_today(&self) -> CollectionRequest {
        self.to_request(Local::now().date_naive())
    }
}

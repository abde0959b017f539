//! Source adapters for the collection pipeline.
//!
//! Each adapter talks to one provider API and hands back typed rows plus
//! item-level [`Warning`](crate::models::Warning)s:
//!
//! | Source | Module | Endpoint | Notes |
//! |--------|--------|----------|-------|
//! | News | [`news`] | news search | Paged by 100, client-side day filter |
//! | Video | [`video`] | `search` + `videos` | Allow-list or open search, stats in batches of 50 |
//! | Comments | [`comments`] | `commentThreads` | First page per video |
//!
//! The collector only sees the [`Sources`] trait, so tests can drive it with
//! canned data instead of live clients.

pub mod comments;
pub mod news;
pub mod video;
pub mod youtube;

use crate::config::Settings;
use crate::error::{CollectorError, Result};
use crate::models::{Collected, CommentItem, KeyStatus, NewsItem, VideoItem};
use crate::request::{CollectionRequest, Credentials};

use news::NaverNewsClient;
use youtube::YouTubeClient;

/// The three collection steps run for each keyword.
#[allow(async_fn_in_trait)]
pub trait Sources {
    async fn news(&self, keyword: &str, request: &CollectionRequest) -> Result<Collected<NewsItem>>;

    async fn videos(&self, keyword: &str, request: &CollectionRequest) -> Result<Collected<VideoItem>>;

    async fn comments(
        &self,
        video_ids: &[String],
        request: &CollectionRequest,
    ) -> Result<Collected<CommentItem>>;
}

/// Live API clients; a client is only built when its credentials are present.
pub struct LiveSources {
    news: Option<NaverNewsClient>,
    youtube: Option<YouTubeClient>,
}

impl LiveSources {
    pub fn new(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let news = credentials
            .naver()
            .map(|(id, secret)| NaverNewsClient::new(settings, id, secret))
            .transpose()?;
        let youtube = credentials
            .youtube()
            .map(|key| YouTubeClient::new(settings, key))
            .transpose()?;
        Ok(Self { news, youtube })
    }

    fn news_client(&self) -> Result<&NaverNewsClient> {
        self.news.as_ref().ok_or(CollectorError::MissingCredential("news"))
    }

    fn youtube_client(&self) -> Result<&YouTubeClient> {
        self.youtube
            .as_ref()
            .ok_or(CollectorError::MissingCredential("YouTube"))
    }

    /// Probe every configured credential; unconfigured ones are reported as invalid.
    pub async fn validate_keys(&self) -> Vec<KeyStatus> {
        let news = match &self.news {
            Some(client) => client.probe().await,
            None => missing_key("naver"),
        };
        let youtube = match &self.youtube {
            Some(client) => client.probe().await,
            None => missing_key("youtube"),
        };
        vec![news, youtube]
    }
}

fn missing_key(source: &'static str) -> KeyStatus {
    KeyStatus {
        source,
        valid: false,
        message: CollectorError::MissingCredential(source).to_string(),
    }
}

impl Sources for LiveSources {
    async fn news(&self, keyword: &str, request: &CollectionRequest) -> Result<Collected<NewsItem>> {
        self.news_client()?
            .collect(
                keyword,
                request.start_date,
                request.end_date,
                request.limits.news_max,
            )
            .await
    }

    async fn videos(&self, keyword: &str, request: &CollectionRequest) -> Result<Collected<VideoItem>> {
        self.youtube_client()?
            .collect_videos(
                keyword,
                request.start_date,
                request.end_date,
                request.restrict_channels,
                request.limits.video_max,
            )
            .await
    }

    async fn comments(
        &self,
        video_ids: &[String],
        request: &CollectionRequest,
    ) -> Result<Collected<CommentItem>> {
        self.youtube_client()?
            .collect_comments(video_ids, request.limits.comments_per_video)
            .await
    }
}

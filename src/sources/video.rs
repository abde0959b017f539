//! YouTube video search with statistics enrichment.
//!
//! Two search modes:
//! - **restricted**: one search per broadcaster in [`BROADCAST_CHANNELS`],
//!   stopping once `max_results` videos are held
//! - **unrestricted**: a single search across all of YouTube
//!
//! Either way the hits are then enriched through `videos?part=statistics,snippet`
//! in batches of 50. A failed batch leaves its videos at zero counts.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::youtube::{BROADCAST_CHANNELS, YouTubeClient};
use crate::error::{CollectorError, Result};
use crate::models::{Collected, VideoItem, Warning};
use crate::utils::{clean_html, local_day_bounds_utc, to_local_time};

/// Provider cap on `maxResults` for `search`.
pub const SEARCH_PAGE_SIZE: usize = 50;
/// Provider cap on ids per `videos` call.
pub const STATS_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchList {
    #[serde(default)]
    items: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: SearchHitId,
    #[serde(default)]
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHitId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchSnippet {
    published_at: String,
    channel_id: String,
    channel_title: String,
    title: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    id: String,
    #[serde(default)]
    statistics: VideoStatistics,
    #[serde(default)]
    snippet: VideoSnippet,
}

/// Counts arrive as decimal strings (`"viewCount": "1234"`).
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<Value>,
    like_count: Option<Value>,
    comment_count: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoSnippet {
    tags: Vec<String>,
}

/// Read a statistics count that may be a string or a number; anything else is 0.
pub(crate) fn count_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

struct VideoStats {
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    tags: String,
}

impl From<VideoDetails> for VideoStats {
    fn from(details: VideoDetails) -> Self {
        Self {
            view_count: count_value(details.statistics.view_count.as_ref()),
            like_count: count_value(details.statistics.like_count.as_ref()),
            comment_count: count_value(details.statistics.comment_count.as_ref()),
            tags: details.snippet.tags.join(", "),
        }
    }
}

/// Build an un-enriched video row. `channel_name` overrides the snippet's
/// channel title (used for allow-list display names).
fn to_video(video_id: String, snippet: SearchSnippet, channel_name: Option<&str>) -> VideoItem {
    VideoItem {
        url: VideoItem::watch_url(&video_id),
        video_id,
        title: clean_html(&snippet.title),
        description: clean_html(&snippet.description),
        channel_name: channel_name
            .map(str::to_string)
            .unwrap_or(snippet.channel_title),
        channel_id: snippet.channel_id,
        published_at: to_local_time(&snippet.published_at),
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        tags: String::new(),
    }
}

impl YouTubeClient {
    /// Search videos for `query` published on local days `start..=end`.
    #[instrument(level = "info", skip_all, fields(%query, restrict_channels, max_results))]
    pub async fn collect_videos(
        &self,
        query: &str,
        start: NaiveDate,
        end: NaiveDate,
        restrict_channels: bool,
        max_results: u32,
    ) -> Result<Collected<VideoItem>> {
        let t0 = Instant::now();
        let (published_after, published_before) = local_day_bounds_utc(start, end);
        let max = max_results as usize;
        let page_size = SEARCH_PAGE_SIZE.min(max);
        let search_params = |channel_id: Option<&str>| {
            let mut params = vec![
                ("q", query.to_string()),
                ("part", "id,snippet".to_string()),
                ("type", "video".to_string()),
                ("publishedAfter", published_after.clone()),
                ("publishedBefore", published_before.clone()),
                ("maxResults", page_size.to_string()),
                ("order", "date".to_string()),
            ];
            if let Some(id) = channel_id {
                params.push(("channelId", id.to_string()));
            }
            params
        };

        let mut out = Collected::default();

        if restrict_channels {
            for channel in BROADCAST_CHANNELS {
                if out.records.len() >= max {
                    debug!("Reached max results; skipping remaining channels");
                    break;
                }
                match self
                    .get_json::<SearchList>("search", &search_params(Some(channel.id)))
                    .await
                {
                    Ok(list) => {
                        let before = out.records.len();
                        self.take_hits(list, Some(channel.name), max, &mut out);
                        debug!(channel = channel.name, found = out.records.len() - before, "Searched channel");
                        sleep(self.pace).await;
                    }
                    Err(CollectorError::QuotaExceeded) => return Err(CollectorError::QuotaExceeded),
                    Err(e) => {
                        warn!(channel = channel.name, error = %e, "Channel search failed; continuing");
                        out.warnings.push(Warning::new(channel.name, e.to_string()));
                    }
                }
            }
        } else {
            let list = self.get_json::<SearchList>("search", &search_params(None)).await?;
            self.take_hits(list, None, max, &mut out);
        }

        if !out.is_empty() {
            self.enrich(&mut out).await;
        }

        info!(
            collected = out.records.len(),
            warnings = out.warnings.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Collected videos"
        );
        Ok(out)
    }

    fn take_hits(
        &self,
        list: SearchList,
        channel_name: Option<&str>,
        max: usize,
        out: &mut Collected<VideoItem>,
    ) {
        for hit in list.items {
            if out.records.len() >= max {
                break;
            }
            match hit.id.video_id {
                Some(video_id) => out.records.push(to_video(video_id, hit.snippet, channel_name)),
                None => out.warnings.push(Warning::new(
                    channel_name.unwrap_or("search"),
                    format!("search hit without a video id: {:?}", hit.snippet.title),
                )),
            }
        }
    }

    /// Fill statistics and tags in place, 50 ids per call.
    async fn enrich(&self, out: &mut Collected<VideoItem>) {
        let ids: Vec<&str> = out.records.iter().map(|v| v.video_id.as_str()).collect();
        let mut stats: HashMap<String, VideoStats> = HashMap::new();
        let mut warnings = Vec::new();

        for (n, batch) in ids.chunks(STATS_BATCH_SIZE).enumerate() {
            let params = [
                ("part", "statistics,snippet".to_string()),
                ("id", batch.join(",")),
            ];
            match self.get_json::<VideoList>("videos", &params).await {
                Ok(list) => {
                    for details in list.items {
                        stats.insert(details.id.clone(), details.into());
                    }
                    sleep(self.pace).await;
                }
                Err(e) => {
                    warn!(batch = n + 1, size = batch.len(), error = %e, "Statistics batch failed; keeping defaults");
                    warnings.push(Warning::new(format!("statistics batch {}", n + 1), e.to_string()));
                }
            }
        }

        for video in &mut out.records {
            if let Some(s) = stats.remove(&video.video_id) {
                video.view_count = s.view_count;
                video.like_count = s.like_count;
                video.comment_count = s.comment_count;
                video.tags = s.tags;
            }
        }
        out.warnings.extend(warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::super::youtube::test_support::*;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn search_hits(prefix: &str, n: usize) -> Value {
        let items: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "id": { "kind": "youtube#video", "videoId": format!("{prefix}{i}") },
                    "snippet": {
                        "publishedAt": "2025-11-25T10:30:00Z",
                        "channelId": format!("UC{prefix}"),
                        "channelTitle": format!("Channel {prefix}"),
                        "title": "속보 &quot;현장&quot;",
                        "description": "<b>설명</b>"
                    }
                })
            })
            .collect();
        json!({ "items": items })
    }

    async fn mount_stats(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(api_path("videos")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": "a0",
                        "statistics": { "viewCount": "1200", "likeCount": "34", "commentCount": "5" },
                        "snippet": { "tags": ["뉴스", "속보"] }
                    }
                ]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_count_value_accepts_strings_and_numbers() {
        assert_eq!(count_value(Some(&json!("42"))), 42);
        assert_eq!(count_value(Some(&json!(7))), 7);
        assert_eq!(count_value(Some(&json!("n/a"))), 0);
        assert_eq!(count_value(None), 0);
    }

    #[tokio::test]
    async fn test_unrestricted_search_is_enriched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .and(query_param("q", "중대재해"))
            .and(query_param("publishedAfter", "2025-10-31T15:00:00Z"))
            .and(query_param("publishedBefore", "2025-11-25T14:59:59Z"))
            .and(query_param("maxResults", "20"))
            .and(query_param("order", "date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("a", 2)))
            .expect(1)
            .mount(&server)
            .await;
        mount_stats(&server).await;

        let out = client(&server)
            .collect_videos("중대재해", day(1), day(25), false, 20)
            .await
            .unwrap();

        assert_eq!(out.records.len(), 2);
        let first = &out.records[0];
        assert_eq!(first.video_id, "a0");
        assert_eq!(first.title, "속보 \"현장\"");
        assert_eq!(first.description, "설명");
        assert_eq!(first.channel_name, "Channel a");
        assert_eq!(first.published_at, "2025-11-25 19:30:00");
        assert_eq!(first.url, "https://www.youtube.com/watch?v=a0");
        assert_eq!((first.view_count, first.like_count, first.comment_count), (1200, 34, 5));
        assert_eq!(first.tags, "뉴스, 속보");
        // a1 is missing from the statistics response
        assert_eq!(out.records[1].view_count, 0);
        assert_eq!(out.records[1].tags, "");
    }

    #[tokio::test]
    async fn test_restricted_search_stops_at_max_mid_channel() {
        let server = MockServer::start().await;
        let first = BROADCAST_CHANNELS[0];
        let second = BROADCAST_CHANNELS[1];
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .and(query_param("channelId", first.id))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("a", 2)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .and(query_param("channelId", second.id))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("b", 2)))
            .expect(1)
            .mount(&server)
            .await;
        mount_stats(&server).await;

        let out = client(&server)
            .collect_videos("q", day(1), day(25), true, 3)
            .await
            .unwrap();

        let ids: Vec<&str> = out.records.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1", "b0"]);
        assert_eq!(out.records[0].channel_name, first.name);
        assert_eq!(out.records[2].channel_name, second.name);

        // two channel searches plus one statistics batch
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_restricted_channel_failure_is_a_warning() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .and(query_param("channelId", BROADCAST_CHANNELS[0].id))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .and(query_param("channelId", BROADCAST_CHANNELS[3].id))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("a", 1)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;
        mount_stats(&server).await;

        let out = client(&server)
            .collect_videos("q", day(1), day(25), true, 50)
            .await
            .unwrap();

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].channel_name, BROADCAST_CHANNELS[3].name);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].subject, BROADCAST_CHANNELS[0].name);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_fatal_in_restricted_mode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .and(query_param("channelId", BROADCAST_CHANNELS[0].id))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("a", 1)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(403).set_body_json(google_error(403, "quotaExceeded")))
            .mount(&server)
            .await;

        let err = client(&server)
            .collect_videos("q", day(1), day(25), true, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_unrestricted_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let err = client(&server)
            .collect_videos("q", day(1), day(25), false, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_failed_statistics_batch_keeps_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("a", 3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("videos")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let out = client(&server)
            .collect_videos("q", day(1), day(25), false, 50)
            .await
            .unwrap();

        assert_eq!(out.records.len(), 3);
        assert!(out.records.iter().all(|v| v.view_count == 0 && v.tags.is_empty()));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].subject, "statistics batch 1");
    }

    #[tokio::test]
    async fn test_statistics_are_batched_by_fifty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_hits("a", 50)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(api_path("videos")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let client = client(&server);
        let mut out = Collected::default();
        for i in 0..120 {
            out.records.push(to_video(format!("v{i}"), SearchSnippet::default(), None));
        }
        client.enrich(&mut out).await;

        let batches: Vec<usize> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path().ends_with("/videos"))
            .map(|r| {
                let (_, ids) = r.url.query_pairs().find(|(k, _)| k == "id").unwrap();
                ids.split(',').count()
            })
            .collect();
        assert_eq!(batches, vec![50, 50, 20]);
    }

    #[tokio::test]
    async fn test_no_hits_returns_empty_without_enrichment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(api_path("search")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let out = client(&server)
            .collect_videos("q", day(1), day(25), false, 50)
            .await
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}

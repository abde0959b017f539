//! Top-level comments for collected videos.
//!
//! Only the first `commentThreads` page is read per video, ordered by
//! relevance. Disabled comments and per-video failures become warnings;
//! an exhausted quota ends the step.

use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::video::count_value;
use super::youtube::YouTubeClient;
use crate::error::{CollectorError, Result};
use crate::models::{Collected, CommentItem, Warning};
use crate::utils::{clean_html, to_local_time};

/// Provider cap on `maxResults` for `commentThreads`.
pub const THREAD_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ThreadList {
    #[serde(default)]
    items: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
struct Thread {
    id: String,
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: String,
    text_display: String,
    like_count: Option<Value>,
    published_at: String,
    updated_at: String,
}

impl Thread {
    fn into_comment(self, video_id: &str) -> CommentItem {
        let s = self.snippet.top_level_comment.snippet;
        CommentItem {
            comment_id: self.id,
            video_id: video_id.to_string(),
            author: clean_html(&s.author_display_name),
            text: clean_html(&s.text_display),
            like_count: count_value(s.like_count.as_ref()),
            published_at: to_local_time(&s.published_at),
            updated_at: to_local_time(&s.updated_at),
        }
    }
}

impl YouTubeClient {
    /// Fetch up to `per_video` top-level comments for each of `video_ids`.
    #[instrument(level = "info", skip_all, fields(videos = video_ids.len(), per_video))]
    pub async fn collect_comments(
        &self,
        video_ids: &[String],
        per_video: u32,
    ) -> Result<Collected<CommentItem>> {
        let t0 = Instant::now();
        let page_size = THREAD_PAGE_SIZE.min(per_video).to_string();
        let mut out = Collected::default();

        for video_id in video_ids {
            let params = [
                ("part", "snippet".to_string()),
                ("videoId", video_id.clone()),
                ("maxResults", page_size.clone()),
                ("order", "relevance".to_string()),
                ("textFormat", "plainText".to_string()),
            ];
            match self.get_json::<ThreadList>("commentThreads", &params).await {
                Ok(list) => {
                    let before = out.records.len();
                    out.records
                        .extend(list.items.into_iter().map(|t| t.into_comment(video_id)));
                    debug!(%video_id, found = out.records.len() - before, "Fetched comments");
                }
                Err(CollectorError::QuotaExceeded) => return Err(CollectorError::QuotaExceeded),
                Err(CollectorError::CommentsDisabled) => {
                    debug!(%video_id, "Comments disabled");
                    out.warnings
                        .push(Warning::new(video_id.as_str(), CollectorError::CommentsDisabled.to_string()));
                }
                Err(e) => {
                    warn!(%video_id, error = %e, "Comment fetch failed; continuing");
                    out.warnings.push(Warning::new(video_id.as_str(), e.to_string()));
                }
            }
            sleep(self.pace).await;
        }

        info!(
            collected = out.records.len(),
            warnings = out.warnings.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Collected comments"
        );
        Ok(out)
    }
}

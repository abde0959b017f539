//! Collection orchestration across keywords and sources.
//!
//! Keywords run one after another. Each keyword goes through
//! `news → video → comments`, skipping the sources that are turned off.
//! Comments need the video ids of the same keyword, so the comment step is
//! skipped when the video step did not run or found nothing.
//!
//! A failing step never stops the run: its error becomes a
//! [`StepOutcome::Failed`] event and collection moves on. All run state lives
//! in a [`CollectionContext`] that is threaded through every keyword.

use std::fmt;
use std::time::Instant;
use tracing::{Level, info, instrument};

use crate::error::Result;
use crate::models::{Collected, KeywordRunStats, Record, Source};
use crate::request::CollectionRequest;
use crate::sources::Sources;

/// What happened in one step (or to one item inside it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Collected { count: usize },
    Warning { message: String },
    Failed { message: String },
    Skipped { reason: String },
}

impl StepOutcome {
    /// Log severity for the event. Skipped steps lose data, so they warn.
    pub fn level(&self) -> Level {
        match self {
            StepOutcome::Collected { .. } => Level::INFO,
            StepOutcome::Warning { .. } | StepOutcome::Skipped { .. } => Level::WARN,
            StepOutcome::Failed { .. } => Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    pub keyword: String,
    pub source: Source,
    pub outcome: StepOutcome,
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.keyword, self.source)?;
        match &self.outcome {
            StepOutcome::Collected { count } => write!(f, "collected {count}"),
            StepOutcome::Warning { message } => write!(f, "warning: {message}"),
            StepOutcome::Failed { message } => write!(f, "failed: {message}"),
            StepOutcome::Skipped { reason } => write!(f, "skipped ({reason})"),
        }
    }
}

/// Receives progress after every step, including skipped and failed ones.
pub trait ProgressReporter {
    fn step_finished(&mut self, keyword: &str, source: Source, completed: usize, total: usize);
}

/// Reports progress as a log line per step.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn step_finished(&mut self, keyword: &str, source: Source, completed: usize, total: usize) {
        let percent = if total == 0 { 100 } else { completed * 100 / total };
        info!(keyword, %source, completed, total, percent, "Step finished");
    }
}

/// Mutable state of one collection run.
#[derive(Debug, Default)]
pub struct CollectionContext {
    /// One table per successful step, in collection order.
    pub tables: Vec<Vec<Record>>,
    /// Raw counts before dedup.
    pub stats: KeywordRunStats,
    pub events: Vec<StepEvent>,
    pub completed_steps: usize,
    pub total_steps: usize,
}

impl CollectionContext {
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            ..Self::default()
        }
    }

    fn push_event(&mut self, keyword: &str, source: Source, outcome: StepOutcome) {
        self.events.push(StepEvent {
            keyword: keyword.to_string(),
            source,
            outcome,
        });
    }

    /// Fold a step's result into the run: rows, stats and events.
    fn record_step<T: Into<Record>>(&mut self, keyword: &str, source: Source, result: Result<Collected<T>>) {
        match result {
            Ok(collected) => {
                for warning in collected.warnings {
                    self.push_event(
                        keyword,
                        source,
                        StepOutcome::Warning {
                            message: warning.to_string(),
                        },
                    );
                }
                let count = collected.records.len();
                self.stats.add(source, count);
                self.push_event(keyword, source, StepOutcome::Collected { count });
                if count > 0 {
                    self.tables
                        .push(collected.records.into_iter().map(Into::into).collect());
                }
            }
            Err(e) => {
                self.push_event(
                    keyword,
                    source,
                    StepOutcome::Failed {
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    fn finish_step(&mut self, keyword: &str, source: Source, progress: &mut impl ProgressReporter) {
        self.completed_steps += 1;
        progress.step_finished(keyword, source, self.completed_steps, self.total_steps);
    }

    pub fn failed_steps(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.outcome, StepOutcome::Failed { .. }))
            .count()
    }
}

/// Run every keyword of `request` against `sources`.
#[instrument(level = "info", skip_all, fields(keywords = request.keywords.len(), total_steps = request.total_steps()))]
pub async fn collect<S, P>(sources: &S, request: &CollectionRequest, progress: &mut P) -> CollectionContext
where
    S: Sources,
    P: ProgressReporter,
{
    let t0 = Instant::now();
    let mut ctx = CollectionContext::new(request.total_steps());
    for keyword in &request.keywords {
        ctx = run_keyword(ctx, sources, request, keyword, progress).await;
    }
    info!(
        steps = ctx.completed_steps,
        failed = ctx.failed_steps(),
        tables = ctx.tables.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "Collection finished"
    );
    ctx
}

async fn run_keyword<S, P>(
    mut ctx: CollectionContext,
    sources: &S,
    request: &CollectionRequest,
    keyword: &str,
    progress: &mut P,
) -> CollectionContext
where
    S: Sources,
    P: ProgressReporter,
{
    if request.sources.news {
        let result = sources.news(keyword, request).await;
        ctx.record_step(keyword, Source::News, result);
        ctx.finish_step(keyword, Source::News, progress);
    }

    let mut video_ids = Vec::new();
    if request.sources.video {
        let result = sources.videos(keyword, request).await;
        if let Ok(collected) = &result {
            video_ids = collected.records.iter().map(|v| v.video_id.clone()).collect();
        }
        ctx.record_step(keyword, Source::Video, result);
        ctx.finish_step(keyword, Source::Video, progress);
    }

    if request.sources.comments {
        if video_ids.is_empty() {
            let reason = if request.sources.video {
                "no videos collected for this keyword"
            } else {
                "video collection is turned off"
            };
            ctx.push_event(
                keyword,
                Source::Comments,
                StepOutcome::Skipped {
                    reason: reason.to_string(),
                },
            );
        } else {
            let result = sources.comments(&video_ids, request).await;
            ctx.record_step(keyword, Source::Comments, result);
        }
        ctx.finish_step(keyword, Source::Comments, progress);
    }

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectorError;
    use crate::models::{CommentItem, NewsItem, VideoItem, Warning};
    use crate::request::{Credentials, Limits, SourceSelection};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn news(link: &str) -> NewsItem {
        NewsItem {
            title: link.to_string(),
            description: String::new(),
            link: link.to_string(),
            original_link: link.to_string(),
            published_at: "2025-11-25 09:00:00".to_string(),
            source: None,
            author: None,
        }
    }

    fn video(id: &str) -> VideoItem {
        VideoItem {
            video_id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            channel_name: "YTN".to_string(),
            channel_id: "UC".to_string(),
            published_at: "2025-11-25 19:30:00".to_string(),
            url: VideoItem::watch_url(id),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            tags: String::new(),
        }
    }

    fn comment(video_id: &str, n: usize) -> CommentItem {
        CommentItem {
            comment_id: format!("{video_id}-c{n}"),
            video_id: video_id.to_string(),
            author: "a".to_string(),
            text: "t".to_string(),
            like_count: 0,
            published_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// Canned sources keyed by keyword; a keyword listed in `failing_news`
    /// makes the news step fail.
    #[derive(Default)]
    struct FakeSources {
        news: HashMap<String, Vec<NewsItem>>,
        videos: HashMap<String, Vec<VideoItem>>,
        failing_news: Vec<String>,
        calls: RefCell<Vec<String>>,
    }

    impl Sources for FakeSources {
        async fn news(&self, keyword: &str, _: &CollectionRequest) -> Result<Collected<NewsItem>> {
            self.calls.borrow_mut().push(format!("news:{keyword}"));
            if self.failing_news.iter().any(|k| k == keyword) {
                return Err(CollectorError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(Collected {
                records: self.news.get(keyword).cloned().unwrap_or_default(),
                warnings: vec![Warning::new("item", "bad date")],
            })
        }

        async fn videos(&self, keyword: &str, _: &CollectionRequest) -> Result<Collected<VideoItem>> {
            self.calls.borrow_mut().push(format!("videos:{keyword}"));
            Ok(Collected {
                records: self.videos.get(keyword).cloned().unwrap_or_default(),
                warnings: Vec::new(),
            })
        }

        async fn comments(&self, video_ids: &[String], _: &CollectionRequest) -> Result<Collected<CommentItem>> {
            self.calls.borrow_mut().push(format!("comments:{}", video_ids.join(",")));
            Ok(Collected {
                records: video_ids.iter().map(|id| comment(id, 0)).collect(),
                warnings: Vec::new(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingProgress(Vec<(String, Source, usize, usize)>);

    impl ProgressReporter for RecordingProgress {
        fn step_finished(&mut self, keyword: &str, source: Source, completed: usize, total: usize) {
            self.0.push((keyword.to_string(), source, completed, total));
        }
    }

    fn request(keywords: &[&str]) -> CollectionRequest {
        CollectionRequest {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            start_date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 11, 25).unwrap(),
            sources: SourceSelection {
                news: true,
                video: true,
                comments: true,
            },
            limits: Limits::default(),
            restrict_channels: true,
            credentials: Credentials::default(),
        }
    }

    #[tokio::test]
    async fn test_steps_run_in_order_per_keyword() {
        let sources = FakeSources {
            videos: HashMap::from([("a".to_string(), vec![video("v1"), video("v2")])]),
            ..FakeSources::default()
        };
        let mut progress = RecordingProgress::default();
        collect(&sources, &request(&["a", "b"]), &mut progress).await;

        assert_eq!(
            *sources.calls.borrow(),
            vec!["news:a", "videos:a", "comments:v1,v2", "news:b", "videos:b"]
        );
        let steps: Vec<usize> = progress.0.iter().map(|p| p.2).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
        assert!(progress.0.iter().all(|p| p.3 == 6));
    }

    #[tokio::test]
    async fn test_zero_videos_skips_comments() {
        let sources = FakeSources::default();
        let mut progress = RecordingProgress::default();
        let ctx = collect(&sources, &request(&["a"]), &mut progress).await;

        assert!(!ctx.stats.contains(Source::Comments));
        assert_eq!(ctx.stats.get(Source::Comments), 0);
        assert!(ctx.events.iter().any(|e| e.source == Source::Comments
            && matches!(e.outcome, StepOutcome::Skipped { .. })));
        assert_eq!(ctx.completed_steps, 3);
        assert!(!sources.calls.borrow().iter().any(|c| c.starts_with("comments")));
    }

    #[tokio::test]
    async fn test_comments_without_video_step_are_skipped() {
        let sources = FakeSources::default();
        let mut req = request(&["a"]);
        req.sources.video = false;
        let ctx = collect(&sources, &req, &mut LogProgress).await;

        assert_eq!(ctx.total_steps, 2);
        assert_eq!(ctx.completed_steps, 2);
        let skipped = ctx.events.last().unwrap();
        assert_eq!(
            skipped.outcome,
            StepOutcome::Skipped {
                reason: "video collection is turned off".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_stats_accumulate_across_keywords() {
        let sources = FakeSources {
            news: HashMap::from([
                ("a".to_string(), (0..5).map(|i| news(&format!("a{i}"))).collect()),
                ("b".to_string(), (0..5).map(|i| news(&format!("b{i}"))).collect()),
            ]),
            ..FakeSources::default()
        };
        let ctx = collect(&sources, &request(&["a", "b"]), &mut LogProgress).await;

        assert_eq!(ctx.stats.get(Source::News), 10);
        assert_eq!(ctx.stats.get(Source::Video), 0);
        assert!(ctx.stats.contains(Source::Video));
        assert_eq!(ctx.tables.len(), 2);
        assert_eq!(ctx.tables.iter().map(Vec::len).sum::<usize>(), 10);
    }

    #[tokio::test]
    async fn test_failed_step_does_not_stop_the_run() {
        let sources = FakeSources {
            news: HashMap::from([("b".to_string(), vec![news("b0")])]),
            videos: HashMap::from([("a".to_string(), vec![video("v1")])]),
            failing_news: vec!["a".to_string()],
            ..FakeSources::default()
        };
        let ctx = collect(&sources, &request(&["a", "b"]), &mut LogProgress).await;

        assert_eq!(ctx.failed_steps(), 1);
        let failed = ctx
            .events
            .iter()
            .find(|e| matches!(e.outcome, StepOutcome::Failed { .. }))
            .unwrap();
        assert_eq!(failed.keyword, "a");
        assert_eq!(failed.source, Source::News);
        assert_eq!(ctx.stats.get(Source::News), 1);
        assert_eq!(ctx.stats.get(Source::Video), 1);
        assert_eq!(ctx.stats.get(Source::Comments), 1);
        assert_eq!(ctx.completed_steps, 6);
    }

    #[tokio::test]
    async fn test_adapter_warnings_become_events() {
        let sources = FakeSources::default();
        let mut req = request(&["a"]);
        req.sources.video = false;
        req.sources.comments = false;
        let ctx = collect(&sources, &req, &mut LogProgress).await;

        assert_eq!(ctx.events.len(), 2);
        assert_eq!(ctx.events[0].to_string(), "[a] news: warning: item: bad date");
        assert_eq!(ctx.events[1].to_string(), "[a] news: collected 0");
    }

    #[tokio::test]
    async fn test_warnings_and_records_from_one_step_are_both_kept() {
        let sources = FakeSources {
            news: HashMap::from([("a".to_string(), vec![news("n1"), news("n2")])]),
            ..FakeSources::default()
        };
        let mut req = request(&["a"]);
        req.sources.video = false;
        req.sources.comments = false;
        let ctx = collect(&sources, &req, &mut LogProgress).await;

        assert_eq!(ctx.events.len(), 2);
        assert!(matches!(ctx.events[0].outcome, StepOutcome::Warning { .. }));
        assert_eq!(ctx.events[1].outcome, StepOutcome::Collected { count: 2 });
        assert_eq!(ctx.stats.get(Source::News), 2);
        assert_eq!(ctx.tables, vec![vec![Record::from(news("n1")), Record::from(news("n2"))]]);
    }

    #[test]
    fn test_outcome_levels() {
        let skipped = StepOutcome::Skipped {
            reason: "no videos".to_string(),
        };
        let warning = StepOutcome::Warning {
            message: "bad date".to_string(),
        };
        let failed = StepOutcome::Failed {
            message: "boom".to_string(),
        };
        assert_eq!(StepOutcome::Collected { count: 3 }.level(), Level::INFO);
        assert_eq!(skipped.level(), Level::WARN);
        assert_eq!(warning.level(), Level::WARN);
        assert_eq!(failed.level(), Level::ERROR);
    }
}

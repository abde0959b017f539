//! Data models for collected records and run bookkeeping.
//!
//! - [`Record`]: one collected row, tagged by kind (`news_item`, `video_item`,
//!   `comment_item`)
//! - [`RecordKind`]: per-kind constants (natural key, sheet name, columns)
//! - [`Source`]: the three collection steps a keyword goes through
//! - [`KeywordRunStats`]: raw, pre-dedup counts accumulated across keywords
//! - [`CollectionResult`]: the deduplicated table plus final per-kind counts
//! - [`Collected`]: what a source adapter hands back (rows + warnings)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A news article from the news search API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    /// Natural key.
    pub link: String,
    pub original_link: String,
    /// Publisher wall-clock time, `YYYY-MM-DD HH:MM:SS`.
    pub published_at: String,
    /// Not provided by the API; always `None`.
    pub source: Option<String>,
    /// Not provided by the API; always `None`.
    pub author: Option<String>,
}

/// A video from the video search API, enriched with statistics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VideoItem {
    /// Natural key.
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub channel_id: String,
    pub published_at: String,
    pub url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Comma-joined tag list; empty when the video has none or enrichment failed.
    pub tags: String,
}

impl VideoItem {
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={video_id}")
    }
}

/// A top-level comment on a collected video.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommentItem {
    /// Natural key.
    pub comment_id: String,
    /// The video this comment belongs to (not enforced after dedup).
    pub video_id: String,
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: String,
    pub updated_at: String,
}

/// Kind tag of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    NewsItem,
    VideoItem,
    CommentItem,
}

impl RecordKind {
    /// All kinds, in merge and export order.
    pub const ALL: [RecordKind; 3] = [
        RecordKind::NewsItem,
        RecordKind::VideoItem,
        RecordKind::CommentItem,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            RecordKind::NewsItem => "news_item",
            RecordKind::VideoItem => "video_item",
            RecordKind::CommentItem => "comment_item",
        }
    }

    /// Name of the field whose value identifies "the same record".
    pub fn natural_key_field(self) -> &'static str {
        match self {
            RecordKind::NewsItem => "link",
            RecordKind::VideoItem => "video_id",
            RecordKind::CommentItem => "comment_id",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            RecordKind::NewsItem => "news",
            RecordKind::VideoItem => "video",
            RecordKind::CommentItem => "comment",
        }
    }

    /// Columns exported for this kind, in sheet order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            RecordKind::NewsItem => &["title", "description", "link", "original_link", "published_at"],
            RecordKind::VideoItem => &[
                "title",
                "description",
                "channel_name",
                "published_at",
                "view_count",
                "like_count",
                "comment_count",
                "tags",
                "url",
                "video_id",
            ],
            RecordKind::CommentItem => &["video_id", "author", "text", "like_count", "published_at"],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One exported spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(u64),
}

impl Cell<'_> {
    /// Length of the cell as displayed, used for column sizing.
    pub fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
        }
    }
}

/// A collected row of any kind.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    NewsItem(NewsItem),
    VideoItem(VideoItem),
    CommentItem(CommentItem),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::NewsItem(_) => RecordKind::NewsItem,
            Record::VideoItem(_) => RecordKind::VideoItem,
            Record::CommentItem(_) => RecordKind::CommentItem,
        }
    }

    /// Value of this record's natural key.
    pub fn natural_key(&self) -> &str {
        match self {
            Record::NewsItem(n) => &n.link,
            Record::VideoItem(v) => &v.video_id,
            Record::CommentItem(c) => &c.comment_id,
        }
    }

    /// Export cells, matching [`RecordKind::columns`] one to one.
    pub fn cells(&self) -> Vec<Cell<'_>> {
        match self {
            Record::NewsItem(n) => vec![
                Cell::Text(&n.title),
                Cell::Text(&n.description),
                Cell::Text(&n.link),
                Cell::Text(&n.original_link),
                Cell::Text(&n.published_at),
            ],
            Record::VideoItem(v) => vec![
                Cell::Text(&v.title),
                Cell::Text(&v.description),
                Cell::Text(&v.channel_name),
                Cell::Text(&v.published_at),
                Cell::Number(v.view_count),
                Cell::Number(v.like_count),
                Cell::Number(v.comment_count),
                Cell::Text(&v.tags),
                Cell::Text(&v.url),
                Cell::Text(&v.video_id),
            ],
            Record::CommentItem(c) => vec![
                Cell::Text(&c.video_id),
                Cell::Text(&c.author),
                Cell::Text(&c.text),
                Cell::Number(c.like_count),
                Cell::Text(&c.published_at),
            ],
        }
    }
}

impl From<NewsItem> for Record {
    fn from(item: NewsItem) -> Self {
        Record::NewsItem(item)
    }
}

impl From<VideoItem> for Record {
    fn from(item: VideoItem) -> Self {
        Record::VideoItem(item)
    }
}

impl From<CommentItem> for Record {
    fn from(item: CommentItem) -> Self {
        Record::CommentItem(item)
    }
}

/// A collection step run for each keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    News,
    Video,
    Comments,
}

impl Source {
    /// All sources, in per-keyword step order.
    pub const ALL: [Source; 3] = [Source::News, Source::Video, Source::Comments];

    pub fn name(self) -> &'static str {
        match self {
            Source::News => "news",
            Source::Video => "video",
            Source::Comments => "comments",
        }
    }

    pub fn record_kind(self) -> RecordKind {
        match self {
            Source::News => RecordKind::NewsItem,
            Source::Video => RecordKind::VideoItem,
            Source::Comments => RecordKind::CommentItem,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw per-source counts, summed across keywords before dedup.
///
/// A source only gets an entry once one of its steps succeeds; skipped or
/// failed steps leave it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordRunStats {
    counts: BTreeMap<Source, usize>,
}

impl KeywordRunStats {
    pub fn add(&mut self, source: Source, count: usize) {
        *self.counts.entry(source).or_insert(0) += count;
    }

    pub fn get(&self, source: Source) -> usize {
        self.counts.get(&source).copied().unwrap_or(0)
    }

    pub fn contains(&self, source: Source) -> bool {
        self.counts.contains_key(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Source, usize)> + '_ {
        self.counts.iter().map(|(s, n)| (*s, *n))
    }
}

/// The deduplicated table and its per-kind counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionResult {
    pub records: Vec<Record>,
    /// Post-dedup counts; every kind is present, zero when absent.
    pub counts: BTreeMap<RecordKind, usize>,
}

impl CollectionResult {
    pub fn count(&self, kind: RecordKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Rows of one kind, in table order.
    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter().filter(move |r| r.kind() == kind)
    }
}

/// Item-level problem an adapter skipped past.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// What was skipped: a channel name, a video id, a batch, an item link.
    pub subject: String,
    pub message: String,
}

impl Warning {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Output of one adapter call: typed rows plus everything it skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub records: Vec<T>,
    pub warnings: Vec<Warning>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> Collected<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of an API-key probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub source: &'static str,
    pub valid: bool,
    pub message: String,
}

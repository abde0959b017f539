//! Text and time helpers shared by the source adapters and outputs.
//!
//! - HTML tag stripping and entity decoding for API free text
//! - UTC to local (UTC+9) timestamp normalization
//! - Local calendar day to UTC search-window conversion
//! - Log-friendly truncation and output directory checks

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Offset of local time from UTC, in hours.
pub const LOCAL_OFFSET_HOURS: i64 = 9;

/// Output format of every normalized timestamp.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

const ENTITIES: [(&str, &str); 6] = [
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", " "),
];

/// Strip markup and decode the handful of entities the search APIs emit.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_html("<b>Hi</b> &amp; bye"), "Hi & bye");
/// assert_eq!(clean_html(""), "");
/// ```
pub fn clean_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = TAG_RE.replace_all(text, "").into_owned();
    for (entity, literal) in ENTITIES {
        out = out.replace(entity, literal);
    }
    out.trim().to_string()
}

/// Convert an API timestamp (`2025-11-25T10:30:00Z`, `...+00:00`, or naive
/// UTC) to local wall-clock time in [`LOCAL_TIME_FORMAT`].
///
/// Input that cannot be parsed is returned unchanged, so callers must not
/// assume the output is always normalized.
pub fn to_local_time(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let utc = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.naive_utc(),
        Err(_) => match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => naive,
            Err(e) => {
                debug!(raw, error = %e, "Unparseable timestamp; passing through");
                return raw.to_string();
            }
        },
    };
    (utc + Duration::hours(LOCAL_OFFSET_HOURS))
        .format(LOCAL_TIME_FORMAT)
        .to_string()
}

/// UTC boundaries covering the local calendar days `start..=end`, formatted
/// for YouTube's `publishedAfter` / `publishedBefore` parameters.
pub fn local_day_bounds_utc(start: NaiveDate, end: NaiveDate) -> (String, String) {
    let first = start.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
    let last = end.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default());
    let shift = Duration::hours(LOCAL_OFFSET_HOURS);
    (
        (first - shift).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        (last - shift).format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    )
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters and get a `"…(+N bytes)"`
/// suffix. Cuts always land on a character boundary.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<()> {
    fs::create_dir_all(path).await?;
    // creating the dir is not enough on read-only mounts
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_tags_and_entities() {
        assert_eq!(clean_html("<b>Hi</b> &amp; bye"), "Hi & bye");
        assert_eq!(
            clean_html("  &quot;quoted&quot; &lt;tag&gt;&nbsp;it&#39;s  "),
            "\"quoted\" <tag> it's"
        );
    }

    #[test]
    fn test_clean_html_empty() {
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("   "), "");
    }

    #[test]
    fn test_clean_html_keeps_korean_text() {
        assert_eq!(clean_html("<b>중대재해</b> 처벌법"), "중대재해 처벌법");
    }

    #[test]
    fn test_to_local_time_shifts_nine_hours() {
        assert_eq!(to_local_time("2025-11-25T10:30:00Z"), "2025-11-25 19:30:00");
    }

    #[test]
    fn test_to_local_time_crosses_midnight() {
        assert_eq!(to_local_time("2025-12-31T20:00:00Z"), "2026-01-01 05:00:00");
    }

    #[test]
    fn test_to_local_time_honours_explicit_offset() {
        assert_eq!(to_local_time("2025-11-25T10:30:00+00:00"), "2025-11-25 19:30:00");
        assert_eq!(to_local_time("2025-11-25T19:30:00+09:00"), "2025-11-25 19:30:00");
    }

    #[test]
    fn test_to_local_time_fractional_and_naive() {
        assert_eq!(to_local_time("2025-11-25T10:30:00.123Z"), "2025-11-25 19:30:00");
        assert_eq!(to_local_time("2025-11-25T10:30:00"), "2025-11-25 19:30:00");
    }

    #[test]
    fn test_to_local_time_passes_garbage_through() {
        assert_eq!(to_local_time("not-a-date"), "not-a-date");
        assert_eq!(to_local_time(""), "");
    }

    #[test]
    fn test_local_day_bounds_utc() {
        let start = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 11, 25).unwrap();
        let (after, before) = local_day_bounds_utc(start, end);
        assert_eq!(after, "2025-10-31T15:00:00Z");
        assert_eq!(before, "2025-11-25T14:59:59Z");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("가나다라", 2);
        assert_eq!(result, "가나…(+6 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
    }
}

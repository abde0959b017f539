//! Plain-text run summary for the terminal.
//!
//! ```text
//! news      collected   120  kept   114
//! video     collected    48  kept    46
//! comments  collected   310  kept   306
//! removed duplicates: 12
//!
//! news_item     ████████████████████████                  114
//! video_item    ██████████                                 46
//! comment_item  ████████████████████████████████████████  306
//! ```

use std::fmt::Write;

use crate::models::{CollectionResult, KeywordRunStats, RecordKind, Source};

/// Width of the longest bar, in characters.
pub const BAR_WIDTH: usize = 40;

/// One line per record kind, bars scaled to the largest count.
pub fn bar_chart(result: &CollectionResult) -> String {
    let max = RecordKind::ALL
        .iter()
        .map(|k| result.count(*k))
        .max()
        .unwrap_or(0);
    let label_width = RecordKind::ALL.iter().map(|k| k.tag().len()).max().unwrap_or(0);
    let digits = max.to_string().len();

    let mut out = String::new();
    for kind in RecordKind::ALL {
        let count = result.count(kind);
        let len = if max == 0 { 0 } else { (count * BAR_WIDTH).div_ceil(max) };
        let _ = writeln!(
            out,
            "{:<label_width$}  {:<BAR_WIDTH$}  {:>digits$}",
            kind.tag(),
            "█".repeat(len),
            count,
        );
    }
    out
}

/// Raw and kept counts per source that ran, dedup removals and the chart.
pub fn render(result: &CollectionResult, stats: &KeywordRunStats, removed: usize) -> String {
    let mut out = String::new();
    for source in Source::ALL.into_iter().filter(|s| stats.contains(*s)) {
        let _ = writeln!(
            out,
            "{:<9} collected {:>5}  kept {:>5}",
            source.name(),
            stats.get(source),
            result.count(source.record_kind()),
        );
    }
    let _ = writeln!(out, "removed duplicates: {removed}");
    let _ = writeln!(out, "total rows: {}", result.records.len());
    out.push('\n');
    out.push_str(&bar_chart(result));
    out
}

//! Merge per-step tables into one deduplicated [`CollectionResult`].
//!
//! Rows are grouped by kind (news, video, comment) and the first occurrence
//! of each natural key wins. Merging an already merged table changes nothing.

use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::models::{CollectionResult, Record, RecordKind};

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub result: CollectionResult,
    /// Rows dropped as duplicates.
    pub removed: usize,
}

/// Concatenate `tables` in order and drop duplicate natural keys per kind.
///
/// Returns `None` when there is nothing to merge.
#[instrument(level = "info", skip_all, fields(tables = tables.len()))]
pub fn merge_and_dedup(tables: Vec<Vec<Record>>) -> Option<MergeOutcome> {
    let combined: Vec<Record> = tables.into_iter().flatten().collect();
    if combined.is_empty() {
        return None;
    }
    let input = combined.len();

    let mut partitions: BTreeMap<RecordKind, Vec<Record>> =
        RecordKind::ALL.iter().map(|k| (*k, Vec::new())).collect();
    for record in combined {
        partitions.entry(record.kind()).or_default().push(record);
    }

    let mut records = Vec::with_capacity(input);
    let mut counts = BTreeMap::new();
    for kind in RecordKind::ALL {
        let rows = partitions.remove(&kind).unwrap_or_default();
        let before = records.len();
        let rows_in = rows.len();
        records.extend(rows.into_iter().unique_by(|r| r.natural_key().to_string()));
        let kept = records.len() - before;
        if kept < rows_in {
            debug!(%kind, key = kind.natural_key_field(), kept, dropped = rows_in - kept, "Dropped duplicates");
        }
        counts.insert(kind, kept);
    }

    let removed = input - records.len();
    info!(
        input,
        output = records.len(),
        removed,
        news = counts[&RecordKind::NewsItem],
        video = counts[&RecordKind::VideoItem],
        comment = counts[&RecordKind::CommentItem],
        "Merged collected tables"
    );
    Some(MergeOutcome {
        result: CollectionResult { records, counts },
        removed,
    })
}

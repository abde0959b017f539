//! JSON export of a [`CollectionResult`].
//!
//! Written next to the spreadsheet when `--json` is given, sharing its
//! timestamp:
//!
//! ```text
//! output_dir/
//! ├── collection_20251125_090507.xlsx
//! └── collection_20251125_090507.json
//! ```
//!
//! Every row carries a `type` tag (`news_item`, `video_item`, `comment_item`).

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{CollectionResult, KeywordRunStats, Record, RecordKind, Source};

#[derive(Debug, Serialize)]
struct JsonExport<'a> {
    keywords: &'a [String],
    /// Raw counts per source, before dedup.
    collected: BTreeMap<Source, usize>,
    /// Final counts per record kind.
    counts: &'a BTreeMap<RecordKind, usize>,
    records: &'a [Record],
}

/// Write `result` as pretty JSON to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_result(
    result: &CollectionResult,
    keywords: &[String],
    stats: &KeywordRunStats,
    path: &Path,
) -> Result<PathBuf> {
    let export = JsonExport {
        keywords,
        collected: stats.iter().collect(),
        counts: &result.counts,
        records: &result.records,
    };
    let json = serde_json::to_string_pretty(&export)?;

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(records = result.records.len(), "Wrote JSON export");
    Ok(path.to_path_buf())
}

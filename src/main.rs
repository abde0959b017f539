//! # Argos Collector
//!
//! Keyword-driven collection of Korean news articles, YouTube videos and
//! their comments, merged into one deduplicated spreadsheet.
//!
//! ## Features
//!
//! - Searches the Naver news API, paging up to 1000 results per keyword
//! - Searches YouTube videos, either on ten major broadcaster channels or
//!   across the whole site, and enriches them with view/like/comment counts
//! - Fetches top-level comments for every collected video
//! - Deduplicates across keywords and exports an `.xlsx` workbook (plus an
//!   optional JSON copy)
//!
//! ## Usage
//!
//! ```sh
//! NAVER_CLIENT_ID=... NAVER_CLIENT_SECRET=... YOUTUBE_API_KEY=... \
//!     argos_collector -k "중대재해,산업재해" -o ./output
//! ```
//!
//! ## Architecture
//!
//! 1. **Validation**: every input problem is reported before any request
//! 2. **Collection**: keywords run sequentially through news, video and comments
//! 3. **Merge**: rows are grouped by kind and deduplicated on their natural key
//! 4. **Output**: spreadsheet, optional JSON, and a summary on stdout

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{Level, debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collector;
mod config;
mod error;
mod merge;
mod models;
mod outputs;
mod request;
mod retry;
mod sources;
mod utils;

use cli::Cli;
use collector::LogProgress;
use config::Settings;
use merge::merge_and_dedup;
use outputs::{json, summary, xlsx};
use sources::LiveSources;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("argos_collector starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(keywords = %args.keywords, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?;
    let sources = LiveSources::new(&settings, &args.credentials())?;

    // ---- Key check only ----
    if args.validate_keys {
        let statuses = sources.validate_keys().await;
        for status in &statuses {
            let mark = if status.valid { "ok" } else { "FAIL" };
            println!("[{mark}] {}: {}", status.source, status.message);
        }
        if statuses.iter().all(|s| s.valid) {
            return Ok(());
        }
        return Err("one or more API keys failed validation".into());
    }

    // ---- Validate request ----
    let request = args.request_for_today();
    if let Err(e) = request.validate() {
        error!(error = %e, "Invalid collection request");
        return Err(e.into());
    }
    info!(
        keywords = ?request.keywords,
        start = %request.start_date,
        end = %request.end_date,
        sources = ?request.sources,
        limits = ?request.limits,
        restrict_channels = request.restrict_channels,
        "Collection request accepted"
    );

    let output_dir = args.output_dir.clone().unwrap_or(settings.output_dir.clone());
    if let Err(e) = ensure_writable_dir(&output_dir).await {
        error!(
            path = %output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Collect ----
    let ctx = collector::collect(&sources, &request, &mut LogProgress).await;
    for event in &ctx.events {
        match event.outcome.level() {
            Level::ERROR => error!(%event, "Step event"),
            Level::WARN => warn!(%event, "Step event"),
            _ => info!(%event, "Step event"),
        }
    }
    let failed_steps = ctx.failed_steps();
    let stats = ctx.stats;

    // ---- Merge ----
    let Some(outcome) = merge_and_dedup(ctx.tables) else {
        warn!(failed_steps, "No data collected");
        println!("No data collected.");
        return Ok(());
    };

    // ---- Output ----
    let xlsx_path = xlsx::write_workbook(&outcome.result, Path::new(&output_dir)).await?;
    println!("Saved {}", xlsx_path.display());

    if args.json {
        let json_path = xlsx_path.with_extension("json");
        match json::write_result(&outcome.result, &request.keywords, &stats, &json_path).await {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => error!(error = %e, "Failed to write JSON export"),
        }
    }

    print!("{}", summary::render(&outcome.result, &stats, outcome.removed));

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        rows = outcome.result.records.len(),
        removed = outcome.removed,
        failed_steps,
        "Execution complete"
    );

    Ok(())
}

//! Error taxonomy for a collection run.
//!
//! Everything an adapter can fail with is a [`CollectorError`]. The collector
//! catches these per step, so none of them abort the whole multi-keyword run;
//! only [`CollectorError::Validation`] (raised before collection starts) and
//! export errors reach `main`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectorError>;

#[derive(Debug, Error)]
pub enum CollectorError {
    /// Non-success HTTP status that is not retried.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// YouTube answered 403 for something other than disabled comments.
    #[error("YouTube API quota exceeded; try again tomorrow")]
    QuotaExceeded,

    /// YouTube answered 403 `commentsDisabled`. The comment adapter turns this
    /// into a per-video warning.
    #[error("comments are disabled for this video")]
    CommentsDisabled,

    /// A rate-limited or timed-out request kept failing past the retry budget.
    #[error("{what}: gave up after {attempts} attempts ({reason})")]
    RetriesExhausted {
        what: String,
        attempts: usize,
        reason: String,
    },

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no credentials configured for {0}")]
    MissingCredential(&'static str),

    /// Every pre-flight problem found, reported together.
    #[error("invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("invalid settings file: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

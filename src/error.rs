//! Error types for the status pipeline.
//!
//! Every branch of the dashboard resolves its fetch into either a payload or a
//! [`FetchError`]. Errors never escape a branch: they are turned into the literal
//! text shown in that branch's own region via [`FetchError::diagnostic`].

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single endpoint fetch.
///
/// A missing or non-list record list is not represented here; those normalise
/// to empty tables instead of errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response arrived (connection refused, DNS, timeout).
    /// Automatically converts from `reqwest::Error`.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a status >= 400.
    #[error("HTTP {status}\n{body}")]
    Http { status: StatusCode, body: String },

    /// The body of a JSON endpoint was not valid JSON.
    #[error("invalid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}

impl FetchError {
    /// Text written into the region that owns the failed fetch.
    ///
    /// HTTP errors keep the status line and body so operators see the
    /// server-side detail; unparseable JSON falls back to the raw body.
    pub fn diagnostic(&self) -> String {
        match self {
            FetchError::Transport(e) => format!("ERR: {}", e),
            FetchError::Http { .. } => self.to_string(),
            FetchError::Parse { raw, .. } => raw.clone(),
        }
    }
}

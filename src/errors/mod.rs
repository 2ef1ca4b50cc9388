//! Error type definitions for the pipeline.
//!
//! Source-fetch failures are modelled as explicit retryable/terminal values
//! (`FetchError`) rather than opaque exceptions; per-URL probe failures never
//! surface here at all, they are captured inside `ProbeResult`. Only
//! configuration problems and output writing can fail a run.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid regex in a parser or alias table
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Output serialization errors
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing final output files; a partially written result set is worse
    /// than a visible failure, so these are the only fatal I/O errors.
    #[error("Output write failed: {0}")]
    OutputWrite(#[from] std::io::Error),
}

/// Failure modes of a single source fetch attempt or retry loop.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request exceeded the per-attempt deadline
    #[error("request timed out")]
    Timeout,

    /// Non-200 response from the source
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection or transfer errors
    #[error("transport error: {0}")]
    Transport(String),

    /// All retry attempts were used; the source is skipped for this run
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl FetchError {
    /// Whether the retry loop should try this source again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout | FetchError::Status(_) | FetchError::Transport(_)
        )
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

//! Error types for stub construction and resolution.

use crate::request::Method;

/// Errors raised by the stub engine.
///
/// Simulated failures configured on a [`StubResponse`](crate::StubResponse) are
/// not errors: they resolve successfully to a response that describes a failure.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    /// No registered stub matched the request.
    #[error("no stub matches {method} {url}")]
    UnmatchedRequest {
        /// Method of the unmatched request
        method: Method,
        /// URL of the unmatched request
        url: String,
    },

    /// A stub definition was incomplete or contradictory.
    #[error("invalid stub: {0}")]
    InvalidStub(String),

    /// A regex pattern failed to compile.
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A JSON reference value could not be serialized.
    #[error("invalid JSON value: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = StubError> = std::result::Result<T, E>;

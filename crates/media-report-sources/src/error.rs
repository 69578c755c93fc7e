use thiserror::Error;

/// Failure of a single call against the monitoring service.
///
/// Transport problems, HTTP status errors, upstream error envelopes and
/// undecodable bodies are kept apart so callers can tell a real failure from
/// an empty answer for an unknown key.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request '{command}' failed: {source}")]
    Http {
        command: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("request '{command}' returned HTTP {status}")]
    Status {
        command: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("request '{command}' was rejected: {message}")]
    Api {
        command: &'static str,
        message: String,
    },

    #[error("malformed '{command}' response: {detail}")]
    MalformedResponse {
        command: &'static str,
        detail: String,
    },

    #[error("request '{command}' returned no data")]
    EmptyResult { command: &'static str },
}

impl SourceError {
    pub fn malformed(command: &'static str, detail: impl Into<String>) -> Self {
        SourceError::MalformedResponse {
            command,
            detail: detail.into(),
        }
    }

    /// An empty answer is what the server gives for a rating key past the
    /// end of the assigned range.
    pub fn is_end_of_range(&self) -> bool {
        matches!(self, SourceError::EmptyResult { .. })
    }

    /// Short category name used when grouping failures in summaries.
    pub fn category(&self) -> &'static str {
        match self {
            SourceError::Client(_) => "client",
            SourceError::Http { .. } => "http",
            SourceError::Status { .. } => "status",
            SourceError::Api { .. } => "api",
            SourceError::MalformedResponse { .. } => "malformed",
            SourceError::EmptyResult { .. } => "empty",
        }
    }
}

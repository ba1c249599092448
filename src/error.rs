//! Error types for configuring and running a fetch.

use thiserror::Error;

/// Caller misuse, detected before any retrieval starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// None of `profile`, `likes` or `list` was given
    #[error("no target selector: set exactly one of profile, likes or list")]
    MissingSelector,

    /// More than one selector was given
    #[error("more than one target selector set: {}", .0.join(", "))]
    MultipleSelectors(Vec<&'static str>),

    /// A selector field that must not be blank was blank
    #[error("{selector}.{field} must not be empty")]
    EmptyField {
        selector: &'static str,
        field: &'static str,
    },

    /// No `domId` and no custom callback to take over output
    #[error("domId is required unless a custom callback is supplied")]
    MissingOutputTarget,

    /// The sink has no target with this id
    #[error("output target '{0}' does not exist")]
    UnknownOutputTarget(String),

    /// `maxTweets` outside [1, 20] under the reject policy
    #[error("maxTweets must be between 1 and 20, got {0}")]
    MaxTweetsOutOfRange(i64),
}

/// The data source was unreachable or answered with something unusable.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("timeline endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response decoded but does not contain a timeline
    #[error("malformed timeline: {0}")]
    Malformed(String),

    /// Reading a fixture file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The fixture file has no entry for the requested selector
    #[error("no data for {0}")]
    NotFound(String),
}

/// Errors returned from [`crate::TwitterFetcher::fetch`].
///
/// Retrieval failures are not here: they are delivered through the sink or
/// callback and reported in [`crate::FetchReport`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The sink could not store the rendered output
    #[error("failed to write output target '{dom_id}': {source}")]
    Output {
        dom_id: String,
        #[source]
        source: std::io::Error,
    },
}

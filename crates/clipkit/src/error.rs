//! Error types for Clipkit

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
///
/// All of these are fatal: they abort a run before any document is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the config file nor its example template exists
    #[error("Configuration missing: neither {} nor {} exists", .path.display(), .example.display())]
    Missing { path: PathBuf, example: PathBuf },

    /// A section or key is missing, a value has the wrong shape, or a directory is unusable
    #[error("Configuration invalid: {0}")]
    Invalid(String),

    /// Required environment variable is not set
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    /// Failed to read or materialize the config file
    #[error("Failed to access configuration file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during HTTP operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Header value contains characters HTTP does not allow
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// No fetcher registered for the item
    #[error("Fetcher error: {0}")]
    FetcherError(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::RequestError(err.to_string())
        }
    }
}

/// Errors from a single chat-completion call
///
/// Never fatal: the annotator replaces them with a fallback annotation.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("API request failed: {0}")]
    Request(#[from] FetchError),

    #[error("API returned no choices")]
    EmptyResponse,

    #[error("API returned an empty message")]
    EmptyMessage,
}

/// Errors from the collection listing step
#[derive(Debug, Error)]
pub enum ListError {
    /// The totals endpoint could not be reached or parsed
    #[error("Could not read item count for collection {collection_id}")]
    TotalsUnavailable {
        collection_id: String,
        #[source]
        source: FetchError,
    },

    /// A page request failed
    #[error("Failed to fetch collection page at offset {offset}")]
    Page {
        offset: u64,
        #[source]
        source: FetchError,
    },

    /// URL and title lists drifted apart
    #[error("URL list and title list differ in length ({urls} vs {titles})")]
    LengthMismatch { urls: usize, titles: usize },
}

/// Per-item export failure
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to fetch article: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

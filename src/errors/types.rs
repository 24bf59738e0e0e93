//! Error type definitions for the anime1-proxy application

use thiserror::Error;

/// Top-level application error type
///
/// Wraps the per-layer errors of the resolution pipeline plus the generic
/// request-level failures. The web layer maps these onto HTTP status codes
/// in `web::responses`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Outbound page/endpoint fetch failures
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Upstream markup did not contain an expected structural anchor
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Embedded payload could not be turned into a playable URL
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Resource not found errors
    #[error("not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Malformed client input
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Generic internal errors
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Page Fetcher specific errors
///
/// One outbound network call per invocation; every failure mode is final at
/// this layer. Retry policy, if any, belongs to the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Upstream answered with a non-2xx status
    #[error("upstream returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Connection or transport level failure
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

/// HTML Extractor specific errors
///
/// Each variant names the structural anchor that was missing, which is the
/// signal that the upstream markup has drifted (or that the requested page
/// simply does not exist).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("category title not found in page")]
    MissingTitle,

    #[error("category id not found in page")]
    MissingCategoryId,

    #[error("episode list not found in page")]
    MissingEpisodeList,

    #[error("embedded player payload not found in page")]
    MissingEmbedPayload,

    #[error("page is neither a category nor a single post")]
    UnknownPageKind,
}

/// Stream Resolver specific errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The embedded payload did not match any known encoding scheme.
    /// This is the primary forward-compatibility risk: it means the upstream
    /// changed its obfuscation and the decode function needs updating.
    #[error("failed to decode embedded payload: {reason}")]
    DecodeFailed { reason: String },

    /// Decoding succeeded but no playable candidate was present
    #[error("no playable candidates in resolution response")]
    NoCandidates,

    /// The upstream resolution endpoint refused or returned garbage
    #[error("upstream rejected resolution request: {message}")]
    UpstreamRejected { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

//! HTTP response utilities
//!
//! Central mapping from [`AppError`] to status codes: malformed client input
//! is 400, an id the upstream does not recognize is 404, and any broken
//! upstream contract (fetch, parse or resolve failure) is 502, since this
//! server is a gateway and the upstream is the origin that failed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Convert an AppError into the appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let status = match &error {
        AppError::Validation { .. } => StatusCode::BAD_REQUEST,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Fetch(_) | AppError::Parse(_) | AppError::Resolve(_) => StatusCode::BAD_GATEWAY,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
            tracing::debug!("Request failed: {}", error)
        }
        _ => tracing::error!("Upstream pipeline failed: {}", error),
    }

    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FetchError, ParseError, ResolveError};

    #[test]
    fn status_mapping_matches_the_error_taxonomy() {
        assert_eq!(
            handle_error(AppError::validation("bad url")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            handle_error(AppError::not_found("category", "999999")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            handle_error(AppError::Fetch(FetchError::Timeout {
                url: "https://anime1.me/?cat=90".to_string()
            }))
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            handle_error(AppError::Parse(ParseError::MissingEpisodeList)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            handle_error(AppError::Resolve(ResolveError::DecodeFailed {
                reason: "unrecognized payload encoding".to_string()
            }))
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}

//! `GET /v/{post_id}`: serve one episode's video stream.
//!
//! Two modes: `redirect` answers 302 with the resolved upstream URL, `proxy`
//! relays the upstream bytes through this server with range support. The
//! default comes from configuration; `?mode=` overrides per request.
//! Dropping the response mid-stream drops the upstream connection with it.

use std::str::FromStr;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::StreamMode;
use crate::web::{AppState, handle_error};

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    mode: Option<String>,
}

/// Upstream headers relayed verbatim to the player
const RELAYED_HEADERS: [header::HeaderName; 6] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
    header::ETAG,
    header::LAST_MODIFIED,
];

pub async fn serve_episode(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> Response {
    let mode = match params.mode.as_deref() {
        Some(raw) => match StreamMode::from_str(raw) {
            Ok(mode) => mode,
            Err(_) => {
                return handle_error(AppError::validation(format!(
                    "unknown stream mode '{raw}'"
                )));
            }
        },
        None => state.service.default_stream_mode(),
    };

    let stream = match state.service.resolve_episode(&post_id).await {
        Ok(stream) => stream,
        Err(e) => return handle_error(e),
    };

    match mode {
        StreamMode::Redirect => {
            info!(
                "Redirecting episode {} to resolved URL: {}",
                post_id, stream.media_url
            );
            match HeaderValue::from_str(&stream.media_url) {
                Ok(location) => {
                    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
                }
                Err(_) => handle_error(AppError::internal(
                    "resolved URL is not a valid redirect target",
                )),
            }
        }
        StreamMode::Proxy => {
            let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
            let if_range = headers.get(header::IF_RANGE).and_then(|v| v.to_str().ok());

            let upstream = match state.service.open_media(&stream, range, if_range).await {
                Ok(response) => response,
                Err(e) => return handle_error(e),
            };

            info!(
                "Proxying episode {} ({}) from {}",
                post_id,
                upstream.status(),
                stream.media_url
            );
            relay(upstream)
        }
    }
}

/// Relay the upstream response: status, whitelisted headers and the body
/// byte stream, verbatim
fn relay(upstream: reqwest::Response) -> Response {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut relayed = HeaderMap::new();
    for name in RELAYED_HEADERS {
        if let Some(value) = upstream.headers().get(&name)
            && let Ok(value) = HeaderValue::from_bytes(value.as_bytes())
        {
            relayed.insert(name, value);
        }
    }

    let body = Body::from_stream(upstream.bytes_stream());
    (status, relayed, body).into_response()
}

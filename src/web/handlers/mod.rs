//! HTTP request handlers, one module per route group

use axum::http::{HeaderMap, header};

use crate::web::AppState;

pub mod index;
pub mod parse;
pub mod playlists;
pub mod recents;
pub mod streams;

/// Absolute base URL for links in responses: the configured override wins,
/// otherwise the request's own Host header, so generated links work for
/// whatever address the client reached us on.
pub(crate) fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.web.base_url {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.to_string())
        .unwrap_or_else(|| format!("{}:{}", state.config.web.host, state.config.web.port));
    format!("http://{host}")
}

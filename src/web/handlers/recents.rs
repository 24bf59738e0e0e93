//! `GET /l`: recently seen categories, most recent first.
//! `?ex=1` expands each entry with its playlist link map.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::web::AppState;
use crate::web::handlers::base_url;

#[derive(Debug, Deserialize)]
pub struct RecentsParams {
    ex: Option<String>,
}

pub async fn list_recent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RecentsParams>,
) -> Response {
    let base = base_url(&state, &headers);
    let expanded = params.ex.as_deref() == Some("1");
    let entries = state.service.recent_categories(&base, expanded).await;
    Json(entries).into_response()
}

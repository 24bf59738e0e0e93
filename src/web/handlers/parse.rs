//! `GET /p?url=<upstream-url>`: resolve an arbitrary upstream URL into a
//! JSON descriptor

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::errors::AppError;
use crate::web::handlers::base_url;
use crate::web::{AppState, handle_error};

#[derive(Debug, Deserialize)]
pub struct ParseParams {
    url: Option<String>,
}

pub async fn parse_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ParseParams>,
) -> Response {
    let base = base_url(&state, &headers);
    let Some(url) = params.url else {
        return handle_error(AppError::validation("missing query 'url'"));
    };
    match state.service.describe_url(&base, &url).await {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(e) => handle_error(e),
    }
}

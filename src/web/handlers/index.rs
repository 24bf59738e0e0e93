//! `GET /`: plain-text usage hint

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::web::AppState;
use crate::web::handlers::base_url;

pub async fn help(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(&state, &headers);
    format!("Use {base}/p?url=<url> to resolve any upstream category or episode page")
}

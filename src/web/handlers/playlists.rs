//! `GET /c/{category_id}`: serve one playlist rendition of a category.
//! Defaults to m3u8; `?playlist=` selects any of the five wire kinds.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::playlist::PlaylistKind;
use crate::web::handlers::base_url;
use crate::web::{AppState, handle_error};

#[derive(Debug, Deserialize)]
pub struct PlaylistParams {
    playlist: Option<String>,
}

pub async fn serve_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<PlaylistParams>,
) -> Response {
    let base = base_url(&state, &headers);

    let kind = match params.playlist.as_deref() {
        Some(raw) => match PlaylistKind::parse(raw) {
            Ok(kind) => kind,
            Err(e) => return handle_error(e),
        },
        None => PlaylistKind::M3u8,
    };

    match state
        .service
        .category_playlist(&base, &category_id, kind)
        .await
    {
        Ok(playlist) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                urlencoding::encode(&playlist.file_name)
            );
            (
                [
                    (header::CONTENT_TYPE, playlist.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                playlist.content,
            )
                .into_response()
        }
        Err(e) => handle_error(e),
    }
}

//! Preview route handler.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::state::AppState;
use crate::views::{NoteCardView, PreviewGuidance, PreviewView};

use super::ApiError;

/// `GET /preview/:id` — a single note with either an embeddable target or a
/// guidance panel when the stored URL is malformed or unreachable.
pub async fn preview_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewView>, ApiError> {
    let token = state.sessions.access_token().await;
    let note = state.data.fetch_note(token.as_deref(), id).await?;

    let valid_url = note
        .public_url
        .as_deref()
        .and_then(|u| Url::parse(u).ok())
        .map(|u| u.scheme().starts_with("http"))
        .unwrap_or(false);

    // Best-effort reachability probe under a short timeout; suppressed
    // entirely when the URL shape already failed.
    let reachable = if valid_url {
        let url = note.public_url.as_deref().unwrap_or_default();
        match state.probe_client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, note_id = %id, "Preview reachability probe failed");
                false
            }
        }
    } else {
        false
    };

    let available = valid_url && reachable;
    let view = PreviewView {
        note: NoteCardView::from(&note),
        available,
        embed_url: available.then(|| note.public_url.clone().unwrap_or_default()),
        guidance: (!available).then(|| PreviewGuidance::unavailable(Some(note.file_path.clone()))),
    };
    Ok(Json(view))
}

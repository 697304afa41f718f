//! Catalog route handler.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::error;

use noteshare_core::FilterState;

use crate::state::AppState;
use crate::views::{CatalogView, NoteCardView};

#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub q: Option<String>,
    pub cat: Option<String>,
}

/// `GET /?q=...&cat=...` — the catalog, most recent first.
pub async fn catalog_view(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Json<CatalogView> {
    let filter = FilterState::from_params(params.q.as_deref(), params.cat.as_deref());
    let token = state.sessions.access_token().await;
    let epoch = state.refresh_epoch();

    let view = match state
        .catalog
        .fetch(token.as_deref(), &filter, epoch)
        .await
    {
        Ok(page) => CatalogView {
            query: filter.query.clone(),
            category: filter.category.as_str().to_string(),
            notes: page.notes.iter().map(NoteCardView::from).collect(),
            fallback: page.fallback,
            signed_in: token.is_some(),
            refresh_epoch: epoch,
            error: None,
        },
        Err(err) => {
            // Both query paths failed; render an empty catalog with the
            // error inline rather than a dead view.
            error!(error = %err, "Catalog fetch failed");
            CatalogView {
                query: filter.query.clone(),
                category: filter.category.as_str().to_string(),
                notes: Vec::new(),
                fallback: false,
                signed_in: token.is_some(),
                refresh_epoch: epoch,
                error: Some(err.to_string()),
            }
        }
    };

    Json(view)
}

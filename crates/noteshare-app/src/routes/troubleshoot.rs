//! Diagnostics route handler.

use axum::{extract::State, Json};

use crate::diagnostics::run_probes;
use crate::state::AppState;
use crate::views::TroubleshootView;

/// `GET /troubleshoot` — run the advisory probe sequence and report.
pub async fn troubleshoot_view(State(state): State<AppState>) -> Json<TroubleshootView> {
    let results = run_probes(
        &state.config,
        &state.sessions,
        &state.data,
        &state.storage,
        &state.serving_origin,
    )
    .await;

    Json(TroubleshootView {
        results,
        site_url: state.site_url(),
    })
}

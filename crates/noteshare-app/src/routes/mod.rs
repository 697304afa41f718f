//! Route layer: the application's client-facing routes.
//!
//! Route map (unknown paths redirect to the catalog):
//!
//! | Route | View |
//! |-------|------|
//! | `GET /` | catalog (accepts `q`, `cat`) |
//! | `GET/POST /login`, `POST /signup`, `POST /reset`, `POST /logout` | auth |
//! | `GET /auth/callback`, `GET /auth/error` | verification redirect handling |
//! | `GET /preview/:id` | preview or guidance panel |
//! | `GET /profile` | profile (session-gated) |
//! | `GET /troubleshoot` | diagnostics |
//! | `POST /upload` | upload orchestrator |
//! | `GET /health` | liveness |

pub mod auth;
pub mod catalog;
pub mod preview;
pub mod troubleshoot;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use noteshare_core::Error;

use crate::state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation when tracing a failed upload across its remote calls.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// HTTP status for an application error.
pub fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::AuthRequired(_) => StatusCode::UNAUTHORIZED,
        Error::PolicyDenied(_) | Error::RowPolicy(_) => StatusCode::FORBIDDEN,
        Error::NotFound(_) | Error::NoteNotFound(_) | Error::BucketNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        Error::Network(_) => StatusCode::BAD_GATEWAY,
        Error::PreviewUnavailable(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error wrapper giving handlers `?` on application errors.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = error_status(&self.0);
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "noteshare-app",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn redirect_home() -> Redirect {
    Redirect::to("/")
}

/// Build the application router over `state`.
pub fn build_router(state: AppState) -> Router {
    // Selections up to twice the upload ceiling still reach the validator so
    // the user gets the overage message; only beyond that does the transport
    // cut the body off.
    let body_limit = state.config.max_upload_bytes() as usize * 2;

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(catalog::catalog_view))
        .route("/login", get(auth::login_view).post(auth::login_submit))
        .route("/signup", post(auth::signup_submit))
        .route("/reset", post(auth::reset_submit))
        .route("/logout", post(auth::logout))
        .route("/auth/callback", get(auth::auth_callback))
        .route("/auth/error", get(auth::auth_error_view))
        .route("/preview/:id", get(preview::preview_view))
        .route("/profile", get(auth::profile_view))
        .route("/troubleshoot", get(troubleshoot::troubleshoot_view))
        .route("/upload", post(upload::upload_submit))
        .fallback(redirect_home)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

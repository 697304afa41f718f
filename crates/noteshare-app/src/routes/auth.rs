//! Authentication route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::session::{
    auth_error_type, friendly_auth_message, password_issues, CallbackParams,
};
use crate::state::AppState;
use crate::views::{AuthErrorView, AuthView, ProfileView};

const TROUBLESHOOT_SUFFIX: &str = " (See Troubleshoot for help)";

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Deserialize)]
pub struct ResetForm {
    pub email: String,
}

/// `GET /login` — auth view, or straight to the catalog when signed in.
pub async fn login_view(State(state): State<AppState>) -> Response {
    if state.sessions.current().await.is_some() {
        return Redirect::to("/").into_response();
    }
    Json(AuthView::login(state.site_url())).into_response()
}

/// `POST /login`
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.sessions.sign_in(&form.email, &form.password).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => {
            debug!(error = %err, "Sign-in failed");
            let view = AuthView::login(state.site_url())
                .with_error(friendly_auth_message(&err) + TROUBLESHOOT_SUFFIX);
            (super::error_status(&err), Json(view)).into_response()
        }
    }
}

/// `POST /signup`
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Response {
    let issues = password_issues(&form.password, &form.confirm);
    if !issues.is_empty() {
        let mut view = AuthView::for_mode("signup", state.site_url())
            .with_error("Password does not meet requirements.".to_string());
        view.password_issues = issues;
        return (StatusCode::BAD_REQUEST, Json(view)).into_response();
    }

    let redirect_to = state.site_url();
    match state
        .sessions
        .sign_up(&form.email, &form.password, &form.confirm, &redirect_to)
        .await
    {
        Ok(outcome) if outcome.verification_pending() => {
            let view = AuthView::for_mode("signup", state.site_url()).with_info(
                "Signup successful. Please check your email and click the verification link \
                 to complete sign-in."
                    .to_string(),
            );
            Json(view).into_response()
        }
        // Auto-confirm deployments issue a session immediately.
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => {
            let view = AuthView::for_mode("signup", state.site_url())
                .with_error(friendly_auth_message(&err) + TROUBLESHOOT_SUFFIX);
            (super::error_status(&err), Json(view)).into_response()
        }
    }
}

/// `POST /reset`
pub async fn reset_submit(
    State(state): State<AppState>,
    Form(form): Form<ResetForm>,
) -> Response {
    let redirect_to = state.site_url();
    match state
        .sessions
        .request_password_reset(&form.email, &redirect_to)
        .await
    {
        Ok(()) => {
            let view = AuthView::for_mode("reset", state.site_url()).with_info(
                "Password reset email sent. Check your inbox and follow the link to set a \
                 new password."
                    .to_string(),
            );
            Json(view).into_response()
        }
        Err(err) => {
            let view = AuthView::for_mode("reset", state.site_url())
                .with_error(friendly_auth_message(&err) + TROUBLESHOOT_SUFFIX);
            (super::error_status(&err), Json(view)).into_response()
        }
    }
}

/// `POST /logout`
pub async fn logout(State(state): State<AppState>) -> Redirect {
    // Sign-out is best-effort; the local session is cleared regardless.
    let _ = state.sessions.sign_out().await;
    Redirect::to("/login")
}

/// `GET /auth/callback` — installs the session from the verification
/// redirect, then forwards to the catalog.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match state.sessions.install_from_callback(&params).await {
        Ok(_) => Redirect::to("/"),
        Err(err) => {
            debug!(error = %err, "Auth callback failed");
            let error_type = auth_error_type(&err);
            if error_type.is_empty() {
                Redirect::to("/auth/error")
            } else {
                Redirect::to(&format!("/auth/error?type={}", error_type))
            }
        }
    }
}

/// `GET /auth/error?type=...`
pub async fn auth_error_view(Query(params): Query<HashMap<String, String>>) -> Json<AuthErrorView> {
    let error_type = params
        .get("type")
        .map(|t| t.to_lowercase())
        .unwrap_or_default();
    Json(AuthErrorView::for_type(&error_type))
}

/// `GET /profile` — session-gated.
pub async fn profile_view(State(state): State<AppState>) -> Response {
    let Some(session) = state.sessions.current().await else {
        return Redirect::to("/login").into_response();
    };

    // Prefer a fresh identity; fall back to the snapshot when the lookup
    // fails so the page still renders.
    let user = state
        .sessions
        .user_info(&session.access_token)
        .await
        .unwrap_or(session.user);

    Json(ProfileView {
        user_id: user.id,
        email: user.email,
    })
    .into_response()
}

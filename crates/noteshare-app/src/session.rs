//! Session management and client-side auth validation.
//!
//! `SessionManager` is the explicit context object components use for
//! identity: it wraps the auth backend and the process-wide session store,
//! so every sign-in path funnels through one place and consumers only ever
//! see immutable session snapshots.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use noteshare_core::{Error, Result, Session, SignUpOutcome, UserIdentity};
use noteshare_remote::{AuthBackend, SessionStore};

/// Email shape check used before contacting the auth service.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

pub fn email_looks_valid(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Password policy issues for sign-up, empty when the password is acceptable.
///
/// Policy: at least 8 characters, at least one letter, at least one digit,
/// and the confirmation must match.
pub fn password_issues(password: &str, confirm: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if password.len() < 8 {
        issues.push("At least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        issues.push("Include a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Include a number");
    }
    if password != confirm {
        issues.push("Passwords must match");
    }
    issues
}

/// Tokens handed back by the redirect-based verification callback.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct CallbackParams {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Session manager: the single subscription point for auth state.
#[derive(Clone)]
pub struct SessionManager {
    auth: Arc<dyn AuthBackend>,
    store: SessionStore,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthBackend>, store: SessionStore) -> Self {
        Self { auth, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The current session, refreshing rotated tokens when the snapshot has
    /// expired. A failed refresh clears the session rather than retrying.
    pub async fn current(&self) -> Option<Session> {
        let snapshot = self.store.snapshot()?;
        if !snapshot.is_expired() {
            return Some(snapshot);
        }
        match self.auth.refresh(&snapshot.refresh_token).await {
            Ok(fresh) => {
                self.store.install(fresh.clone());
                Some(fresh)
            }
            Err(err) => {
                warn!(error = %err, "Session refresh failed, clearing session");
                self.store.clear();
                None
            }
        }
    }

    /// Current access token, refreshing first if needed.
    pub async fn access_token(&self) -> Option<String> {
        self.current().await.map(|s| s.access_token)
    }

    #[instrument(skip(self, password), fields(subsystem = "auth", component = "session_manager", op = "sign_in"))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if !email_looks_valid(email) {
            return Err(Error::Validation(
                "Please enter a valid email address.".into(),
            ));
        }
        let session = self.auth.sign_in(email, password).await?;
        self.store.install(session.clone());
        Ok(session)
    }

    #[instrument(skip(self, password, confirm), fields(subsystem = "auth", component = "session_manager", op = "sign_up"))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome> {
        if !email_looks_valid(email) {
            return Err(Error::Validation(
                "Please enter a valid email address.".into(),
            ));
        }
        if !password_issues(password, confirm).is_empty() {
            return Err(Error::Validation(
                "Password does not meet requirements.".into(),
            ));
        }
        let outcome = self.auth.sign_up(email, password, redirect_to).await?;
        if let Some(session) = &outcome.session {
            self.store.install(session.clone());
        }
        Ok(outcome)
    }

    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.store.snapshot() {
            // Best effort: clear locally even when the remote call fails.
            if let Err(err) = self.auth.sign_out(&session.access_token).await {
                warn!(error = %err, "Remote sign-out failed");
            }
        }
        self.store.clear();
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<()> {
        if !email_looks_valid(email) {
            return Err(Error::Validation(
                "Please enter a valid email address.".into(),
            ));
        }
        self.auth.request_password_reset(email, redirect_to).await
    }

    /// Install a session from the verification redirect's token parameters.
    #[instrument(skip_all, fields(subsystem = "auth", component = "session_manager", op = "install_from_callback"))]
    pub async fn install_from_callback(&self, params: &CallbackParams) -> Result<Session> {
        if let Some(error) = &params.error {
            let detail = params.error_description.clone().unwrap_or_else(|| error.clone());
            return Err(noteshare_remote::classify_message(&detail));
        }
        let access_token = params
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::AuthRequired("callback carried no access token".into()))?;
        let refresh_token = params.refresh_token.clone().unwrap_or_default();

        let user = self.auth.user_info(access_token).await?;
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token,
            expires_at: chrono::Utc::now()
                + chrono::Duration::seconds(params.expires_in.unwrap_or(3600)),
            user,
        };
        self.store.install(session.clone());
        info!("Session installed from verification callback");
        Ok(session)
    }

    pub async fn user_info(&self, access_token: &str) -> Result<UserIdentity> {
        self.auth.user_info(access_token).await
    }
}

// =============================================================================
// ERROR PRESENTATION
// =============================================================================

/// Friendly message for an auth failure, mirroring the remediation text the
/// login view has always shown.
pub fn friendly_auth_message(err: &Error) -> String {
    let raw = match err {
        Error::Validation(msg) => return msg.clone(),
        Error::Network(_) => {
            return "Network error connecting to the auth service. Check your internet and service URL.".into()
        }
        Error::RateLimited(_) => return "Too many attempts. Please wait a moment and try again.".into(),
        Error::Config(_) => {
            return "Invalid service key. Ensure NOTESHARE_SERVICE_KEY is the public (anon) key.".into()
        }
        Error::Conflict(_) => {
            return "This email is already registered. Try logging in or use password reset.".into()
        }
        Error::AuthRequired(msg)
        | Error::PolicyDenied(msg)
        | Error::Request(msg)
        | Error::Internal(msg)
        | Error::NotFound(msg)
        | Error::Serialization(msg)
        | Error::RowPolicy(msg)
        | Error::BucketNotFound(msg)
        | Error::PreviewUnavailable(msg) => msg.clone(),
        other => other.to_string(),
    };

    let msg = raw.to_lowercase();
    if msg.contains("invalid login credentials") || msg.contains("invalid_grant") {
        "Invalid email or password. Please try again.".into()
    } else if msg.contains("email") && msg.contains("not confirmed") {
        "Email not confirmed. Please check your inbox for the verification link.".into()
    } else if msg.contains("email") && (msg.contains("already") || msg.contains("registered")) {
        "This email is already registered. Try logging in or use password reset.".into()
    } else if msg.contains("redirect") || msg.contains("not allowed") {
        "Redirect URL is not allowed. Open Troubleshoot and verify the auth URL settings.".into()
    } else if msg.contains("password") && (msg.contains("too short") || msg.contains("weak")) {
        "Password too weak. Use at least 8 characters with letters and numbers.".into()
    } else if msg.contains("user not found") {
        "No account found for this email. Try signing up first.".into()
    } else {
        raw
    }
}

/// Classify an auth failure into the error view's `type` parameter.
pub fn auth_error_type(err: &Error) -> &'static str {
    let msg = err.to_string().to_lowercase();
    if msg.contains("redirect") {
        "redirect"
    } else if msg.contains("expired") {
        "expired"
    } else if msg.contains("email") {
        "email"
    } else {
        ""
    }
}

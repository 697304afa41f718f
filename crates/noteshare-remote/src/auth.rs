//! Remote auth service client and session state holder.
//!
//! The auth service speaks the GoTrue-compatible REST surface: password and
//! refresh-token grants, sign-up with a verification redirect, password
//! recovery by email, and bearer-token identity lookup. Every request carries
//! the public `apikey` header.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use noteshare_core::{Error, Result, ServiceConfig, Session, SignUpOutcome, UserIdentity};

use crate::error::{classify_response, Service};

/// Remote authentication service operations.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Sign up with email and password. `redirect_to` is where the emailed
    /// verification link returns the user; it must be on the service's
    /// redirect allow-list.
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str)
        -> Result<SignUpOutcome>;

    /// Invalidate the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Rotate tokens using a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<Session>;

    /// Send a password-reset email with a redirect back to `redirect_to`.
    async fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<()>;

    /// Fetch the identity behind an access token.
    async fn user_info(&self, access_token: &str) -> Result<UserIdentity>;
}

// =============================================================================
// REST CLIENT
// =============================================================================

/// GoTrue-compatible REST auth client.
pub struct RestAuthBackend {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

/// Token grant response; shared by the password and refresh grants.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserIdentity,
}

impl From<TokenResponse> for Session {
    fn from(t: TokenResponse) -> Self {
        Session {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at: Utc::now() + Duration::seconds(t.expires_in),
            user: t.user,
        }
    }
}

impl RestAuthBackend {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/auth/v1", config.base()),
            anon_key: config.anon_key.clone(),
        }
    }

    async fn read_failure(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_response(Service::Auth, status, &body)
    }
}

#[async_trait]
impl AuthBackend for RestAuthBackend {
    #[instrument(skip(self, password), fields(subsystem = "auth", component = "rest_auth", op = "sign_in"))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&CredentialsRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        let token: TokenResponse = response.json().await?;
        debug!(user_id = %token.user.id, "Sign-in complete");
        Ok(token.into())
    }

    #[instrument(skip(self, password), fields(subsystem = "auth", component = "rest_auth", op = "sign_up"))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome> {
        let response = self
            .client
            .post(format!("{}/signup", self.base_url))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&CredentialsRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        // Depending on deployment config the response is either a full token
        // grant (auto-confirm enabled) or a bare user object pending email
        // verification.
        let body: serde_json::Value = response.json().await?;
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)?;
            Ok(SignUpOutcome {
                session: Some(token.into()),
            })
        } else {
            info!("Sign-up accepted, email verification pending");
            Ok(SignUpOutcome { session: None })
        }
    }

    #[instrument(skip_all, fields(subsystem = "auth", component = "rest_auth", op = "sign_out"))]
    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(subsystem = "auth", component = "rest_auth", op = "refresh"))]
    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .client
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into())
    }

    #[instrument(skip(self), fields(subsystem = "auth", component = "rest_auth", op = "recover"))]
    async fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/recover", self.base_url))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&RecoverRequest { email })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(subsystem = "auth", component = "rest_auth", op = "user_info"))]
    async fn user_info(&self, access_token: &str) -> Result<UserIdentity> {
        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        Ok(response.json().await?)
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Process-wide session state behind a single subscription point.
///
/// Holds the current session (or none) and publishes immutable snapshots on
/// every change over a watch channel. Anything gating itself on
/// authentication reads the latest snapshot or subscribes; there is no retry
/// or backoff — a dropped receiver simply keeps its last value.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// The current session snapshot, if any.
    pub fn snapshot(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes. The receiver immediately holds the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Install a new session snapshot (sign-in, sign-up, token rotation).
    pub fn install(&self, session: Session) {
        info!(user_id = %session.user.id, "Session installed");
        self.tx.send_replace(Some(session));
    }

    /// Clear the session (sign-out or expiry).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Current access token, if a session is active.
    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.access_token.clone())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

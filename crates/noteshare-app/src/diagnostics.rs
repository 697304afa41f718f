//! Connectivity diagnostics.
//!
//! A fixed sequence of read-only probes against the remote services with
//! pass/fail results and remediation text. Entirely advisory: nothing here
//! changes application state. Each remote probe runs under a short
//! client-side timeout so a hung service cannot wedge the view.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::instrument;
use url::Url;

use noteshare_core::defaults::{PROBE_SELECT_LIMIT, PROBE_TIMEOUT_SECS};
use noteshare_core::{mask_key, Error, FilterState, ServiceConfig};
use noteshare_remote::{DataBackend, StorageBackend};

use crate::session::SessionManager;

/// Result of one probe.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProbeReport {
    pub title: String,
    pub ok: bool,
    pub detail: String,
    /// Remediation text, shown when the probe fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl ProbeReport {
    fn new(title: &str, ok: bool, detail: impl Into<String>, fix: &str) -> Self {
        Self {
            title: title.to_string(),
            ok,
            detail: detail.into(),
            fix: (!ok).then(|| fix.to_string()),
        }
    }
}

fn probe_timeout() -> Duration {
    Duration::from_secs(PROBE_TIMEOUT_SECS)
}

/// Run the full probe sequence.
#[instrument(skip_all, fields(subsystem = "app", component = "probes", op = "run_probes"))]
pub async fn run_probes(
    config: &ServiceConfig,
    sessions: &SessionManager,
    data: &Arc<dyn DataBackend>,
    storage: &Arc<dyn StorageBackend>,
    serving_origin: &str,
) -> Vec<ProbeReport> {
    let mut results = Vec::new();

    // Environment variables present
    let env_ok = !config.base_url.is_empty() && !config.anon_key.is_empty();
    results.push(ProbeReport::new(
        "Environment variables",
        env_ok,
        format!(
            "NOTESHARE_SERVICE_URL={} | NOTESHARE_SERVICE_KEY={}",
            if config.base_url.is_empty() {
                "(missing)"
            } else {
                &config.base_url
            },
            if config.anon_key.is_empty() {
                "(missing)".to_string()
            } else {
                mask_key(&config.anon_key)
            },
        ),
        "Set NOTESHARE_SERVICE_URL and NOTESHARE_SERVICE_KEY in the environment (or .env) and restart.",
    ));

    // URL shape
    let url_ok = Url::parse(&config.base_url)
        .map(|u| u.scheme().starts_with("http") && u.host_str().is_some())
        .unwrap_or(false);
    results.push(ProbeReport::new(
        "Service URL format",
        url_ok,
        config.base_url.clone(),
        "Use the project URL from the service dashboard (e.g. https://xyz.example.co).",
    ));

    // Auth session retrieval
    match timeout(probe_timeout(), sessions.current()).await {
        Ok(session) => {
            let detail = match session {
                Some(s) => format!(
                    "OK (signed in as {})",
                    s.user.email.as_deref().unwrap_or("unknown")
                ),
                None => "OK (no active session)".to_string(),
            };
            results.push(ProbeReport::new(
                "Auth session retrieval",
                true,
                detail,
                "",
            ));
        }
        Err(_) => results.push(ProbeReport::new(
            "Auth session retrieval",
            false,
            "Timed out retrieving the session",
            "Check the auth service URL and that the public (anon) key is valid.",
        )),
    }

    // Data service connectivity: capped select
    let select = timeout(
        probe_timeout(),
        data.list_notes(None, &FilterState::default(), PROBE_SELECT_LIMIT),
    )
    .await;
    let (ok, detail) = match select {
        Ok(Ok(rows)) => (true, format!("OK ({} rows sample)", rows.len())),
        Ok(Err(err)) => (false, err.to_string()),
        Err(_) => (false, "Timed out".to_string()),
    };
    results.push(ProbeReport::new(
        "Database connectivity (notes select)",
        ok,
        detail,
        "Ensure the notes table exists and a select policy for all users is in place.",
    ));

    // Auth redirect URL
    let site_url = config.redirect_site_url(serving_origin);
    results.push(ProbeReport::new(
        "Auth redirect URL",
        site_url.starts_with("http"),
        format!(
            "Using {} (from NOTESHARE_SITE_URL or the serving origin)",
            site_url
        ),
        "Set the site URL in the auth service's URL configuration and allow redirects to /auth/callback.",
    ));

    // Storage bucket: list one object; a missing-object error still proves
    // the bucket answers, so only a missing bucket fails the probe.
    let listing = timeout(probe_timeout(), storage.list_objects("", 1)).await;
    let (ok, detail) = match listing {
        Ok(Ok(_)) | Ok(Err(Error::NotFound(_))) => {
            let base = storage
                .public_url("example.pdf")
                .unwrap_or_else(|| "(no public URL issued)".to_string());
            (true, format!("Public URL base OK: {}", base))
        }
        Ok(Err(err)) => (false, err.to_string()),
        Err(_) => (false, "Timed out".to_string()),
    };
    results.push(ProbeReport::new(
        &format!("Storage bucket \"{}\"", config.bucket),
        ok,
        detail,
        "Create a public bucket named \"notes\" and add an insert policy for authenticated users.",
    ));

    results
}

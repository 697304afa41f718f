//! Application state shared across handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use noteshare_core::defaults::PROBE_TIMEOUT_SECS;
use noteshare_core::ServiceConfig;
use noteshare_remote::{
    AuthBackend, DataBackend, RestAuthBackend, RestDataBackend, RestStorageBackend, SessionStore,
    StorageBackend,
};

use crate::catalog::CatalogService;
use crate::session::SessionManager;
use crate::upload::UploadOrchestrator;

/// Application state: the explicit context object handed to every handler.
///
/// All cross-component coordination happens through the refresh counter; the
/// components themselves share nothing but these handles.
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub sessions: SessionManager,
    pub storage: Arc<dyn StorageBackend>,
    pub data: Arc<dyn DataBackend>,
    pub catalog: CatalogService,
    pub uploader: UploadOrchestrator,
    /// Monotonically incrementing refresh signal; bumped after uploads to
    /// force the catalog to refetch.
    pub refresh: Arc<AtomicU64>,
    /// Short-timeout client for the preview reachability probe.
    pub probe_client: reqwest::Client,
    /// Origin this instance serves from, used for auth redirect targets.
    pub serving_origin: String,
}

impl AppState {
    /// Assemble state over arbitrary backends (mocks in tests, REST in
    /// production).
    pub fn new(
        config: ServiceConfig,
        auth: Arc<dyn AuthBackend>,
        storage: Arc<dyn StorageBackend>,
        data: Arc<dyn DataBackend>,
        serving_origin: String,
    ) -> Self {
        let sessions = SessionManager::new(auth, SessionStore::new());
        let refresh = Arc::new(AtomicU64::new(0));
        let catalog = CatalogService::new(data.clone());
        let uploader = UploadOrchestrator::new(
            &config,
            storage.clone(),
            data.clone(),
            sessions.clone(),
            refresh.clone(),
        );
        let probe_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            sessions,
            storage,
            data,
            catalog,
            uploader,
            refresh,
            probe_client,
            serving_origin,
        }
    }

    /// Assemble state over the REST backends.
    pub fn from_config(config: ServiceConfig, serving_origin: String) -> Self {
        let auth = Arc::new(RestAuthBackend::new(&config));
        let storage = Arc::new(RestStorageBackend::new(&config));
        let data = Arc::new(RestDataBackend::new(&config));
        Self::new(config, auth, storage, data, serving_origin)
    }

    /// Current refresh epoch.
    pub fn refresh_epoch(&self) -> u64 {
        self.refresh.load(Ordering::SeqCst)
    }

    /// The site URL auth redirects return to.
    pub fn site_url(&self) -> String {
        self.config.redirect_site_url(&self.serving_origin)
    }
}

//! Catalog query component.
//!
//! Fetches the note catalog most-recent-first with the filter applied
//! server-side, and falls back to fetching the unfiltered capped page and
//! filtering locally when the server-side query fails — the view always
//! renders something when only the filtering layer is broken.
//!
//! A single-slot cache keyed by (filter, refresh epoch) keeps repeated reads
//! of the same view off the network; bumping the refresh counter forces the
//! next read through to the data service.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use noteshare_core::defaults::CATALOG_LIMIT;
use noteshare_core::{filter, FilterState, Note, Result};
use noteshare_remote::DataBackend;

/// One fetched catalog page.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub notes: Vec<Note>,
    /// True when this page came through the locally-filtered fallback path.
    pub fallback: bool,
}

struct CacheSlot {
    filter: FilterState,
    epoch: u64,
    page: CatalogPage,
}

/// Read-only catalog access with fallback filtering and a refresh-keyed cache.
#[derive(Clone)]
pub struct CatalogService {
    data: Arc<dyn DataBackend>,
    cache: Arc<RwLock<Option<CacheSlot>>>,
}

impl CatalogService {
    pub fn new(data: Arc<dyn DataBackend>) -> Self {
        Self {
            data,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch the catalog for `filter_state` under refresh epoch `epoch`.
    #[instrument(skip(self, access_token), fields(subsystem = "catalog", component = "catalog_service", op = "fetch", query = %filter_state.query, category = filter_state.category.as_str(), refresh_epoch = epoch))]
    pub async fn fetch(
        &self,
        access_token: Option<&str>,
        filter_state: &FilterState,
        epoch: u64,
    ) -> Result<CatalogPage> {
        {
            let cache = self.cache.read().await;
            if let Some(slot) = cache.as_ref() {
                if slot.epoch == epoch && slot.filter == *filter_state {
                    debug!("Catalog cache hit");
                    return Ok(slot.page.clone());
                }
            }
        }

        let page = self.fetch_uncached(access_token, filter_state).await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CacheSlot {
            filter: filter_state.clone(),
            epoch,
            page: page.clone(),
        });
        Ok(page)
    }

    async fn fetch_uncached(
        &self,
        access_token: Option<&str>,
        filter_state: &FilterState,
    ) -> Result<CatalogPage> {
        match self
            .data
            .list_notes(access_token, filter_state, CATALOG_LIMIT)
            .await
        {
            Ok(notes) => {
                debug!(result_count = notes.len(), "Server-filtered catalog page");
                Ok(CatalogPage {
                    notes,
                    fallback: false,
                })
            }
            Err(err) => {
                warn!(error = %err, fallback = true, "Server-side filter failed, filtering locally");
                let unfiltered = self
                    .data
                    .list_notes(access_token, &FilterState::default(), CATALOG_LIMIT)
                    .await?;
                let notes = filter::apply(unfiltered, filter_state);
                Ok(CatalogPage {
                    notes,
                    fallback: true,
                })
            }
        }
    }
}

//! Remote data service client.
//!
//! PostgREST-compatible row access for the notes table: filtered select with
//! ordering and a row cap, insert with representation return, and single-row
//! fetch by id. Requests carry the `apikey` header plus a bearer token when a
//! session is active so the service's policies see the caller's identity.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use uuid::Uuid;

use noteshare_core::defaults::{CATALOG_ORDER_COLUMN, NOTES_TABLE};
use noteshare_core::{CategoryFilter, Error, FilterState, NewNote, Note, Result, ServiceConfig};

use crate::error::{classify_response, Service};

/// Remote data service operations for note rows.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Fetch notes most recent first, capped at `limit`, with the filter
    /// applied server-side. An empty filter fetches the plain recent page.
    async fn list_notes(
        &self,
        access_token: Option<&str>,
        filter: &FilterState,
        limit: usize,
    ) -> Result<Vec<Note>>;

    /// Insert a metadata row. The payload carries no owner; the service binds
    /// it from the authenticated identity.
    async fn insert_note(&self, access_token: &str, new_note: &NewNote) -> Result<Note>;

    /// Fetch one note by id.
    async fn fetch_note(&self, access_token: Option<&str>, id: Uuid) -> Result<Note>;
}

// =============================================================================
// REST CLIENT
// =============================================================================

/// PostgREST-compatible REST client for the notes table.
pub struct RestDataBackend {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestDataBackend {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/rest/v1", config.base()),
            anon_key: config.anon_key.clone(),
        }
    }

    fn notes_url(&self) -> String {
        format!("{}/{}", self.base_url, NOTES_TABLE)
    }

    /// Bearer token for a request: the user's token when signed in, the anon
    /// key otherwise (the service expects both headers either way).
    fn bearer<'a>(&'a self, access_token: Option<&'a str>) -> &'a str {
        access_token.unwrap_or(&self.anon_key)
    }

    /// The `or=(...)` disjunction matching the query against title,
    /// description, and author, case-insensitively. Characters that are
    /// grammar to the filter syntax are dropped from the pattern.
    fn ilike_disjunction(query: &str) -> String {
        let cleaned: String = query
            .chars()
            .filter(|c| !matches!(c, ',' | '(' | ')' | '"'))
            .collect();
        let pattern = format!("*{}*", cleaned);
        format!(
            "(title.ilike.{p},description.ilike.{p},author.ilike.{p})",
            p = pattern
        )
    }

    async fn read_failure(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_response(Service::Data, status, &body)
    }
}

#[async_trait]
impl DataBackend for RestDataBackend {
    #[instrument(skip(self, access_token), fields(subsystem = "data", component = "rest_data", op = "list_notes", query = %filter.query, category = filter.category.as_str()))]
    async fn list_notes(
        &self,
        access_token: Option<&str>,
        filter: &FilterState,
        limit: usize,
    ) -> Result<Vec<Note>> {
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", format!("{}.desc", CATALOG_ORDER_COLUMN)),
            ("limit", limit.to_string()),
        ];
        if let CategoryFilter::Only(category) = filter.category {
            params.push(("category", format!("eq.{}", category)));
        }
        if !filter.query.is_empty() {
            params.push(("or", Self::ilike_disjunction(&filter.query)));
        }

        let response = self
            .client
            .get(self.notes_url())
            .query(&params)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer(access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        let notes: Vec<Note> = response.json().await?;
        debug!(result_count = notes.len(), "Catalog page fetched");
        Ok(notes)
    }

    #[instrument(skip(self, access_token, new_note), fields(subsystem = "data", component = "rest_data", op = "insert_note"))]
    async fn insert_note(&self, access_token: &str, new_note: &NewNote) -> Result<Note> {
        let response = self
            .client
            .post(self.notes_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .header("Prefer", "return=representation")
            .json(new_note)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        // Representation comes back as a one-row array.
        let mut rows: Vec<Note> = response.json().await?;
        rows.pop()
            .ok_or_else(|| Error::Request("Insert returned no row.".into()))
    }

    #[instrument(skip(self, access_token), fields(subsystem = "data", component = "rest_data", op = "fetch_note", note_id = %id))]
    async fn fetch_note(&self, access_token: Option<&str>, id: Uuid) -> Result<Note> {
        let response = self
            .client
            .get(self.notes_url())
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", id)),
                ("limit", "1".to_string()),
            ])
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer(access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.read_failure(response).await);
        }

        let mut rows: Vec<Note> = response.json().await?;
        rows.pop().ok_or(Error::NoteNotFound(id))
    }
}

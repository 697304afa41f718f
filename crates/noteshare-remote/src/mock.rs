//! In-memory mock backends for deterministic testing.
//!
//! Mirrors the remote services closely enough for orchestrator and catalog
//! logic to be exercised without a network: the data mock applies the same
//! filter predicate the real service applies server-side, and injected
//! failures pass through the same message classifier real failures do.
//!
//! Every operation is recorded in a call log so tests can assert what did —
//! and, just as often, what did not — reach a service.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use noteshare_core::{
    filter, Error, FilterState, NewNote, Note, Result, Session, SignUpOutcome, UserIdentity,
};

use crate::auth::AuthBackend;
use crate::data::DataBackend;
use crate::error::classify_message;
use crate::storage::{ObjectEntry, StorageBackend, StoredObject};

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub detail: String,
}

fn record(log: &Mutex<Vec<MockCall>>, operation: &str, detail: impl Into<String>) {
    log.lock().unwrap().push(MockCall {
        operation: operation.to_string(),
        detail: detail.into(),
    });
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Default)]
struct AuthState {
    /// email -> (password, user id)
    users: HashMap<String, (String, Uuid)>,
    /// refresh_token -> session
    issued: HashMap<String, Session>,
    autoconfirm: bool,
}

/// Mock auth backend with registered users and issued-session tracking.
#[derive(Clone, Default)]
pub struct MockAuthBackend {
    state: Arc<Mutex<AuthState>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user that can sign in.
    pub fn with_user(self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(email.into(), (password.into(), Uuid::new_v4()));
        self
    }

    /// Issue sessions directly from sign-up instead of requiring email
    /// verification.
    pub fn with_autoconfirm(self) -> Self {
        self.state.lock().unwrap().autoconfirm = true;
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    fn issue(&self, user_id: Uuid, email: &str) -> Session {
        let session = Session {
            access_token: format!("access-{}", Uuid::new_v4()),
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            expires_at: Utc::now() + Duration::hours(1),
            user: UserIdentity {
                id: user_id,
                email: Some(email.to_string()),
            },
        };
        self.state
            .lock()
            .unwrap()
            .issued
            .insert(session.refresh_token.clone(), session.clone());
        session
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        record(&self.calls, "sign_in", email);
        let user_id = {
            let state = self.state.lock().unwrap();
            match state.users.get(email) {
                Some((stored, id)) if stored == password => *id,
                _ => return Err(classify_message("Invalid login credentials")),
            }
        };
        Ok(self.issue(user_id, email))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _redirect_to: &str,
    ) -> Result<SignUpOutcome> {
        record(&self.calls, "sign_up", email);
        let (user_id, autoconfirm) = {
            let mut state = self.state.lock().unwrap();
            if state.users.contains_key(email) {
                return Err(classify_message("User already registered"));
            }
            let id = Uuid::new_v4();
            state.users.insert(email.into(), (password.into(), id));
            (id, state.autoconfirm)
        };
        Ok(SignUpOutcome {
            session: autoconfirm.then(|| self.issue(user_id, email)),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        record(&self.calls, "sign_out", access_token);
        self.state
            .lock()
            .unwrap()
            .issued
            .retain(|_, s| s.access_token != access_token);
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        record(&self.calls, "refresh", refresh_token);
        let old = {
            let mut state = self.state.lock().unwrap();
            state.issued.remove(refresh_token)
        };
        match old {
            Some(session) => Ok(self.issue(
                session.user.id,
                session.user.email.as_deref().unwrap_or_default(),
            )),
            None => Err(Error::AuthRequired("refresh token not recognized".into())),
        }
    }

    async fn request_password_reset(&self, email: &str, _redirect_to: &str) -> Result<()> {
        record(&self.calls, "recover", email);
        Ok(())
    }

    async fn user_info(&self, access_token: &str) -> Result<UserIdentity> {
        record(&self.calls, "user_info", access_token);
        let state = self.state.lock().unwrap();
        state
            .issued
            .values()
            .find(|s| s.access_token == access_token)
            .map(|s| s.user.clone())
            .ok_or_else(|| Error::AuthRequired("invalid access token".into()))
    }
}

// =============================================================================
// STORAGE
// =============================================================================

#[derive(Default)]
struct StorageState {
    objects: HashMap<String, Vec<u8>>,
    fail_uploads: Option<String>,
}

/// Mock storage backend holding objects in memory.
#[derive(Clone)]
pub struct MockStorageBackend {
    state: Arc<Mutex<StorageState>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    public_urls: bool,
}

impl Default for MockStorageBackend {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            calls: Arc::default(),
            public_urls: true,
        }
    }
}

impl MockStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a private bucket that issues no public URLs.
    pub fn with_private_bucket(mut self) -> Self {
        self.public_urls = false;
        self
    }

    /// Make every upload fail with the given raw service message, which is
    /// classified the same way a live failure would be.
    pub fn with_upload_failure(self, raw_message: impl Into<String>) -> Self {
        self.state.lock().unwrap().fail_uploads = Some(raw_message.into());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls that wrote to (or attempted to write to) storage.
    pub fn upload_call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "upload_object")
            .count()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state.lock().unwrap().objects.contains_key(path)
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }
}

#[async_trait]
impl StorageBackend for MockStorageBackend {
    async fn upload_object(
        &self,
        _access_token: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject> {
        record(&self.calls, "upload_object", path);
        let mut state = self.state.lock().unwrap();
        if let Some(raw) = &state.fail_uploads {
            return Err(classify_message(raw));
        }
        if state.objects.contains_key(path) {
            return Err(Error::Conflict("The resource already exists".into()));
        }
        state.objects.insert(path.to_string(), bytes);
        Ok(StoredObject {
            path: path.to_string(),
        })
    }

    fn public_url(&self, path: &str) -> Option<String> {
        self.public_urls
            .then(|| format!("https://storage.mock/object/public/notes/{}", path))
    }

    async fn list_objects(&self, prefix: &str, limit: usize) -> Result<Vec<ObjectEntry>> {
        record(&self.calls, "list_objects", prefix);
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .take(limit)
            .map(|k| ObjectEntry { name: k.clone() })
            .collect())
    }

    async fn remove_object(&self, _access_token: &str, path: &str) -> Result<()> {
        record(&self.calls, "remove_object", path);
        let mut state = self.state.lock().unwrap();
        match state.objects.remove(path) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("object {} not found", path))),
        }
    }
}

// =============================================================================
// DATA
// =============================================================================

#[derive(Default)]
struct DataState {
    rows: Vec<Note>,
    fail_filtered: bool,
    fail_insert: Option<String>,
}

/// Mock data backend over an in-memory notes table.
///
/// `list_notes` applies the shared filter predicate, so it behaves exactly
/// like the server-side `eq`/`ilike` path is specified to.
#[derive(Clone, Default)]
pub struct MockDataBackend {
    state: Arc<Mutex<DataState>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockDataBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: Vec<Note>) -> Self {
        self.state.lock().unwrap().rows = rows;
        self
    }

    /// Make filtered queries fail while the unfiltered page still succeeds —
    /// the situation the catalog's local fallback exists for.
    pub fn with_failing_filtered_queries(self) -> Self {
        self.state.lock().unwrap().fail_filtered = true;
        self
    }

    /// Make every insert fail with the given raw service message.
    pub fn with_insert_failure(self, raw_message: impl Into<String>) -> Self {
        self.state.lock().unwrap().fail_insert = Some(raw_message.into());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }
}

#[async_trait]
impl DataBackend for MockDataBackend {
    async fn list_notes(
        &self,
        _access_token: Option<&str>,
        filter_state: &FilterState,
        limit: usize,
    ) -> Result<Vec<Note>> {
        record(
            &self.calls,
            "list_notes",
            format!("q={} cat={}", filter_state.query, filter_state.category.as_str()),
        );
        let state = self.state.lock().unwrap();
        if state.fail_filtered && !filter_state.is_empty() {
            return Err(Error::Request("filter expression rejected".into()));
        }
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut rows = filter::apply(rows, filter_state);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert_note(&self, _access_token: &str, new_note: &NewNote) -> Result<Note> {
        record(&self.calls, "insert_note", new_note.title.clone());
        let mut state = self.state.lock().unwrap();
        if let Some(raw) = &state.fail_insert {
            return Err(classify_message(raw));
        }
        let note = Note {
            id: Uuid::new_v4(),
            title: new_note.title.clone(),
            description: Some(new_note.description.clone()).filter(|s| !s.is_empty()),
            author: Some(new_note.author.clone()).filter(|s| !s.is_empty()),
            category: new_note.category,
            file_path: new_note.file_path.clone(),
            file_size: new_note.file_size,
            public_url: new_note.public_url.clone(),
            created_at: Utc::now(),
            owner: None,
        };
        state.rows.push(note.clone());
        Ok(note)
    }

    async fn fetch_note(&self, _access_token: Option<&str>, id: Uuid) -> Result<Note> {
        record(&self.calls, "fetch_note", id.to_string());
        let state = self.state.lock().unwrap();
        state
            .rows
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(Error::NoteNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noteshare_core::{Category, CategoryFilter};

    fn new_note(title: &str, category: Category) -> NewNote {
        NewNote {
            title: title.to_string(),
            description: String::new(),
            author: String::new(),
            category,
            file_path: format!("u/2026/03/1_{}.pdf", title.to_lowercase()),
            file_size: 1024,
            public_url: None,
        }
    }

    #[tokio::test]
    async fn test_auth_mock_sign_in_roundtrip() {
        let auth = MockAuthBackend::new().with_user("a@example.com", "hunter2pass");
        let session = auth.sign_in("a@example.com", "hunter2pass").await.unwrap();
        let user = auth.user_info(&session.access_token).await.unwrap();
        assert_eq!(user.id, session.user.id);

        assert!(auth.sign_in("a@example.com", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn test_auth_mock_refresh_rotates() {
        let auth = MockAuthBackend::new().with_user("a@example.com", "hunter2pass");
        let first = auth.sign_in("a@example.com", "hunter2pass").await.unwrap();
        let second = auth.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.access_token, second.access_token);
        // The old refresh token is spent.
        assert!(auth.refresh(&first.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_storage_mock_no_overwrite() {
        let storage = MockStorageBackend::new();
        storage
            .upload_object("t", "a/b.pdf", vec![1], "application/pdf")
            .await
            .unwrap();
        let err = storage
            .upload_object("t", "a/b.pdf", vec![2], "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_storage_mock_private_bucket_has_no_public_url() {
        let storage = MockStorageBackend::new().with_private_bucket();
        assert!(storage.public_url("a/b.pdf").is_none());
    }

    #[tokio::test]
    async fn test_data_mock_orders_most_recent_first() {
        let data = MockDataBackend::new();
        data.insert_note("t", &new_note("First", Category::Math))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        data.insert_note("t", &new_note("Second", Category::Math))
            .await
            .unwrap();

        let rows = data
            .list_notes(None, &FilterState::default(), 200)
            .await
            .unwrap();
        assert_eq!(rows[0].title, "Second");
        assert_eq!(rows[1].title, "First");
    }

    #[tokio::test]
    async fn test_data_mock_filtered_failure_switch() {
        let data = MockDataBackend::new().with_failing_filtered_queries();
        let filtered = FilterState::new("x", CategoryFilter::All);
        assert!(data.list_notes(None, &filtered, 200).await.is_err());
        assert!(data
            .list_notes(None, &FilterState::default(), 200)
            .await
            .is_ok());
    }
}

//! Upload orchestrator.
//!
//! Drives one upload through its phases:
//! `idle → validating → authorizing → uploading → inserting → done | failed`.
//!
//! Sequencing invariant: the storage write completes before the metadata
//! insert is attempted, and nothing touches the network until validation and
//! authorization pass. The storage-then-insert pair is not transactional;
//! when the insert fails the uploaded object is deleted best-effort, and a
//! cleanup failure is surfaced as a warning instead of being silently
//! ignored.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use noteshare_core::defaults::PDF_CONTENT_TYPE;
use noteshare_core::{
    storage_key, validate_upload, Category, Error, NewNote, Note, SelectedFile, ServiceConfig,
};
use noteshare_remote::{DataBackend, StorageBackend};

use crate::session::SessionManager;

/// Orchestrator phase, visible in failure reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    Validating,
    Authorizing,
    Uploading,
    Inserting,
    Done,
    Failed,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Validating => "validating",
            UploadPhase::Authorizing => "authorizing",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Inserting => "inserting",
            UploadPhase::Done => "done",
            UploadPhase::Failed => "failed",
        }
    }
}

/// One upload submission.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub author: String,
    pub category: Category,
    pub file: SelectedFile,
}

/// Successful upload result.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub note: Note,
    /// Non-fatal condition the user should see (e.g. no public URL issued).
    pub warning: Option<String>,
}

/// Failed upload, annotated with the phase that failed.
#[derive(Debug)]
pub struct UploadFailure {
    pub phase: UploadPhase,
    pub error: Error,
    /// Set when compensating cleanup itself failed and an orphaned object
    /// may remain in storage.
    pub cleanup_warning: Option<String>,
}

impl UploadFailure {
    fn at(phase: UploadPhase, error: Error) -> Self {
        Self {
            phase,
            error,
            cleanup_warning: None,
        }
    }
}

/// Upload orchestrator. Cheap to clone; all state is shared handles.
#[derive(Clone)]
pub struct UploadOrchestrator {
    storage: Arc<dyn StorageBackend>,
    data: Arc<dyn DataBackend>,
    sessions: SessionManager,
    refresh: Arc<AtomicU64>,
    max_upload_bytes: u64,
}

impl UploadOrchestrator {
    pub fn new(
        config: &ServiceConfig,
        storage: Arc<dyn StorageBackend>,
        data: Arc<dyn DataBackend>,
        sessions: SessionManager,
        refresh: Arc<AtomicU64>,
    ) -> Self {
        Self {
            storage,
            data,
            sessions,
            refresh,
            max_upload_bytes: config.max_upload_bytes(),
        }
    }

    /// Run one upload to completion.
    #[instrument(skip(self, request), fields(subsystem = "upload", component = "orchestrator", op = "run", file_size = request.file.size()))]
    pub async fn run(&self, request: UploadRequest) -> Result<UploadOutcome, UploadFailure> {
        // validating
        debug!(phase = UploadPhase::Validating.as_str(), "Upload started");
        if request.title.trim().is_empty() {
            return Err(UploadFailure::at(
                UploadPhase::Validating,
                Error::Validation("Title is required.".into()),
            ));
        }
        validate_upload(&request.file, self.max_upload_bytes)
            .map_err(|e| UploadFailure::at(UploadPhase::Validating, e))?;

        // authorizing
        let session = self.sessions.current().await.ok_or_else(|| {
            UploadFailure::at(
                UploadPhase::Authorizing,
                Error::AuthRequired("You are not signed in. Please log in to upload notes.".into()),
            )
        })?;

        // uploading
        let key = storage_key(session.user.id, Utc::now(), &request.file.name);
        let stored = self
            .storage
            .upload_object(
                &session.access_token,
                &key,
                request.file.bytes.clone(),
                PDF_CONTENT_TYPE,
            )
            .await
            .map_err(|e| UploadFailure::at(UploadPhase::Uploading, e))?;

        // A private bucket yields no public URL; insert anyway and warn.
        let public_url = self.storage.public_url(&stored.path);
        let warning = public_url.is_none().then(|| {
            "Upload succeeded, but the preview URL is not public. Make the storage bucket \
             public or switch to signed URLs."
                .to_string()
        });

        // inserting
        let new_note = NewNote {
            title: request.title.trim().to_string(),
            description: request.description,
            author: request.author,
            category: request.category,
            file_path: stored.path.clone(),
            file_size: request.file.size() as i64,
            public_url,
        };
        let note = match self.data.insert_note(&session.access_token, &new_note).await {
            Ok(note) => note,
            Err(err) => {
                return Err(self
                    .compensate(&session.access_token, &stored.path, err)
                    .await);
            }
        };

        // done
        let epoch = self.refresh.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            note_id = %note.id,
            object_path = %stored.path,
            refresh_epoch = epoch,
            success = true,
            "Upload complete"
        );
        Ok(UploadOutcome { note, warning })
    }

    /// Delete the orphaned object after a failed insert, best-effort.
    async fn compensate(&self, access_token: &str, path: &str, error: Error) -> UploadFailure {
        let cleanup_warning = match self.storage.remove_object(access_token, path).await {
            Ok(()) => {
                info!(object_path = %path, "Removed orphaned object after failed insert");
                None
            }
            Err(cleanup_err) => {
                warn!(
                    object_path = %path,
                    error = %cleanup_err,
                    "Failed to remove orphaned object after failed insert"
                );
                Some(format!(
                    "The uploaded file could not be removed after the failure; an orphaned \
                     object may remain at {}.",
                    path
                ))
            }
        };
        UploadFailure {
            phase: UploadPhase::Inserting,
            error,
            cleanup_warning,
        }
    }
}

/// Friendly message for an upload failure, mirroring the remediation text
/// the upload form has always shown.
pub fn friendly_upload_message(err: &Error) -> String {
    match err {
        Error::Validation(msg) => msg.clone(),
        Error::AuthRequired(_) => "Please sign in to upload notes. Log in and try again.".into(),
        Error::PolicyDenied(_) => {
            "Upload unauthorized. Please log in and ensure a storage policy allows inserts to \
             the notes bucket."
                .into()
        }
        Error::BucketNotFound(_) => {
            "Storage bucket \"notes\" not found. Create a public bucket named \"notes\" in the \
             storage dashboard."
                .into()
        }
        Error::Network(_) => {
            "Network error during upload. Check your connection and the service URL.".into()
        }
        Error::Conflict(_) => {
            "A file with this name already exists. Please try again (a timestamp prefix is \
             used to avoid collisions)."
                .into()
        }
        Error::RowPolicy(_) => {
            "Database insert blocked by row-level security. Ensure you are signed in, the owner \
             column defaults to the authenticated identity, and the insert policy for \
             authenticated users is present."
                .into()
        }
        other => other.to_string(),
    }
}

//! Upload route handler.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use noteshare_core::defaults::UPLOAD_CLOSE_DELAY_MS;
use noteshare_core::{Category, Error, SelectedFile};

use crate::state::AppState;
use crate::upload::{friendly_upload_message, UploadRequest};
use crate::views::{NoteCardView, UploadAcceptedView, UploadErrorView};

use super::{error_status, ApiError};

const TROUBLESHOOT_SUFFIX: &str = " (See Troubleshoot for help)";

/// `POST /upload` — multipart form: title, description, author, category,
/// file.
pub async fn upload_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = read_form(multipart).await?;

    match state.uploader.run(request).await {
        Ok(outcome) => {
            let view = UploadAcceptedView {
                note: NoteCardView::from(&outcome.note),
                message: "Upload complete! Your note was added to the library.",
                warning: outcome.warning,
                close_delay_ms: UPLOAD_CLOSE_DELAY_MS,
            };
            Ok((StatusCode::CREATED, Json(view)).into_response())
        }
        Err(failure) => {
            let view = UploadErrorView {
                phase: failure.phase,
                error: friendly_upload_message(&failure.error) + TROUBLESHOOT_SUFFIX,
                warning: failure.cleanup_warning,
            };
            Ok((error_status(&failure.error), Json(view)).into_response())
        }
    }
}

/// Pull the upload fields out of the multipart body. Unknown fields are
/// ignored; a missing file becomes an empty selection the validator rejects.
async fn read_form(mut multipart: Multipart) -> Result<UploadRequest, Error> {
    let mut title = String::new();
    let mut description = String::new();
    let mut author = String::new();
    let mut category = Category::Other;
    let mut file: Option<SelectedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Malformed upload form: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = read_text(field).await?,
            Some("description") => description = read_text(field).await?,
            Some("author") => author = read_text(field).await?,
            Some("category") => {
                category = read_text(field)
                    .await?
                    .parse()
                    .unwrap_or(Category::Other);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("document.pdf")
                    .to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Failed to read file: {}", e)))?
                    .to_vec();
                file = Some(SelectedFile {
                    name: file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(UploadRequest {
        title,
        description,
        author,
        category,
        file: file.unwrap_or(SelectedFile {
            name: String::new(),
            content_type: String::new(),
            bytes: Vec::new(),
        }),
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, Error> {
    field
        .text()
        .await
        .map_err(|e| Error::Validation(format!("Malformed upload form: {}", e)))
}

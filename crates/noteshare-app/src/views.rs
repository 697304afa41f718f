//! View models returned by the route layer.
//!
//! Each view is a plain serializable struct assembled from component output;
//! the route layer owns no logic beyond this mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use noteshare_core::Note;

use crate::diagnostics::ProbeReport;
use crate::upload::UploadPhase;

/// One catalog card.
#[derive(Debug, Clone, Serialize)]
pub struct NoteCardView {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub category_label: String,
    pub size_mb: String,
    pub created_at: DateTime<Utc>,
    pub preview_path: String,
    pub download_url: Option<String>,
}

impl From<&Note> for NoteCardView {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            author: note.author.clone(),
            description: note.description.clone(),
            category: note.category.as_str().to_string(),
            category_label: note.category.label().to_string(),
            size_mb: note.size_mb(),
            created_at: note.created_at,
            preview_path: format!("/preview/{}", note.id),
            download_url: note.public_url.clone(),
        }
    }
}

/// The catalog view: filter state plus cards, most recent first.
#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub query: String,
    pub category: String,
    pub notes: Vec<NoteCardView>,
    /// True when the page came through the locally-filtered fallback path.
    pub fallback: bool,
    pub signed_in: bool,
    pub refresh_epoch: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CatalogView {
    pub fn empty_message(&self) -> &'static str {
        "No notes found. Try a different search or category."
    }
}

/// The authentication view (login / signup / reset modes share it).
#[derive(Debug, Serialize)]
pub struct AuthView {
    pub mode: &'static str,
    pub signed_in: bool,
    /// Redirect target shown so operators can allow-list it.
    pub site_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Outstanding password policy issues, sign-up mode only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub password_issues: Vec<&'static str>,
}

impl AuthView {
    pub fn for_mode(mode: &'static str, site_url: String) -> Self {
        Self {
            mode,
            signed_in: false,
            site_url,
            error: None,
            info: None,
            password_issues: Vec::new(),
        }
    }

    pub fn login(site_url: String) -> Self {
        Self::for_mode("login", site_url)
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_info(mut self, info: String) -> Self {
        self.info = Some(info);
        self
    }
}

/// The friendly auth error page.
#[derive(Debug, Serialize)]
pub struct AuthErrorView {
    pub error_type: String,
    pub title: &'static str,
    pub message: &'static str,
}

impl AuthErrorView {
    pub fn for_type(error_type: &str) -> Self {
        let (title, message) = match error_type {
            "redirect" => (
                "Redirect Configuration Issue",
                "We could not complete the login redirect. Ensure the auth service's URL \
                 settings include this site URL and try again.",
            ),
            "email" => (
                "Email Issue",
                "We had trouble with your email confirmation or verification. Please check \
                 your inbox and try again.",
            ),
            "expired" => (
                "Link Expired",
                "This sign-in link has expired or was already used. Please request a new \
                 login link or try signing in again.",
            ),
            _ => (
                "Authentication Error",
                "Something went wrong during sign-in. Please try again. If the problem \
                 persists, contact support.",
            ),
        };
        Self {
            error_type: error_type.to_string(),
            title,
            message,
        }
    }
}

/// Guidance shown when a preview target is not reachable.
#[derive(Debug, Serialize)]
pub struct PreviewGuidance {
    pub message: &'static str,
    pub hints: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl PreviewGuidance {
    pub fn unavailable(file_path: Option<String>) -> Self {
        Self {
            message: "This file is unavailable or the storage bucket's public access is not \
                      enabled.",
            hints: vec![
                "Check the storage bucket policies and the stored public URL.",
                "Ensure the notes bucket is public, or switch to signed URLs and update the app.",
                "Confirm a valid public URL was stored for this note record.",
            ],
            file_path,
        }
    }
}

/// The preview view: either an embeddable target or a guidance panel.
#[derive(Debug, Serialize)]
pub struct PreviewView {
    pub note: NoteCardView,
    /// True when the public URL is well-formed and reachable.
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<PreviewGuidance>,
}

/// The profile view.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// The diagnostics view.
#[derive(Debug, Serialize)]
pub struct TroubleshootView {
    pub results: Vec<ProbeReport>,
    pub site_url: String,
}

/// Response for an accepted upload.
#[derive(Debug, Serialize)]
pub struct UploadAcceptedView {
    pub note: NoteCardView,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// How long the form stays open before closing, in milliseconds.
    pub close_delay_ms: u64,
}

/// Response for a failed upload.
#[derive(Debug, Serialize)]
pub struct UploadErrorView {
    pub phase: UploadPhase,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use noteshare_core::Category;

    fn note() -> Note {
        Note {
            id: Uuid::nil(),
            title: "Linear Algebra Notes".into(),
            description: Some("Eigen-everything".into()),
            author: Some("G. Strang".into()),
            category: Category::Math,
            file_path: "u/2026/03/1_doc.pdf".into(),
            file_size: 2 * 1024 * 1024,
            public_url: Some("https://cdn.example/doc.pdf".into()),
            created_at: Utc::now(),
            owner: None,
        }
    }

    #[test]
    fn test_card_view_from_note() {
        let card = NoteCardView::from(&note());
        assert_eq!(card.category, "math");
        assert_eq!(card.category_label, "Mathematics");
        assert_eq!(card.size_mb, "2.00");
        assert_eq!(card.preview_path, format!("/preview/{}", Uuid::nil()));
        assert_eq!(card.download_url.as_deref(), Some("https://cdn.example/doc.pdf"));
    }

    #[test]
    fn test_auth_error_view_types() {
        assert_eq!(
            AuthErrorView::for_type("redirect").title,
            "Redirect Configuration Issue"
        );
        assert_eq!(AuthErrorView::for_type("email").title, "Email Issue");
        assert_eq!(AuthErrorView::for_type("expired").title, "Link Expired");
        assert_eq!(
            AuthErrorView::for_type("whatever").title,
            "Authentication Error"
        );
    }

    #[test]
    fn test_guidance_carries_file_path() {
        let g = PreviewGuidance::unavailable(Some("u/2026/03/1_doc.pdf".into()));
        assert_eq!(g.file_path.as_deref(), Some("u/2026/03/1_doc.pdf"));
        assert_eq!(g.hints.len(), 3);
    }
}

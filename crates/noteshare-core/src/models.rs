//! Core data models for noteshare.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// CATEGORY
// =============================================================================

/// Fixed category set for note records.
///
/// Rows carrying a value outside the set (or no value at all) deserialize to
/// [`Category::Other`], matching how the catalog treats missing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Math,
    Cs,
    Physics,
    Biology,
    Business,
    Literature,
    #[default]
    Other,
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Unknown and null category values fold to Other instead of failing
        // the whole row.
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .and_then(|v| v.parse().ok())
            .unwrap_or(Category::Other))
    }
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 7] = [
        Category::Math,
        Category::Cs,
        Category::Physics,
        Category::Biology,
        Category::Business,
        Category::Literature,
        Category::Other,
    ];

    /// Wire value used by the data service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Math => "math",
            Category::Cs => "cs",
            Category::Physics => "physics",
            Category::Biology => "biology",
            Category::Business => "business",
            Category::Literature => "literature",
            Category::Other => "other",
        }
    }

    /// Human-readable label for views.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Math => "Mathematics",
            Category::Cs => "Computer Science",
            Category::Physics => "Physics",
            Category::Biology => "Biology",
            Category::Business => "Business",
            Category::Literature => "Literature",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "math" => Ok(Category::Math),
            "cs" => Ok(Category::Cs),
            "physics" => Ok(Category::Physics),
            "biology" => Ok(Category::Biology),
            "business" => Ok(Category::Business),
            "literature" => Ok(Category::Literature),
            "other" => Ok(Category::Other),
            other => Err(Error::Validation(format!("unknown category: {}", other))),
        }
    }
}

// =============================================================================
// NOTE
// =============================================================================

/// A metadata record describing one uploaded PDF document.
///
/// Created once by the upload orchestrator; immutable from the client's
/// perspective thereafter. `owner` is assigned by the data service from the
/// authenticated identity at insert time and never set by this code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Category,
    pub file_path: String,
    pub file_size: i64,
    #[serde(default)]
    pub public_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub owner: Option<Uuid>,
}

impl Note {
    /// File size in megabytes, rendered the way cards display it.
    pub fn size_mb(&self) -> String {
        format!("{:.2}", self.file_size as f64 / (1024.0 * 1024.0))
    }
}

/// Insert payload for a new note row.
///
/// Deliberately has no `owner`, `id`, or `created_at` fields so the data
/// service's defaults (identity binding, key generation, timestamps) apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub description: String,
    pub author: String,
    pub category: Category,
    pub file_path: String,
    pub file_size: i64,
    pub public_url: Option<String>,
}

// =============================================================================
// SESSION
// =============================================================================

/// The identity inside a session, as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated identity token bundle issued by the remote auth service.
///
/// Sessions are immutable snapshots; token rotation produces a new value
/// through the session store rather than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserIdentity,
}

impl Session {
    /// Whether the access token's lifetime has elapsed.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Result of a sign-up attempt.
///
/// Most deployments require email verification, in which case no session is
/// issued until the redirect callback completes.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub session: Option<Session>,
}

impl SignUpOutcome {
    /// True when the user must follow the emailed verification link.
    pub fn verification_pending(&self) -> bool {
        self.session.is_none()
    }
}

// =============================================================================
// FILTER STATE
// =============================================================================

/// Category side of the filter: a concrete category or no restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(c) => c.as_str(),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(s.parse()?))
        }
    }
}

/// Catalog filter state, synchronized with the `q` and `cat` URL parameters.
///
/// Has no server-side persistence; each view derives it from the request and
/// links re-encode it, so the address bar stays the source of truth.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub query: String,
    pub category: CategoryFilter,
}

impl FilterState {
    pub fn new(query: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            query: query.into().trim().to_string(),
            category,
        }
    }

    /// Parse from the raw `q`/`cat` query parameters. Unknown categories fall
    /// back to no restriction rather than erroring the whole view.
    pub fn from_params(q: Option<&str>, cat: Option<&str>) -> Self {
        let query = q.unwrap_or("").trim().to_string();
        let category = cat
            .and_then(|c| c.parse::<CategoryFilter>().ok())
            .unwrap_or(CategoryFilter::All);
        Self { query, category }
    }

    /// Encode back into URL parameters. Blank queries and the "all" category
    /// are omitted, matching the original address-bar contract.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.query.is_empty() {
            params.push(("q", self.query.clone()));
        }
        if let CategoryFilter::Only(c) = self.category {
            params.push(("cat", c.as_str().to_string()));
        }
        params
    }

    /// True when no server-side filtering would be requested.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.category == CategoryFilter::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for cat in Category::ALL {
            let parsed: Category = cat.as_str().parse().unwrap();
            assert_eq!(parsed, cat);
        }
    }

    #[test]
    fn test_category_unknown_value_deserializes_to_other() {
        let cat: Category = serde_json::from_str("\"underwater-basketry\"").unwrap();
        assert_eq!(cat, Category::Other);
    }

    #[test]
    fn test_category_null_deserializes_to_other() {
        let cat: Category = serde_json::from_str("null").unwrap();
        assert_eq!(cat, Category::Other);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Cs).unwrap(), "\"cs\"");
    }

    #[test]
    fn test_note_missing_category_defaults_to_other() {
        let json = serde_json::json!({
            "id": Uuid::nil(),
            "title": "Untitled",
            "file_path": "u/2026/03/1_doc.pdf",
            "file_size": 1024,
            "created_at": "2026-03-01T12:00:00Z"
        });
        let note: Note = serde_json::from_value(json).unwrap();
        assert_eq!(note.category, Category::Other);
        assert!(note.public_url.is_none());
    }

    #[test]
    fn test_note_size_mb_two_decimals() {
        let note = Note {
            id: Uuid::nil(),
            title: "t".into(),
            description: None,
            author: None,
            category: Category::Other,
            file_path: "p".into(),
            file_size: 3 * 1024 * 1024 / 2,
            public_url: None,
            created_at: Utc::now(),
            owner: None,
        };
        assert_eq!(note.size_mb(), "1.50");
    }

    #[test]
    fn test_new_note_has_no_owner_field() {
        let new = NewNote {
            title: "Algebra".into(),
            description: String::new(),
            author: String::new(),
            category: Category::Math,
            file_path: "u/2026/03/1_algebra.pdf".into(),
            file_size: 1024,
            public_url: None,
        };
        let value = serde_json::to_value(&new).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(!keys.contains(&"owner"));
        assert!(!keys.contains(&"id"));
        assert!(!keys.contains(&"created_at"));
    }

    #[test]
    fn test_session_expiry() {
        let session = Session {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
            user: UserIdentity {
                id: Uuid::nil(),
                email: None,
            },
        };
        assert!(session.is_expired());
    }

    #[test]
    fn test_filter_state_from_params() {
        let f = FilterState::from_params(Some("  linear  "), Some("math"));
        assert_eq!(f.query, "linear");
        assert_eq!(f.category, CategoryFilter::Only(Category::Math));
    }

    #[test]
    fn test_filter_state_unknown_category_falls_back_to_all() {
        let f = FilterState::from_params(None, Some("astrology"));
        assert_eq!(f.category, CategoryFilter::All);
    }

    #[test]
    fn test_filter_state_params_omit_defaults() {
        let f = FilterState::from_params(Some(""), Some("all"));
        assert!(f.to_params().is_empty());
        assert!(f.is_empty());
    }

    #[test]
    fn test_filter_state_param_roundtrip() {
        let f = FilterState::new("fourier", CategoryFilter::Only(Category::Physics));
        let params = f.to_params();
        let q = params.iter().find(|(k, _)| *k == "q").map(|(_, v)| v.as_str());
        let cat = params.iter().find(|(k, _)| *k == "cat").map(|(_, v)| v.as_str());
        let back = FilterState::from_params(q, cat);
        assert_eq!(back, f);
    }

    #[test]
    fn test_signup_outcome_pending() {
        let outcome = SignUpOutcome { session: None };
        assert!(outcome.verification_pending());
    }
}

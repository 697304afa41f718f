//! Service configuration.
//!
//! Environment-first configuration for the remote backend-as-a-service
//! endpoints consumed by this application. Loaded once at startup; the
//! structs are cheap to clone and passed to whichever component needs them.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | NOTESHARE_SERVICE_URL | (required) | Base URL of the remote service stack |
//! | NOTESHARE_SERVICE_KEY | (required) | Public (anon) API key |
//! | NOTESHARE_SITE_URL | (none) | Site URL used for auth redirects |
//! | NOTESHARE_MAX_UPLOAD_MB | 50 | Upload size ceiling in MiB |
//! | NOTESHARE_STORAGE_BUCKET | notes | Storage bucket for documents |

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::defaults;
use crate::error::{Error, Result};

/// Connection settings for the remote service stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the remote service stack (auth/storage/data share it).
    pub base_url: String,
    /// Public API key sent as the `apikey` header on every request.
    pub anon_key: String,
    /// Optional site URL override used to build auth redirect targets.
    pub site_url: Option<String>,
    /// Upload size ceiling in MiB.
    pub max_upload_mb: u64,
    /// Storage bucket holding uploaded documents.
    pub bucket: String,
}

impl ServiceConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("NOTESHARE_SERVICE_URL")
            .map_err(|_| Error::Config("NOTESHARE_SERVICE_URL is not set".into()))?;
        let anon_key = env::var("NOTESHARE_SERVICE_KEY")
            .map_err(|_| Error::Config("NOTESHARE_SERVICE_KEY is not set".into()))?;
        let site_url = env::var("NOTESHARE_SITE_URL").ok().filter(|s| !s.is_empty());
        let max_upload_mb = env::var("NOTESHARE_MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults::MAX_UPLOAD_MB);
        let bucket = env::var("NOTESHARE_STORAGE_BUCKET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults::STORAGE_BUCKET.to_string());

        let config = Self {
            base_url,
            anon_key,
            site_url,
            max_upload_mb,
            bucket,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("service base URL cannot be empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "service base URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if Url::parse(&self.base_url).is_err() {
            return Err(Error::Config(format!(
                "service base URL is not a valid URL: {}",
                self.base_url
            )));
        }
        if self.anon_key.is_empty() {
            return Err(Error::Config("service API key cannot be empty".into()));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed, for joining paths onto.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Upload size ceiling in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// The site URL auth redirects return to.
    ///
    /// Uses the configured override when present, the serving origin
    /// otherwise. Coerced to carry a scheme (https when missing) and a
    /// trailing slash — the auth service's allow-list is exact-match.
    pub fn redirect_site_url(&self, serving_origin: &str) -> String {
        let mut url = self
            .site_url
            .clone()
            .unwrap_or_else(|| serving_origin.to_string());

        if !url.starts_with("http") {
            url = format!("https://{}", url);
        }
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    }
}

/// Mask an API key for display: first six and last four characters.
pub fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    if key.len() <= 8 {
        return "********".to_string();
    }
    format!("{}...{}", &key[..6], &key[key.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServiceConfig {
        ServiceConfig {
            base_url: "https://xyz.example.co".into(),
            anon_key: "anon-public-key-12345".into(),
            site_url: None,
            max_upload_mb: 50,
            bucket: "notes".into(),
        }
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut cfg = sample();
        cfg.base_url = "xyz.example.co".into();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let mut cfg = sample();
        cfg.anon_key = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_base_strips_trailing_slash() {
        let mut cfg = sample();
        cfg.base_url = "https://xyz.example.co/".into();
        assert_eq!(cfg.base(), "https://xyz.example.co");
    }

    #[test]
    fn test_max_upload_bytes() {
        let cfg = sample();
        assert_eq!(cfg.max_upload_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_redirect_site_url_prefers_override() {
        let mut cfg = sample();
        cfg.site_url = Some("https://notes.example.org".into());
        assert_eq!(
            cfg.redirect_site_url("http://localhost:3000"),
            "https://notes.example.org/"
        );
    }

    #[test]
    fn test_redirect_site_url_coerces_scheme_and_slash() {
        let mut cfg = sample();
        cfg.site_url = Some("notes.example.org".into());
        assert_eq!(
            cfg.redirect_site_url("http://localhost:3000"),
            "https://notes.example.org/"
        );
    }

    #[test]
    fn test_redirect_site_url_falls_back_to_origin() {
        let cfg = sample();
        assert_eq!(
            cfg.redirect_site_url("http://localhost:3000"),
            "http://localhost:3000/"
        );
    }

    #[test]
    fn test_mask_key_short_and_long() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("abcd"), "********");
        assert_eq!(mask_key("anon-public-key-12345"), "anon-p...2345");
    }
}

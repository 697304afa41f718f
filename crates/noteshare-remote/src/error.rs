//! Remote error classification.
//!
//! The remote services expose no stable error taxonomy to clients, so raw
//! failures are mapped into the closed set in `noteshare_core::Error` in two
//! tiers: the HTTP status first, then keyword matching over the response
//! message. Keyword matching is best-effort by construction; the status tier
//! exists so the common cases never depend on message wording.

use noteshare_core::Error;
use reqwest::StatusCode;

/// Which remote service produced a response. A few statuses mean different
/// things per service (a storage 404 is a missing bucket or object, a data
/// 404 is a missing row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Auth,
    Storage,
    Data,
}

/// Pull the most useful human-readable message out of an error body.
///
/// The services respond with small JSON objects whose message field is named
/// inconsistently (`message`, `msg`, `error_description`, `error`); fall back
/// to the raw body when none parse.
pub fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    body.trim().to_string()
}

/// Classify a non-success HTTP response from a remote service.
pub fn classify_response(service: Service, status: StatusCode, body: &str) -> Error {
    let message = extract_message(body);

    match status {
        StatusCode::UNAUTHORIZED => {
            // A 401 carrying an API-key complaint is a deployment problem,
            // not a sign-in problem.
            let lower = message.to_lowercase();
            if lower.contains("apikey") || lower.contains("api key") || lower.contains("jwt") {
                Error::Config(message)
            } else {
                Error::AuthRequired(message)
            }
        }
        StatusCode::FORBIDDEN => classify_forbidden(&message),
        StatusCode::NOT_FOUND => match service {
            Service::Storage => Error::BucketNotFound(message),
            _ => Error::NotFound(message),
        },
        StatusCode::CONFLICT => Error::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(message),
        _ => classify_message(&message),
    }
}

/// A 403 is a policy denial unless the body names the row-level policy.
fn classify_forbidden(message: &str) -> Error {
    let lower = message.to_lowercase();
    if lower.contains("row-level security") || lower.contains("row level security") {
        Error::RowPolicy(message.to_string())
    } else {
        Error::PolicyDenied(message.to_string())
    }
}

/// Keyword tier: classify a bare error message.
///
/// This is the original client's behavior, kept as the fallback for statuses
/// the first tier does not pin down (the services put most detail in 400
/// bodies).
pub fn classify_message(raw: &str) -> Error {
    let msg = raw.to_lowercase();

    if msg.contains("must be logged in")
        || msg.contains("no current session")
        || msg.contains("not signed in")
        || msg.contains("invalid login credentials")
        || msg.contains("invalid_grant")
    {
        return Error::AuthRequired(raw.to_string());
    }
    if msg.contains("row-level security")
        || msg.contains("row level security")
        || msg.contains("violates row-level")
        || msg.contains("new row violates")
        || msg.contains("42501")
    {
        return Error::RowPolicy(raw.to_string());
    }
    if msg.contains("bucket") && msg.contains("not found") {
        return Error::BucketNotFound(raw.to_string());
    }
    if msg.contains("permission") || msg.contains("not authorized") || msg.contains("unauthorized")
    {
        return Error::PolicyDenied(raw.to_string());
    }
    if msg.contains("rate limit") || msg.contains("too many") {
        return Error::RateLimited(raw.to_string());
    }
    if msg.contains("duplicate") || msg.contains("already exists") || msg.contains("conflict") {
        return Error::Conflict(raw.to_string());
    }
    if msg.contains("network") || msg.contains("fetch") || msg.contains("connection") {
        return Error::Network(raw.to_string());
    }
    if msg.contains("apikey") || msg.contains("invalid api key") || msg.contains("jwt") {
        return Error::Config(raw.to_string());
    }
    if msg.contains("not found") {
        return Error::NotFound(raw.to_string());
    }

    Error::Request(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_from_json_variants() {
        assert_eq!(extract_message(r#"{"message":"boom"}"#), "boom");
        assert_eq!(extract_message(r#"{"msg":"boom"}"#), "boom");
        assert_eq!(
            extract_message(r#"{"error":"invalid_grant","error_description":"bad creds"}"#),
            "bad creds"
        );
        assert_eq!(extract_message("plain text"), "plain text");
    }

    #[test]
    fn test_401_maps_to_auth_required() {
        let err = classify_response(Service::Data, StatusCode::UNAUTHORIZED, r#"{"message":"JWS missing"}"#);
        // "jws" doesn't hit the apikey guard; plain 401 is auth-required
        assert!(matches!(err, Error::AuthRequired(_)));
    }

    #[test]
    fn test_401_with_api_key_complaint_is_config() {
        let err = classify_response(
            Service::Auth,
            StatusCode::UNAUTHORIZED,
            r#"{"message":"No API key found in request"}"#,
        );
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_403_row_level_security_is_row_policy() {
        let err = classify_response(
            Service::Data,
            StatusCode::FORBIDDEN,
            r#"{"message":"new row violates row-level security policy for table \"notes\""}"#,
        );
        assert!(matches!(err, Error::RowPolicy(_)));
    }

    #[test]
    fn test_403_other_is_policy_denied() {
        let err = classify_response(Service::Storage, StatusCode::FORBIDDEN, r#"{"message":"access denied"}"#);
        assert!(matches!(err, Error::PolicyDenied(_)));
    }

    #[test]
    fn test_storage_404_is_bucket_not_found() {
        let err = classify_response(
            Service::Storage,
            StatusCode::NOT_FOUND,
            r#"{"message":"Bucket not found"}"#,
        );
        assert!(matches!(err, Error::BucketNotFound(_)));
    }

    #[test]
    fn test_data_404_is_not_found() {
        let err = classify_response(Service::Data, StatusCode::NOT_FOUND, "{}");
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_409_is_conflict() {
        let err = classify_response(
            Service::Storage,
            StatusCode::CONFLICT,
            r#"{"message":"The resource already exists"}"#,
        );
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_429_is_rate_limited() {
        let err = classify_response(
            Service::Auth,
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"message":"email rate limit exceeded"}"#,
        );
        assert!(matches!(err, Error::RateLimited(_)));
    }

    #[test]
    fn test_keyword_invalid_credentials() {
        let err = classify_message("Invalid login credentials");
        assert!(matches!(err, Error::AuthRequired(_)));
    }

    #[test]
    fn test_keyword_row_level_security() {
        let err = classify_message("new row violates row-level security policy");
        assert!(matches!(err, Error::RowPolicy(_)));
    }

    #[test]
    fn test_keyword_bucket() {
        let err = classify_message("Bucket not found");
        assert!(matches!(err, Error::BucketNotFound(_)));
    }

    #[test]
    fn test_keyword_network() {
        let err = classify_message("network unreachable while contacting host");
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_keyword_unclassified_is_request() {
        let err = classify_message("something inexplicable");
        assert!(matches!(err, Error::Request(_)));
    }

    #[test]
    fn test_keyword_preserves_raw_message() {
        match classify_message("Bucket not found") {
            Error::BucketNotFound(msg) => assert_eq!(msg, "Bucket not found"),
            other => panic!("unexpected {:?}", other),
        }
    }
}

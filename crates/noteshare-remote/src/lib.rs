//! # noteshare-remote
//!
//! Trait-fronted HTTP clients for the three remote services the application
//! delegates to: authentication, object storage, and row data. Each service
//! is consumed strictly through its public REST contract (GoTrue, Storage
//! API, and PostgREST compatible, respectively) and treated as an opaque
//! network dependency with its own failure modes.
//!
//! The `mock` module provides in-memory implementations for tests.

pub mod auth;
pub mod data;
pub mod error;
pub mod mock;
pub mod storage;

pub use auth::{AuthBackend, RestAuthBackend, SessionStore};
pub use data::{DataBackend, RestDataBackend};
pub use error::{classify_message, classify_response, extract_message, Service};
pub use storage::{ObjectEntry, RestStorageBackend, StorageBackend, StoredObject};

//! # noteshare-core
//!
//! Core types, filter semantics, validation, and configuration for the
//! noteshare application.
//!
//! This crate provides the foundational data structures and predicates that
//! the other noteshare crates depend on. It owns no I/O beyond reading
//! environment variables.

pub mod config;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod validate;

// Re-export commonly used types at crate root
pub use config::{mask_key, ServiceConfig};
pub use error::{Error, Result};
pub use models::{
    Category, CategoryFilter, FilterState, NewNote, Note, Session, SignUpOutcome, UserIdentity,
};
pub use validate::{
    looks_like_pdf, sanitize_filename, storage_key, validate_upload, SelectedFile,
};

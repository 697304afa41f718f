//! # noteshare-app
//!
//! The route/view layer of noteshare: an axum application exposing the
//! catalog, authentication, preview, profile, diagnostics, and upload
//! routes over the remote-service clients in `noteshare-remote`.

pub mod catalog;
pub mod diagnostics;
pub mod routes;
pub mod session;
pub mod state;
pub mod upload;
pub mod views;

pub use routes::build_router;
pub use state::AppState;

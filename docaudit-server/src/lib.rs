//! HTTP transport for `docaudit-core`: axum router, upload staging, and
//! configuration, assembled behind [`state::AppState`] rather than via
//! process-global singletons.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Cli, Config};
pub use error::ServerError;
pub use routes::router;
pub use state::AppState;

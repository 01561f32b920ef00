//! # Langdex - Programming Language Catalog
//!
//! CRUD HTTP API over a catalog of programming languages.
//!
//! Langdex provides:
//! - Canonical name normalization for keyed lookups
//! - SQLite-backed record store with relation expansion (areas, techs)
//! - Feature-tag filtering over language records
//! - Axum request handlers with a uniform JSON envelope
//! - Account signup/login with bearer-token sessions

pub mod normalize;
pub mod lang;
pub mod relation;
pub mod storage;
pub mod auth;
pub mod seed;
pub mod server;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use lang::{DesignedBy, Lang, LangDetail, LangPatch, LangSummary, NewLang};
pub use relation::{Area, Tech};
pub use storage::SqliteStore;

/// Result type alias for Langdex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Langdex operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Random source unavailable: {0}")]
    Random(String),
}

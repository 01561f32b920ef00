//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - langs(name, description, img_url, key_features, ..., areas, techs)
//! - areas(name, description)
//! - techs(name, description)
//! - users(username, password_salt, password_hash)
//! - sessions(token_hash, user_id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, DbStats, StoredUser};

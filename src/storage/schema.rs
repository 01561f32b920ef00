//! Database schema definitions

/// SQL to create the langs table.
/// List fields and relation ids are JSON arrays.
pub const CREATE_LANGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS langs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    img_url TEXT NOT NULL,
    key_features TEXT NOT NULL DEFAULT '[]',
    advantages TEXT NOT NULL DEFAULT '[]',
    disadvantages TEXT NOT NULL DEFAULT '[]',
    designed_by TEXT,
    year_created INTEGER,
    popularity REAL,
    areas TEXT NOT NULL DEFAULT '[]',
    techs TEXT NOT NULL DEFAULT '[]'
)
"#;

/// SQL to create the areas table
pub const CREATE_AREAS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS areas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create the techs table
pub const CREATE_TECHS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS techs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_salt BLOB NOT NULL,
    password_hash TEXT NOT NULL
)
"#;

/// SQL to create the sessions table.
/// Only the digest of a bearer token is stored.
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_LANGS_TABLE,
        CREATE_AREAS_TABLE,
        CREATE_TECHS_TABLE,
        CREATE_USERS_TABLE,
        CREATE_SESSIONS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params, params_from_iter};
use serde::de::DeserializeOwned;
use crate::{Result, Error};
use crate::lang::{DesignedBy, Lang, LangDetail, LangPatch, NewLang};
use crate::relation::{Area, RelationKind, Tech};
use super::schema;

const LANG_COLUMNS: &str = "id, name, description, img_url, key_features, advantages, disadvantages, designed_by, year_created, popularity, areas, techs";

/// SQLite-backed storage for the language catalog
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Close the underlying connection, surfacing any pending error
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Language Operations ==========

    /// Insert a new language record.
    ///
    /// The name is canonicalized before the uniqueness check, so "rust" and
    /// "Rust" collide.
    pub fn insert_lang(&self, new: NewLang) -> Result<Lang> {
        let mut record = new.into_record();
        record.normalize();
        record.validate()?;
        self.check_references(RelationKind::Area, &record.areas)?;
        self.check_references(RelationKind::Tech, &record.techs)?;

        self.conn
            .execute(
                r#"
                INSERT INTO langs (name, description, img_url, key_features, advantages, disadvantages, designed_by, year_created, popularity, areas, techs)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    record.name,
                    record.description,
                    record.img_url,
                    serde_json::to_string(&record.key_features)?,
                    serde_json::to_string(&record.advantages)?,
                    serde_json::to_string(&record.disadvantages)?,
                    encode_designed_by(&record.designed_by)?,
                    record.year_created,
                    record.popularity,
                    serde_json::to_string(&record.areas)?,
                    serde_json::to_string(&record.techs)?,
                ],
            )
            .map_err(|e| conflict_or(e, || format!("a language named {} already exists", record.name)))?;

        record.id = self.conn.last_insert_rowid();
        tracing::debug!(id = record.id, name = %record.name, "inserted language");
        Ok(record)
    }

    /// All language records, in insertion order
    pub fn find_all_langs(&self) -> Result<Vec<Lang>> {
        let mut stmt = self.conn.prepare(&format!("SELECT {} FROM langs ORDER BY id", LANG_COLUMNS))?;

        let langs = stmt
            .query_map([], |row| self.row_to_lang(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(langs)
    }

    /// Get a language by canonical name, with areas and techs expanded
    pub fn find_lang_by_name(&self, name: &str) -> Result<Option<LangDetail>> {
        let Some(lang) = self.get_lang(name)? else {
            return Ok(None);
        };

        let areas = lang
            .areas
            .iter()
            .filter_map(|id| self.get_area(*id).transpose())
            .collect::<Result<Vec<_>>>()?;
        let techs = lang
            .techs
            .iter()
            .filter_map(|id| self.get_tech(*id).transpose())
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(lang.expand(areas, techs)))
    }

    /// Every language whose key features intersect `features`
    pub fn find_langs_by_features(&self, features: &[String]) -> Result<Vec<Lang>> {
        if features.is_empty() {
            return Err(Error::BadRequest("feature set must not be empty".to_string()));
        }

        let placeholders = (1..=features.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM langs
             WHERE EXISTS (SELECT 1 FROM json_each(langs.key_features) WHERE json_each.value IN ({}))
             ORDER BY id",
            LANG_COLUMNS, placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let langs = stmt
            .query_map(params_from_iter(features.iter()), |row| self.row_to_lang(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(langs)
    }

    /// Apply a partial update to the language with canonical name `name`.
    ///
    /// The merged record is validated before anything is written.
    pub fn update_lang_by_name(&self, name: &str, patch: LangPatch) -> Result<Option<Lang>> {
        let Some(mut record) = self.get_lang(name)? else {
            return Ok(None);
        };

        patch.apply_to(&mut record);
        record.normalize();
        record.validate()?;
        self.check_references(RelationKind::Area, &record.areas)?;
        self.check_references(RelationKind::Tech, &record.techs)?;

        self.conn
            .execute(
                r#"
                UPDATE langs
                SET name = ?2, description = ?3, img_url = ?4, key_features = ?5, advantages = ?6,
                    disadvantages = ?7, designed_by = ?8, year_created = ?9, popularity = ?10,
                    areas = ?11, techs = ?12
                WHERE id = ?1
                "#,
                params![
                    record.id,
                    record.name,
                    record.description,
                    record.img_url,
                    serde_json::to_string(&record.key_features)?,
                    serde_json::to_string(&record.advantages)?,
                    serde_json::to_string(&record.disadvantages)?,
                    encode_designed_by(&record.designed_by)?,
                    record.year_created,
                    record.popularity,
                    serde_json::to_string(&record.areas)?,
                    serde_json::to_string(&record.techs)?,
                ],
            )
            .map_err(|e| conflict_or(e, || format!("a language named {} already exists", record.name)))?;

        Ok(Some(record))
    }

    /// Delete a language by canonical name, returning the removed record
    pub fn delete_lang_by_name(&self, name: &str) -> Result<Option<Lang>> {
        self.conn
            .query_row(
                &format!("DELETE FROM langs WHERE name = ?1 RETURNING {}", LANG_COLUMNS),
                [name],
                |row| self.row_to_lang(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Count all languages
    pub fn count_langs(&self) -> Result<usize> {
        self.count("langs")
    }

    fn get_lang(&self, name: &str) -> Result<Option<Lang>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM langs WHERE name = ?1", LANG_COLUMNS),
                [name],
                |row| self.row_to_lang(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Helper to convert a row to a Lang
    fn row_to_lang(&self, row: &rusqlite::Row) -> rusqlite::Result<Lang> {
        let designed_by: Option<String> = row.get(7)?;
        let designed_by = designed_by
            .map(|text| decode_json::<DesignedBy>(7, &text))
            .transpose()?;

        Ok(Lang {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            img_url: row.get(3)?,
            key_features: json_column(row, 4)?,
            advantages: json_column(row, 5)?,
            disadvantages: json_column(row, 6)?,
            designed_by,
            year_created: row.get(8)?,
            popularity: row.get(9)?,
            areas: json_column(row, 10)?,
            techs: json_column(row, 11)?,
        })
    }

    /// Every referenced id must exist in its relation table
    fn check_references(&self, kind: RelationKind, ids: &[i64]) -> Result<()> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?1", kind.table());
        for id in ids {
            let count: i64 = self.conn.query_row(&sql, [id], |row| row.get(0))?;
            if count == 0 {
                return Err(Error::Validation(format!("{} references unknown id {}", kind, id)));
            }
        }
        Ok(())
    }

    // ========== Relation Operations ==========

    /// Insert a new area
    pub fn insert_area(&self, name: &str, description: &str) -> Result<Area> {
        let id = self.insert_relation(RelationKind::Area, name, description)?;
        Ok(Area { id, name: name.to_string(), description: description.to_string() })
    }

    /// Insert a new tech
    pub fn insert_tech(&self, name: &str, description: &str) -> Result<Tech> {
        let id = self.insert_relation(RelationKind::Tech, name, description)?;
        Ok(Tech { id, name: name.to_string(), description: description.to_string() })
    }

    pub fn get_area(&self, id: i64) -> Result<Option<Area>> {
        Ok(self
            .get_relation(RelationKind::Area, id)?
            .map(|(id, name, description)| Area { id, name, description }))
    }

    pub fn get_tech(&self, id: i64) -> Result<Option<Tech>> {
        Ok(self
            .get_relation(RelationKind::Tech, id)?
            .map(|(id, name, description)| Tech { id, name, description }))
    }

    pub fn find_all_areas(&self) -> Result<Vec<Area>> {
        Ok(self
            .all_relations(RelationKind::Area)?
            .into_iter()
            .map(|(id, name, description)| Area { id, name, description })
            .collect())
    }

    pub fn find_all_techs(&self) -> Result<Vec<Tech>> {
        Ok(self
            .all_relations(RelationKind::Tech)?
            .into_iter()
            .map(|(id, name, description)| Tech { id, name, description })
            .collect())
    }

    /// Delete an area. Languages referencing it keep the dangling id.
    pub fn delete_area(&self, id: i64) -> Result<bool> {
        self.delete_relation(RelationKind::Area, id)
    }

    /// Delete a tech. Languages referencing it keep the dangling id.
    pub fn delete_tech(&self, id: i64) -> Result<bool> {
        self.delete_relation(RelationKind::Tech, id)
    }

    fn insert_relation(&self, kind: RelationKind, name: &str, description: &str) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(Error::Validation(format!("{} name must not be blank", kind)));
        }
        self.conn
            .execute(
                &format!("INSERT INTO {} (name, description) VALUES (?1, ?2)", kind.table()),
                params![name, description],
            )
            .map_err(|e| conflict_or(e, || format!("{} entry {} already exists", kind, name)))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_relation(&self, kind: RelationKind, id: i64) -> Result<Option<(i64, String, String)>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT id, name, description FROM {} WHERE id = ?1", kind.table()),
                [id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
            )
            .optional()?;
        Ok(row)
    }

    fn all_relations(&self, kind: RelationKind) -> Result<Vec<(i64, String, String)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, description FROM {} ORDER BY id",
            kind.table()
        ))?;
        let rows: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn delete_relation(&self, kind: RelationKind, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [id])?;
        Ok(removed > 0)
    }

    // ========== Account Operations ==========

    /// Insert a user. Fails with `Conflict` when the username is taken.
    pub fn insert_user(&self, username: &str, salt: &[u8], password_hash: &str) -> Result<StoredUser> {
        self.conn
            .execute(
                "INSERT INTO users (username, password_salt, password_hash) VALUES (?1, ?2, ?3)",
                params![username, salt, password_hash],
            )
            .map_err(|e| conflict_or(e, || format!("username {} is already taken", username)))?;

        Ok(StoredUser {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            password_salt: salt.to_vec(),
            password_hash: password_hash.to_string(),
        })
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        self.conn
            .query_row(
                "SELECT id, username, password_salt, password_hash FROM users WHERE username = ?1",
                [username],
                |row| self.row_to_user(row),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn update_user_password(&self, user_id: i64, salt: &[u8], password_hash: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE users SET password_salt = ?2, password_hash = ?3 WHERE id = ?1",
            params![user_id, salt, password_hash],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    /// Record a session by the digest of its bearer token
    pub fn insert_session(&self, token_hash: &str, user_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (token_hash, user_id) VALUES (?1, ?2)",
            params![token_hash, user_id],
        )?;
        Ok(())
    }

    pub fn find_user_by_session(&self, token_hash: &str) -> Result<Option<StoredUser>> {
        self.conn
            .query_row(
                r#"
                SELECT u.id, u.username, u.password_salt, u.password_hash
                FROM sessions s JOIN users u ON u.id = s.user_id
                WHERE s.token_hash = ?1
                "#,
                [token_hash],
                |row| self.row_to_user(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Revoke every session belonging to a user
    pub fn delete_sessions_for_user(&self, user_id: i64) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?)
    }

    fn row_to_user(&self, row: &rusqlite::Row) -> rusqlite::Result<StoredUser> {
        Ok(StoredUser {
            id: row.get(0)?,
            username: row.get(1)?,
            password_salt: row.get(2)?,
            password_hash: row.get(3)?,
        })
    }

    // ========== Bulk Operations ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            langs: self.count_langs()?,
            areas: self.count("areas")?,
            techs: self.count("techs")?,
            users: self.count("users")?,
        })
    }

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    decode_json(idx, &text)
}

fn decode_json<T: DeserializeOwned>(idx: usize, text: &str) -> rusqlite::Result<T> {
    serde_json::from_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn encode_designed_by(designed_by: &Option<DesignedBy>) -> Result<Option<String>> {
    designed_by
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

/// Map a UNIQUE violation to `Conflict`, anything else to `Storage`
fn conflict_or(err: rusqlite::Error, message: impl FnOnce() -> String) -> Error {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == ErrorCode::ConstraintViolation {
            return Error::Conflict(message());
        }
    }
    Error::Storage(err)
}

/// User row as stored (credentials included)
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: i64,
    pub username: String,
    pub password_salt: Vec<u8>,
    pub password_hash: String,
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub langs: usize,
    pub areas: usize,
    pub techs: usize,
    pub users: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Languages: {}", self.langs)?;
        writeln!(f, "  Areas: {}", self.areas)?;
        writeln!(f, "  Techs: {}", self.techs)?;
        writeln!(f, "  Users: {}", self.users)
    }
}

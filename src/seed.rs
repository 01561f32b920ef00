//! Bulk import of catalog data from a JSON seed document
//!
//! ```json
//! {
//!   "areas": [{"name": "Web", "description": "Web development"}],
//!   "techs": [{"name": "Django"}],
//!   "langs": [{"name": "Python", "description": "...", "imgURL": "https://...",
//!              "areas": ["Web"], "techs": ["Django"]}]
//! }
//! ```
//!
//! Seed languages name their areas and techs; names are mapped to stored ids.
//! The whole document is imported in one transaction.

use std::collections::HashMap;
use serde::Deserialize;
use serde_json::Value;
use crate::lang::NewLang;
use crate::relation::RelationKind;
use crate::storage::SqliteStore;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub areas: Vec<SeedRelation>,
    #[serde(default)]
    pub techs: Vec<SeedRelation>,
    #[serde(default)]
    pub langs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SeedRelation {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub areas: usize,
    pub techs: usize,
    pub langs: usize,
}

pub fn parse_seed(text: &str) -> Result<SeedDocument> {
    Ok(serde_json::from_str(text)?)
}

/// Import a seed document atomically: on any failure nothing is kept.
pub fn import(store: &mut SqliteStore, seed: SeedDocument) -> Result<ImportSummary> {
    store.begin_transaction()?;
    match import_all(store, seed) {
        Ok(summary) => {
            store.commit()?;
            Ok(summary)
        }
        Err(e) => {
            if let Err(rollback) = store.rollback() {
                tracing::error!("Rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}

fn import_all(store: &SqliteStore, seed: SeedDocument) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    let mut area_ids: HashMap<String, i64> = store
        .find_all_areas()?
        .into_iter()
        .map(|a| (a.name, a.id))
        .collect();
    for area in seed.areas {
        let stored = store.insert_area(&area.name, &area.description)?;
        area_ids.insert(stored.name, stored.id);
        summary.areas += 1;
    }

    let mut tech_ids: HashMap<String, i64> = store
        .find_all_techs()?
        .into_iter()
        .map(|t| (t.name, t.id))
        .collect();
    for tech in seed.techs {
        let stored = store.insert_tech(&tech.name, &tech.description)?;
        tech_ids.insert(stored.name, stored.id);
        summary.techs += 1;
    }

    for (index, mut lang) in seed.langs.into_iter().enumerate() {
        resolve_names(&mut lang, RelationKind::Area, &area_ids, index)?;
        resolve_names(&mut lang, RelationKind::Tech, &tech_ids, index)?;
        let new: NewLang = serde_json::from_value(lang)
            .map_err(|e| Error::Validation(format!("langs[{}]: {}", index, e)))?;
        let saved = store.insert_lang(new)?;
        tracing::debug!(name = %saved.name, "imported language");
        summary.langs += 1;
    }

    Ok(summary)
}

/// Replace relation names in a seed language with stored ids
fn resolve_names(
    lang: &mut Value,
    kind: RelationKind,
    ids: &HashMap<String, i64>,
    index: usize,
) -> Result<()> {
    let Some(field) = lang.get_mut(kind.field()) else {
        return Ok(());
    };
    let Some(entries) = field.as_array() else {
        return Err(Error::Validation(format!("langs[{}].{} must be a list", index, kind)));
    };

    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = match entry {
            Value::String(name) => *ids.get(name).ok_or_else(|| {
                Error::Validation(format!("langs[{}].{}: unknown entry {:?}", index, kind, name))
            })?,
            Value::Number(n) => n.as_i64().ok_or_else(|| {
                Error::Validation(format!("langs[{}].{}: invalid id {}", index, kind, n))
            })?,
            other => {
                return Err(Error::Validation(format!(
                    "langs[{}].{}: expected a name or id, got {}",
                    index, kind, other
                )));
            }
        };
        resolved.push(Value::from(id));
    }

    *field = Value::Array(resolved);
    Ok(())
}

//! Language records - the catalog's sole entity
//!
//! - `Lang`: a stored record with relations held as id references
//! - `LangDetail`: a stored record with `areas` and `techs` expanded
//! - `LangSummary`: the `{name, description, imgURL}` projection used by list
//! - `NewLang` / `LangPatch`: create and partial-update inputs

use crate::normalize::{capitalize_name, normalize_feature_tag};
use crate::relation::{Area, Tech};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Earliest and latest accepted `yearCreated`.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1800..=2100;

/// Who designed a language: a single person/organization or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DesignedBy {
    One(String),
    Many(Vec<String>),
}

impl DesignedBy {
    pub fn names(&self) -> Vec<&str> {
        match self {
            DesignedBy::One(name) => vec![name.as_str()],
            DesignedBy::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A stored language record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lang {
    /// Store-assigned identifier
    pub id: i64,
    /// Canonical, unique name
    pub name: String,
    pub description: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
    /// Feature tags, `_`-separated words
    pub key_features: Vec<String>,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designed_by: Option<DesignedBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_created: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    /// Area ids (weak references)
    pub areas: Vec<i64>,
    /// Tech ids (weak references)
    pub techs: Vec<i64>,
}

impl Lang {
    /// Bring the record into canonical form: capitalized name and
    /// `_`-separated feature tags.
    pub fn normalize(&mut self) {
        self.name = capitalize_name(self.name.trim());
        for tag in &mut self.key_features {
            *tag = normalize_feature_tag(tag.trim());
        }
    }

    /// Check the record against the catalog's schema constraints.
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;

        let rest = self
            .img_url
            .strip_prefix("https://")
            .or_else(|| self.img_url.strip_prefix("http://"));
        match rest {
            Some(host) if !host.trim().is_empty() && !host.contains(char::is_whitespace) => {}
            _ => {
                return Err(Error::Validation(format!(
                    "imgURL must be an http(s) URI, got {:?}",
                    self.img_url
                )));
            }
        }

        for (field, items) in [
            ("keyFeatures", &self.key_features),
            ("advantages", &self.advantages),
            ("disadvantages", &self.disadvantages),
        ] {
            for item in items {
                require_text(field, item)?;
            }
        }

        if let Some(designed_by) = &self.designed_by {
            for name in designed_by.names() {
                require_text("designedBy", name)?;
            }
        }

        if let Some(year) = self.year_created {
            if !YEAR_RANGE.contains(&year) {
                return Err(Error::Validation(format!(
                    "yearCreated must be within {}..={}, got {}",
                    YEAR_RANGE.start(),
                    YEAR_RANGE.end(),
                    year
                )));
            }
        }

        if let Some(popularity) = self.popularity {
            if !popularity.is_finite() || popularity < 0.0 {
                return Err(Error::Validation(format!(
                    "popularity must be a non-negative number, got {}",
                    popularity
                )));
            }
        }

        Ok(())
    }

    /// Attach expanded relations to this record.
    pub fn expand(self, areas: Vec<Area>, techs: Vec<Tech>) -> LangDetail {
        LangDetail {
            id: self.id,
            name: self.name,
            description: self.description,
            img_url: self.img_url,
            key_features: self.key_features,
            advantages: self.advantages,
            disadvantages: self.disadvantages,
            designed_by: self.designed_by,
            year_created: self.year_created,
            popularity: self.popularity,
            areas,
            techs,
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}

/// A language record with its `areas` and `techs` resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LangDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
    pub key_features: Vec<String>,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designed_by: Option<DesignedBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_created: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    pub areas: Vec<Area>,
    pub techs: Vec<Tech>,
}

/// List projection of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangSummary {
    pub name: String,
    pub description: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
}

impl From<Lang> for LangSummary {
    fn from(lang: Lang) -> Self {
        Self {
            name: lang.name,
            description: lang.description,
            img_url: lang.img_url,
        }
    }
}

/// Create input. `name`, `description` and `imgURL` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewLang {
    pub name: String,
    pub description: String,
    #[serde(rename = "imgURL")]
    pub img_url: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub advantages: Vec<String>,
    #[serde(default)]
    pub disadvantages: Vec<String>,
    #[serde(default)]
    pub designed_by: Option<DesignedBy>,
    #[serde(default)]
    pub year_created: Option<i32>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub areas: Vec<i64>,
    #[serde(default)]
    pub techs: Vec<i64>,
}

impl NewLang {
    /// Minimal input with only the required fields set
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        img_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            img_url: img_url.into(),
            key_features: Vec::new(),
            advantages: Vec::new(),
            disadvantages: Vec::new(),
            designed_by: None,
            year_created: None,
            popularity: None,
            areas: Vec::new(),
            techs: Vec::new(),
        }
    }

    /// Unsaved record (id 0, set by the store on insert).
    pub fn into_record(self) -> Lang {
        Lang {
            id: 0,
            name: self.name,
            description: self.description,
            img_url: self.img_url,
            key_features: self.key_features,
            advantages: self.advantages,
            disadvantages: self.disadvantages,
            designed_by: self.designed_by,
            year_created: self.year_created,
            popularity: self.popularity,
            areas: self.areas,
            techs: self.techs,
        }
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LangPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "imgURL", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advantages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disadvantages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designed_by: Option<DesignedBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_created: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub areas: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub techs: Option<Vec<i64>>,
}

impl LangPatch {
    /// Overwrite the supplied fields of `record`.
    pub fn apply_to(self, record: &mut Lang) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(img_url) = self.img_url {
            record.img_url = img_url;
        }
        if let Some(key_features) = self.key_features {
            record.key_features = key_features;
        }
        if let Some(advantages) = self.advantages {
            record.advantages = advantages;
        }
        if let Some(disadvantages) = self.disadvantages {
            record.disadvantages = disadvantages;
        }
        if let Some(designed_by) = self.designed_by {
            record.designed_by = Some(designed_by);
        }
        if let Some(year) = self.year_created {
            record.year_created = Some(year);
        }
        if let Some(popularity) = self.popularity {
            record.popularity = Some(popularity);
        }
        if let Some(areas) = self.areas {
            record.areas = areas;
        }
        if let Some(techs) = self.techs {
            record.techs = techs;
        }
    }
}

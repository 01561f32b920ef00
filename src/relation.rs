//! Related entities referenced by language records
//!
//! Areas (application domains) and techs (frameworks, runtimes, tools) are
//! owned by their own tables. Languages hold weak id references to them;
//! nothing cascades in either direction.

use serde::{Deserialize, Serialize};

/// An application area, e.g. "Web Development".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A technology associated with languages, e.g. "Django".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tech {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Which relation table a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Area,
    Tech,
}

impl RelationKind {
    pub fn table(&self) -> &'static str {
        match self {
            RelationKind::Area => "areas",
            RelationKind::Tech => "techs",
        }
    }

    /// Field name on the language record
    pub fn field(&self) -> &'static str {
        match self {
            RelationKind::Area => "areas",
            RelationKind::Tech => "techs",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field())
    }
}

use crate::lang::Lang;
use crate::storage::DbStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct LangRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Year")]
    pub year: String,
    #[tabled(rename = "Popularity")]
    pub popularity: String,
    #[tabled(rename = "Key Features")]
    pub features: String,
}

impl From<&Lang> for LangRow {
    fn from(lang: &Lang) -> Self {
        Self {
            name: lang.name.clone(),
            year: lang.year_created.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            popularity: lang
                .popularity
                .map(|p| format!("{:.1}", p))
                .unwrap_or_else(|| "-".to_string()),
            features: lang.key_features.join(", "),
        }
    }
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Table")]
    table: &'static str,
    #[tabled(rename = "Rows")]
    rows: usize,
}

pub fn lang_table(langs: &[Lang]) -> String {
    if langs.is_empty() {
        return String::new();
    }
    let rows: Vec<LangRow> = langs.iter().map(LangRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &DbStats) -> String {
    let rows = [
        CountRow { table: "langs", rows: stats.langs },
        CountRow { table: "areas", rows: stats.areas },
        CountRow { table: "techs", rows: stats.techs },
        CountRow { table: "users", rows: stats.users },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::NewLang;

    #[test]
    fn test_lang_table_rows() {
        let mut new = NewLang::new("Rust", "d", "https://x/rust.png");
        new.key_features = vec!["ownership".into(), "traits".into()];
        new.popularity = Some(87.25);
        let table = lang_table(&[new.into_record()]);

        assert!(table.contains("Rust"));
        assert!(table.contains("ownership, traits"));
        assert!(table.contains("87.2") || table.contains("87.3"));
        assert!(lang_table(&[]).is_empty());
    }

    #[test]
    fn test_stats_table_lists_every_table() {
        let stats = DbStats { langs: 3, areas: 1, techs: 0, users: 2 };
        let table = stats_table(&stats);
        for name in ["langs", "areas", "techs", "users"] {
            assert!(table.contains(name));
        }
    }
}

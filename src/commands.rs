use crate::{OutputMode, emit_success};
use langdex::config::{self, LangdexConfig, ServeSettings};
use langdex::storage::SqliteStore;
use langdex::ui::{self, Icons, banner, info, section, success, summary_row};
use std::path::Path;

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        banner(Icons::BOOKS, &format!("Langdex {}", env!("CARGO_PKG_VERSION")));
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}

pub fn run_init(output_mode: OutputMode, config_path: &Path, force: bool) -> anyhow::Result<()> {
    let config = LangdexConfig {
        database: Some(config::default_database_path().to_string_lossy().to_string()),
        host: Some(config::DEFAULT_HOST.to_string()),
        port: Some(config::DEFAULT_PORT),
    };
    config::write_config(config_path, &config, force)?;

    let project_root = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config::ensure_gitignore(project_root)?;

    if output_mode.is_human() {
        success(&format!("Wrote {}", config_path.display()));
    } else {
        emit_success(output_mode, "init", serde_json::to_value(&config)?)?;
    }
    Ok(())
}

pub async fn run_serve(output_mode: OutputMode, settings: ServeSettings) -> anyhow::Result<()> {
    let addr = settings.socket_addr().await?;
    config::ensure_db_dir(&settings.database)?;
    let store = SqliteStore::open(&settings.database)?;

    if output_mode.is_human() {
        banner(Icons::GLOBE, &format!("Server running at http://{}", addr));
        info("Database", &settings.database.display().to_string());
    }

    langdex::server::start_server(addr, store).await
}

pub fn run_import(output_mode: OutputMode, database: &Path, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let seed = langdex::seed::parse_seed(&text)?;

    config::ensure_db_dir(database)?;
    let mut store = SqliteStore::open(database)?;
    let summary = langdex::seed::import(&mut store, seed)?;
    store.close()?;

    if output_mode.is_human() {
        success(&format!("Imported {}", file.display()));
        summary_row("Languages:", &summary.langs.to_string());
        summary_row("Areas:", &summary.areas.to_string());
        summary_row("Techs:", &summary.techs.to_string());
    } else {
        let data = serde_json::json!({
            "langs": summary.langs,
            "areas": summary.areas,
            "techs": summary.techs,
        });
        emit_success(output_mode, "import", data)?;
    }
    Ok(())
}

pub fn run_stats(output_mode: OutputMode, database: &Path) -> anyhow::Result<()> {
    let store = SqliteStore::open(database)?;
    let stats = store.stats()?;

    if output_mode.is_human() {
        section(&format!(" {} Catalog ", Icons::STATS));
        info("Database", &database.display().to_string());
        println!("{}", ui::stats_table(&stats));
    } else {
        let data = serde_json::json!({
            "langs": stats.langs,
            "areas": stats.areas,
            "techs": stats.techs,
            "users": stats.users,
        });
        emit_success(output_mode, "stats", data)?;
    }
    Ok(())
}

pub fn run_list(output_mode: OutputMode, database: &Path) -> anyhow::Result<()> {
    let store = SqliteStore::open(database)?;
    let langs = store.find_all_langs()?;

    if output_mode.is_human() {
        if langs.is_empty() {
            ui::warn("No languages in the catalog");
        } else {
            println!("{}", ui::lang_table(&langs));
        }
    } else {
        emit_success(output_mode, "list", serde_json::json!({ "langs": langs }))?;
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LangdexConfig {
    pub database: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Effective server settings after merging CLI flags over the config file
#[derive(Debug, Clone, PartialEq)]
pub struct ServeSettings {
    pub database: PathBuf,
    /// IP address or host name, resolved at bind time
    pub host: String,
    pub port: u16,
}

impl ServeSettings {
    pub fn resolve(
        config: Option<&LangdexConfig>,
        database: Option<PathBuf>,
        host: Option<String>,
        port: Option<u16>,
    ) -> anyhow::Result<Self> {
        let database = database
            .or_else(|| config.and_then(|c| c.database.clone()).map(PathBuf::from))
            .unwrap_or_else(default_database_path);

        let host = host
            .or_else(|| config.and_then(|c| c.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host.trim().to_string();
        if host.is_empty() {
            anyhow::bail!("host must not be empty");
        }
        let port = port
            .or_else(|| config.and_then(|c| c.port))
            .unwrap_or(DEFAULT_PORT);

        Ok(Self { database, host, port })
    }

    /// Look up the host and return the first address to bind
    pub async fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| anyhow::anyhow!("cannot resolve host {:?}: {}", self.host, e))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("host {:?} has no addresses", self.host))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("langdex.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".langdex").join("langdex.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<LangdexConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: LangdexConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &LangdexConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".langdex/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("langdex.toml");
        let config = LangdexConfig {
            database: Some("data/catalog.db".into()),
            host: Some("0.0.0.0".into()),
            port: Some(8080),
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_flags_override_file() {
        let config = LangdexConfig {
            database: Some("file.db".into()),
            host: Some("0.0.0.0".into()),
            port: Some(8080),
        };

        let settings = ServeSettings::resolve(Some(&config), None, None, Some(9000)).unwrap();
        assert_eq!(settings.database, PathBuf::from("file.db"));
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 9000);

        let defaults = ServeSettings::resolve(None, None, None, None).unwrap();
        assert_eq!(defaults.database, default_database_path());
        assert_eq!(defaults.host, DEFAULT_HOST);
        assert_eq!(defaults.port, DEFAULT_PORT);

        assert!(ServeSettings::resolve(None, None, Some("  ".into()), None).is_err());
    }

    #[tokio::test]
    async fn test_host_names_resolve() {
        let config = LangdexConfig { host: Some("localhost".into()), ..Default::default() };
        let settings = ServeSettings::resolve(Some(&config), None, None, Some(4000)).unwrap();

        let addr = settings.socket_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 4000);

        let settings = ServeSettings::resolve(None, None, Some("127.0.0.1".into()), None).unwrap();
        let addr = settings.socket_addr().await.unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)));
    }

    #[test]
    fn test_gitignore_entry_added_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "target").unwrap();

        ensure_gitignore(dir.path()).unwrap();
        ensure_gitignore(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, "target\n.langdex/\n");
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("langdex.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_create_database")]
    pub create_database: bool,
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: komika_home().join("config.yml"),
            database_path: default_database_path(),
            create_database: default_create_database(),
            catalog_url: default_catalog_url(),
            history_limit: default_history_limit(),
        }
    }
}

fn komika_home() -> PathBuf {
    match std::env::var("KOMIKA_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".komika"),
    }
}

fn default_catalog_url() -> String {
    "https://raw.githubusercontent.com/nicetrykids/uploadjson/refs/heads/main/comics.json"
        .to_string()
}

fn default_history_limit() -> usize {
    50
}

fn default_database_path() -> String {
    let path = komika_home();
    if !path.exists() {
        let _ = std::fs::create_dir_all(&path);
    }
    path.join("komika.db").display().to_string()
}

fn default_create_database() -> bool {
    true
}

impl Config {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, anyhow::Error> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => komika_home().join("config.yml"),
        };

        match std::fs::File::open(&config_path) {
            Ok(file) => {
                info!("Open config from {:?}", config_path);
                let mut cfg: Self = serde_yml::from_reader(file)?;
                cfg.path = config_path;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Config {
                    path: config_path,
                    ..Default::default()
                };
                cfg.save()?;
                info!("Write default config at {:?}", cfg.path);
                Ok(cfg)
            }
        }
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yml::to_string(&self)?)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("komika-config-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_open_writes_default_config() {
        let dir = scratch_dir("default");
        let path = dir.join("config.yml");

        let cfg = Config::open(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(cfg.history_limit, 50);
        assert!(cfg.create_database);
        assert_eq!(cfg.path(), path.as_path());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_open_fills_missing_fields() {
        let dir = scratch_dir("partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        std::fs::write(
            &path,
            "database_path: /tmp/komika-test.db\ncatalog_url: http://localhost/comics.json\n",
        )
        .unwrap();

        let cfg = Config::open(Some(&path)).unwrap();

        assert_eq!(cfg.database_path, "/tmp/komika-test.db");
        assert_eq!(cfg.catalog_url, "http://localhost/comics.json");
        assert_eq!(cfg.history_limit, 50);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Loaded from `<config dir>/eventscout/config.toml`; CLI flags and env vars
/// override it. Missing file means defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ticketmaster: TicketmasterConfig,
}

impl Config {
    /// Load config from the default location
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from an explicit path, defaults if it doesn't exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config dir>/eventscout/config.toml` (XDG on Linux, AppData on Windows)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?;
        Ok(config_dir.join("eventscout").join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `<data dir>/eventscout/eventscout.db`
    pub path: Option<PathBuf>,

    /// Make SQLite enforce the REFERENCES clauses on categories/history
    #[serde(default)]
    pub enforce_foreign_keys: bool,
}

impl DatabaseConfig {
    pub fn db_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?;
        Ok(data_dir.join("eventscout").join("eventscout.db"))
    }

    pub fn store_options(&self) -> eventscout_cache::StoreOptions {
        eventscout_cache::StoreOptions {
            enforce_foreign_keys: self.enforce_foreign_keys,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketmasterConfig {
    /// Discovery API key from https://developer.ticketmaster.com
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Search radius in miles
    #[serde(default = "default_radius")]
    pub radius: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://app.ticketmaster.com/discovery/v2".to_string()
}

fn default_radius() -> u32 {
    50
}

fn default_max_retries() -> u32 {
    2
}

impl Default for TicketmasterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            radius: default_radius(),
            max_retries: default_max_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ticketmaster.radius, 50);
        assert_eq!(config.ticketmaster.max_retries, 2);
        assert!(config.ticketmaster.api_key.is_none());
        assert!(!config.database.enforce_foreign_keys);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [ticketmaster]
            api_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.ticketmaster.api_key.as_deref(), Some("abc"));
        assert_eq!(config.ticketmaster.base_url, default_base_url());
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.database.path = Some(dir.path().join("cache.db"));
        config.database.enforce_foreign_keys = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.database.path, config.database.path);
        assert!(loaded.database.enforce_foreign_keys);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.ticketmaster.radius, 50);
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let db = DatabaseConfig {
            path: Some(PathBuf::from("/tmp/x.db")),
            enforce_foreign_keys: false,
        };
        assert_eq!(db.db_path().unwrap(), PathBuf::from("/tmp/x.db"));
    }
}

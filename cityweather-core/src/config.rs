use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    model::City,
    provider::juhe::DEFAULT_ENDPOINT,
    store::{StaleResultPolicy, StoreSettings},
};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "CITYWEATHER_API_KEY";

pub const DEFAULT_INITIAL_CITY: &str = "Beijing";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// initial_city = "北京"
/// stale_results = "discard"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key for the weather API. Required before any fetch can succeed.
    pub api_key: Option<String>,

    /// Full URL of the weather query endpoint.
    pub endpoint: String,

    /// City shown (and fetched) on startup.
    pub initial_city: String,

    /// What to do with a fetch result that finishes after a newer fetch was triggered.
    pub stale_results: StaleResultPolicy,

    /// Default tracing level when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            initial_city: DEFAULT_INITIAL_CITY.to_string(),
            stale_results: StaleResultPolicy::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    ///
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            Self::from_toml_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        Ok(cfg.with_env_overrides(|name| std::env::var(name).ok()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The configured API key, or an error telling the user how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `cityweather configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn store_settings(&self) -> Result<StoreSettings> {
        let initial_city = City::parse(&self.initial_city).ok_or_else(|| {
            anyhow!(
                "Configured initial_city is blank.\n\
                 Hint: run `cityweather configure` and enter a city name."
            )
        })?;

        Ok(StoreSettings {
            initial_city,
            stale_results: self.stale_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_in_beijing_without_a_key() {
        let cfg = Config::default();

        assert_eq!(cfg.initial_city, "Beijing");
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.stale_results, StaleResultPolicy::Discard);

        let err = cfg.api_key().unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `cityweather configure`"));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            api_key = "KEY"
            stale_results = "apply"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.api_key().unwrap(), "KEY");
        assert_eq!(cfg.stale_results, StaleResultPolicy::Apply);
        assert_eq!(cfg.initial_city, DEFAULT_INITIAL_CITY);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Config::from_toml_str(r#"stale_results = "sometimes""#).is_err());
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_env_overrides(|name| {
            (name == API_KEY_ENV).then(|| "ENV_KEY".to_string())
        });
        assert_eq!(cfg.api_key().unwrap(), "ENV_KEY");
    }

    #[test]
    fn blank_env_key_is_ignored() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(cfg.api_key().unwrap(), "FILE_KEY");
    }

    #[test]
    fn store_settings_trim_the_initial_city() {
        let cfg = Config {
            initial_city: "  上海 ".into(),
            ..Config::default()
        };
        let settings = cfg.store_settings().unwrap();
        assert_eq!(settings.initial_city.as_str(), "上海");
    }

    #[test]
    fn blank_initial_city_is_an_error() {
        let cfg = Config {
            initial_city: "   ".into(),
            ..Config::default()
        };
        let err = cfg.store_settings().unwrap_err();
        assert!(err.to_string().contains("initial_city is blank"));
    }
}

//! Configuration management for postpad.
//!
//! Loads configuration from ${POSTPAD_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default API base URL of the notes service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default storage key for the persisted identity.
pub const DEFAULT_SESSION_KEY: &str = "user";

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "POSTPAD_BASE_URL";

pub mod paths {
    //! Path resolution for postpad configuration and data directories.
    //!
    //! POSTPAD_HOME resolution order:
    //! 1. POSTPAD_HOME environment variable (if set)
    //! 2. ~/.config/postpad (default)

    use std::path::PathBuf;

    /// Returns the postpad home directory.
    ///
    /// Checks POSTPAD_HOME env var first, falls back to ~/.config/postpad,
    /// then to a relative `.postpad` directory when no home is known.
    pub fn postpad_home() -> PathBuf {
        if let Ok(home) = std::env::var("POSTPAD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".postpad"),
            |h| h.join(".config").join("postpad"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        postpad_home().join("config.toml")
    }

    /// Returns the directory holding persisted session records.
    pub fn storage_dir() -> PathBuf {
        postpad_home().join("storage")
    }
}

/// Storage key for the mirrored server session cookie.
pub const COOKIE_STORAGE_KEY: &str = "cookies";

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the notes API (e.g. `http://localhost:5000/api`).
    pub base_url: String,
    /// Storage key for the persisted identity record.
    pub session_key: String,
    /// Whether the server session cookie survives process restarts.
    pub persist_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            persist_cookies: true,
        }
    }
}

impl Config {
    /// Loads config from the default location, applying env overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config.apply_base_url_override(&url);
        }
        Ok(config)
    }

    /// Loads config from a specific path. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Writes the commented default config to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    fn apply_base_url_override(&mut self, url: &str) {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            self.base_url = trimmed.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session_key, "user");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"https://notes.example/api\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "https://notes.example/api");
        assert_eq!(config.session_key, DEFAULT_SESSION_KEY);
        assert!(config.persist_cookies);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let parsed: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::init(&path).unwrap();
        assert!(path.exists());

        let err = Config::init(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = Config::default();
        config.apply_base_url_override("   ");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        config.apply_base_url_override(" http://127.0.0.1:9/api ");
        assert_eq!(config.base_url, "http://127.0.0.1:9/api");
    }
}

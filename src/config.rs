//! User configuration (`config.toml`) and credential resolution
//!
//! ```toml
//! [trello]
//! api_key = "..."
//! api_token = "..."
//! # api_base = "https://api.trello.com/1"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trellokit::{Client, Credentials};

use crate::paths;

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub trello: TrelloSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrelloSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    /// Alternative API root, mainly for proxies
    #[serde(default)]
    pub api_base: Option<String>,
}

impl Settings {
    /// Load settings, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format")
    }
}

/// Everything needed to open a Trello client
#[derive(Debug, Clone)]
pub struct Connection {
    pub credentials: Credentials,
    pub api_base: Option<String>,
}

impl Connection {
    /// Resolve credentials: flags (or their env vars) first, then the config file.
    pub fn resolve(
        api_key: Option<String>,
        api_token: Option<String>,
        config: Option<&Path>,
    ) -> Result<Self> {
        let path = paths::config_file(config)?;
        let settings = Settings::load(&path)?;
        Self::from_sources(api_key, api_token, &settings, &path)
    }

    fn from_sources(
        api_key: Option<String>,
        api_token: Option<String>,
        settings: &Settings,
        path: &Path,
    ) -> Result<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let api_key = non_empty(api_key).or_else(|| non_empty(settings.trello.api_key.clone()));
        let api_token =
            non_empty(api_token).or_else(|| non_empty(settings.trello.api_token.clone()));

        match (api_key, api_token) {
            (Some(key), Some(token)) => Ok(Self {
                credentials: Credentials::new(key, token),
                api_base: non_empty(settings.trello.api_base.clone()),
            }),
            (key, _) => {
                let missing = if key.is_none() { "API key" } else { "API token" };
                anyhow::bail!(
                    "Missing Trello {missing}: pass --api-key/--api-token \
                     (or set BOARDSMITH_API_KEY/BOARDSMITH_API_TOKEN), \
                     or add them under [trello] in {}",
                    path.display()
                )
            }
        }
    }

    pub fn client(&self) -> Client {
        match &self.api_base {
            Some(base) => Client::connect_to(self.credentials.clone(), base),
            None => Client::connect(self.credentials.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings(key: Option<&str>, token: Option<&str>) -> Settings {
        Settings {
            trello: TrelloSettings {
                api_key: key.map(String::from),
                api_token: token.map(String::from),
                api_base: None,
            },
        }
    }

    #[test]
    fn test_parse_settings() {
        let settings = Settings::parse(
            r#"
            [trello]
            api_key = "k"
            api_token = "t"
            api_base = "http://localhost:8080/1"
            "#,
        )
        .unwrap();
        assert_eq!(settings.trello.api_key.as_deref(), Some("k"));
        assert_eq!(
            settings.trello.api_base.as_deref(),
            Some("http://localhost:8080/1")
        );
    }

    #[test]
    fn test_empty_settings() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let settings = Settings::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[trello\napi_key =").unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_flags_win_over_file() {
        let conn = Connection::from_sources(
            Some("flag-key".into()),
            None,
            &settings(Some("file-key"), Some("file-token")),
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(conn.credentials.api_key, "flag-key");
        assert_eq!(conn.credentials.api_token, "file-token");
    }

    #[test]
    fn test_missing_token_is_reported() {
        let err = Connection::from_sources(
            Some("k".into()),
            Some("  ".into()),
            &Settings::default(),
            Path::new("/cfg/config.toml"),
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("Missing Trello API token"));
        assert!(err.contains("/cfg/config.toml"));
    }
}

//! Runtime configuration read from the environment.
//!
//! | variable                    | default                |
//! |-----------------------------|------------------------|
//! | `WEBSHOP_DB_PATH`           | `webshop.sqlite3`      |
//! | `WEBSHOP_LOG_LEVEL`         | build-mode default     |
//! | `WEBSHOP_LOG_DIR`           | unset (no file logs)   |
//! | `WEBSHOP_NOTIFY_RECIPIENTS` | empty, comma-separated |

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "WEBSHOP_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "WEBSHOP_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "WEBSHOP_LOG_DIR";
pub const NOTIFY_RECIPIENTS_VAR: &str = "WEBSHOP_NOTIFY_RECIPIENTS";

const DEFAULT_DB_FILE_NAME: &str = "webshop.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Empty(&'static str),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(var) => write!(f, "{var} is set but empty"),
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_VAR}: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
    pub notify_recipients: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            notify_recipients: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_VAR) {
            config.database_path = PathBuf::from(non_empty(DB_PATH_VAR, path)?);
        }
        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            config.log_level = normalize_level(&level).map_err(ConfigError::InvalidLogLevel)?;
        }
        if let Some(dir) = lookup(LOG_DIR_VAR) {
            config.log_dir = Some(PathBuf::from(non_empty(LOG_DIR_VAR, dir)?));
        }
        if let Some(recipients) = lookup(NOTIFY_RECIPIENTS_VAR) {
            config.notify_recipients = recipients
                .split(',')
                .map(str::trim)
                .filter(|recipient| !recipient.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}

fn non_empty(var: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(var));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DB_PATH_VAR, LOG_LEVEL_VAR, NOTIFY_RECIPIENTS_VAR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DB_PATH_VAR, "/var/lib/shop.db"),
            (LOG_LEVEL_VAR, "WARNING"),
            (NOTIFY_RECIPIENTS_VAR, " a@example.com, ,b@example.com "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/shop.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(
            config.notify_recipients,
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
    }

    #[test]
    fn rejects_bad_values() {
        let level = AppConfig::from_lookup(lookup_from(&[(LOG_LEVEL_VAR, "loud")])).unwrap_err();
        assert!(matches!(level, ConfigError::InvalidLogLevel(_)));

        let path = AppConfig::from_lookup(lookup_from(&[(DB_PATH_VAR, "  ")])).unwrap_err();
        assert_eq!(path, ConfigError::Empty(DB_PATH_VAR));
    }
}

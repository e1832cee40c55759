// =============================================================================
// CONFIG : Où et comment ouvrir le store
// =============================================================================
//
// StoreConfig est désérialisable : un hôte peut l'embarquer tel quel dans sa
// propre configuration. `from_env` lit les variables GRADEBOOK_* et retombe
// sur les valeurs par défaut pour celles qui sont absentes.
//
// =============================================================================

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_DATABASE: &str = "GRADEBOOK_DATABASE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "GRADEBOOK_BUSY_TIMEOUT_MS";
pub const ENV_READ_ONLY: &str = "GRADEBOOK_READ_ONLY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Fichier SQLite (":memory:" pour une base en mémoire)
    pub database: PathBuf,
    /// Attente maximale sur un verrou SQLite
    pub busy_timeout_ms: u64,
    /// Ouvre la base en lecture seule
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database: PathBuf::from("gradebook.db"),
            busy_timeout_ms: 5_000,
            read_only: true,
        }
    }
}

impl StoreConfig {
    /// Base en mémoire, inscriptible (les fixtures doivent pouvoir la peupler)
    pub fn in_memory() -> Self {
        StoreConfig {
            database: PathBuf::from(":memory:"),
            read_only: false,
            ..StoreConfig::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Comme `from_env`, avec une source de variables injectée
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = StoreConfig::default();

        if let Some(path) = lookup(ENV_DATABASE) {
            if path.trim().is_empty() {
                return Err(invalid(ENV_DATABASE, &path, "empty path"));
            }
            config.database = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                invalid(ENV_BUSY_TIMEOUT_MS, &raw, &e.to_string())
            })?;
        }

        if let Some(raw) = lookup(ENV_READ_ONLY) {
            config.read_only = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(invalid(ENV_READ_ONLY, &raw, "expected true or false")),
            };
        }

        Ok(config)
    }
}

fn invalid(var: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidVar {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

//! Application-level configuration loading: team-draw policy knobs.

use std::{env, fs, io::ErrorKind, ops::RangeInclusive, path::PathBuf};

use serde::{Deserialize, de};
use serde_json::Value;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PELADA_BACK_CONFIG_PATH";

const DEFAULT_MIN_TEAM_COUNT: usize = 2;
const DEFAULT_MAX_TEAM_COUNT: usize = 4;
const DEFAULT_MIN_PLAYERS: usize = 2;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Smallest number of teams a draw may request.
    pub min_team_count: usize,
    /// Largest number of teams a draw may request.
    pub max_team_count: usize,
    /// Confirmed players required before teams can be drawn.
    pub min_players: usize,
    /// Whether draws shuffle the roster when the request does not say.
    pub reshuffle_by_default: bool,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        min_team_count = config.min_team_count,
                        max_team_count = config.max_team_count,
                        min_players = config.min_players,
                        reshuffle_by_default = config.reshuffle_by_default,
                        "loaded draw settings from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON object. Absent keys keep their default; an unusable team-count
    /// window (zero, or min above max) is replaced by the default window.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        // Checked up front: the derived visitor would also accept a sequence.
        let value = match serde_json::from_str::<Value>(contents)? {
            object @ Value::Object(_) => object,
            _ => return Err(de::Error::custom("configuration must be a JSON object")),
        };
        let raw = serde_json::from_value::<RawConfig>(value)?;
        Ok(raw.into())
    }

    /// Team counts accepted by a draw.
    pub fn team_count_range(&self) -> RangeInclusive<usize> {
        self.min_team_count..=self.max_team_count
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_team_count: DEFAULT_MIN_TEAM_COUNT,
            max_team_count: DEFAULT_MAX_TEAM_COUNT,
            min_players: DEFAULT_MIN_PLAYERS,
            reshuffle_by_default: false,
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    min_team_count: Option<usize>,
    #[serde(default)]
    max_team_count: Option<usize>,
    #[serde(default)]
    min_players: Option<usize>,
    #[serde(default)]
    reshuffle_by_default: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let min_team_count = value.min_team_count.unwrap_or(defaults.min_team_count);
        let max_team_count = value.max_team_count.unwrap_or(defaults.max_team_count);

        let (min_team_count, max_team_count) =
            if min_team_count == 0 || min_team_count > max_team_count {
                warn!(
                    min_team_count,
                    max_team_count, "invalid team count window; using defaults"
                );
                (defaults.min_team_count, defaults.max_team_count)
            } else {
                (min_team_count, max_team_count)
            };

        Self {
            min_team_count,
            max_team_count,
            min_players: value.min_players.unwrap_or(defaults.min_players),
            reshuffle_by_default: value
                .reshuffle_by_default
                .unwrap_or(defaults.reshuffle_by_default),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_json(
            r#"{"min_team_count": 2, "max_team_count": 6, "min_players": 10, "reshuffle_by_default": true}"#,
        )
        .unwrap();

        assert_eq!(config.team_count_range(), 2..=6);
        assert_eq!(config.min_players, 10);
        assert!(config.reshuffle_by_default);
    }

    #[test]
    fn inverted_window_falls_back_to_default_window() {
        let config = AppConfig::from_json(r#"{"min_team_count": 5, "max_team_count": 3}"#).unwrap();
        assert_eq!(config.team_count_range(), 2..=4);

        let config = AppConfig::from_json(r#"{"min_team_count": 0}"#).unwrap();
        assert_eq!(config.team_count_range(), 2..=4);
    }

    #[test]
    fn non_object_documents_are_errors() {
        assert!(AppConfig::from_json("[1, 2]").is_err());
        assert!(AppConfig::from_json("[]").is_err());
        assert!(AppConfig::from_json("4").is_err());
        assert!(AppConfig::from_json("{\"min_players\": \"many\"}").is_err());
    }
}

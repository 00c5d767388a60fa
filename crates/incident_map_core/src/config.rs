//! Application configuration.
//!
//! # Responsibility
//! - Declare tunables for logging, registry titles and the map surface.
//! - Load them from a JSON file with environment overrides.
//!
//! # Invariants
//! - Every field has a default; an empty `{}` document is a valid config.
//! - Unknown fields are rejected so typos surface at startup.
//! - `validate()` runs on every load path before a config is returned.

use crate::model::geo::{Coordinate, BUENOS_AIRES};
use crate::model::incident::{IncidentValidationError, DEFAULT_TITLE_PREFIX};
use crate::view::markers::{MarkerStyle, DEFAULT_PIN_LAYER_NAME};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_LOG_LEVEL: &str = "INCIDENT_MAP_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "INCIDENT_MAP_LOG_DIR";

/// How the default `#<n>` in new titles is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleNumbering {
    /// Monotonic creation counter; numbers are never reused after removal.
    #[default]
    Sequence,
    /// Current incident count plus one, evaluated with the insert.
    LiveCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub title_prefix: String,
    pub numbering: TitleNumbering,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            numbering: TitleNumbering::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// Initial map center.
    pub home: Coordinate,
    pub pin_layer_name: String,
    pub marker_style: MarkerStyle,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            home: BUENOS_AIRES,
            pin_layer_name: DEFAULT_PIN_LAYER_NAME.to_string(),
            marker_style: MarkerStyle::default(),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// `trace|debug|info|warn|error`; `None` uses the build default.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
    pub registry: RegistryConfig,
    pub map: MapConfig,
}

impl AppConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `INCIDENT_MAP_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides using a caller-supplied variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = Some(level);
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|v| !v.trim().is_empty()) {
            self.log_dir = Some(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.title_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(ConfigValidationError::BlankTitlePrefix));
        }
        if self.map.pin_layer_name.trim().is_empty() {
            return Err(ConfigError::Invalid(ConfigValidationError::BlankLayerName));
        }
        self.map
            .home
            .validate()
            .map_err(|err| ConfigError::Invalid(ConfigValidationError::InvalidHome(err)))?;

        let style = &self.map.marker_style;
        if !style.symbol_scale.is_finite() || style.symbol_scale <= 0.0 {
            return Err(ConfigError::Invalid(
                ConfigValidationError::InvalidSymbolScale(style.symbol_scale),
            ));
        }
        if !style.outline_width.is_finite() || style.outline_width < 0.0 {
            return Err(ConfigError::Invalid(
                ConfigValidationError::InvalidOutlineWidth(style.outline_width),
            ));
        }
        Ok(())
    }
}

/// Reads, parses and validates a config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_json_str(&raw)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigValidationError {
    BlankTitlePrefix,
    BlankLayerName,
    InvalidHome(IncidentValidationError),
    InvalidSymbolScale(f64),
    InvalidOutlineWidth(f64),
}

impl Display for ConfigValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitlePrefix => write!(f, "registry.title_prefix cannot be blank"),
            Self::BlankLayerName => write!(f, "map.pin_layer_name cannot be blank"),
            Self::InvalidHome(err) => write!(f, "map.home is invalid: {err}"),
            Self::InvalidSymbolScale(value) => {
                write!(f, "map.marker_style.symbol_scale must be > 0, got {value}")
            }
            Self::InvalidOutlineWidth(value) => {
                write!(f, "map.marker_style.outline_width must be >= 0, got {value}")
            }
        }
    }
}

impl Error for ConfigValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidHome(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(ConfigValidationError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, ConfigError, ConfigValidationError, TitleNumbering, ENV_LOG_DIR, ENV_LOG_LEVEL,
    };
    use crate::model::geo::BUENOS_AIRES;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.registry.title_prefix, "Incidencia");
        assert_eq!(config.registry.numbering, TitleNumbering::Sequence);
        assert_eq!(config.map.home, BUENOS_AIRES);
        assert_eq!(config.map.pin_layer_name, "Incidencias");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_json_str(
            r#"{"registry": {"numbering": "live_count"}, "log_level": "warn"}"#,
        )
        .unwrap();
        assert_eq!(config.registry.numbering, TitleNumbering::LiveCount);
        assert_eq!(config.registry.title_prefix, "Incidencia");
        assert_eq!(config.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AppConfig::from_json_str(r#"{"registy": {}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let err =
            AppConfig::from_json_str(r#"{"registry": {"title_prefix": "  "}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigValidationError::BlankTitlePrefix)
        ));

        let err = AppConfig::from_json_str(
            r#"{"map": {"home": {"latitude": 120.0, "longitude": 0.0}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigValidationError::InvalidHome(_))
        ));

        let err = AppConfig::from_json_str(r#"{"map": {"marker_style": {"symbol_scale": 0.0}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("symbol_scale"));
    }

    #[test]
    fn overrides_replace_logging_fields_and_skip_blank_values() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| match key {
            ENV_LOG_LEVEL => Some("debug".to_string()),
            ENV_LOG_DIR => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_dir, None);
    }
}

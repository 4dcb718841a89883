/// Engine configuration
///
/// Settings come from an optional TOML file, then from `PIN_*` environment
/// variables (a `.env` file in the working directory is loaded first).
/// Economics constants are not configurable; they live in
/// `plan::sizing` and `plan::economics`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::LogLevel;
use crate::model::PARAMETER_SLOTS;
use crate::profiles::{ProfileLoadError, ProfileRegistry};

pub const ENV_THRESHOLDS_PATH: &str = "PIN_THRESHOLDS_PATH";
pub const ENV_PARAMETER_SLOTS: &str = "PIN_PARAMETER_SLOTS";
pub const ENV_LOG_LEVEL: &str = "PIN_LOG_LEVEL";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Optional TOML file of `[[profiles]]` merged over the built-ins.
    pub thresholds_path: Option<PathBuf>,
    /// Denominator of the freshness coverage ratio.
    pub parameter_slots: usize,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds_path: None,
            parameter_slots: PARAMETER_SLOTS,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl EngineConfig {
    /// Reads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// File settings, then `.env` and process environment overrides.
    pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_THRESHOLDS_PATH) {
            self.thresholds_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = get(ENV_PARAMETER_SLOTS) {
            self.parameter_slots = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PARAMETER_SLOTS.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parameter_slots == 0 {
            return Err(ConfigError::InvalidValue {
                key: "parameter_slots".to_string(),
                value: "0".to_string(),
            });
        }
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::InvalidValue {
            key: "log_level".to_string(),
            value: self.log_level.clone(),
        })
    }

    /// Built-in profiles, overlaid with `thresholds_path` when set.
    pub fn registry(&self) -> Result<ProfileRegistry, ConfigError> {
        match &self.thresholds_path {
            Some(path) => ProfileRegistry::load(path).map_err(ConfigError::InvalidProfile),
            None => Ok(ProfileRegistry::builtin()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(toml::de::Error),
    InvalidValue { key: String, value: String },
    InvalidProfile(ProfileLoadError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Could not read config file {}", msg),
            ConfigError::Parse(err) => write!(f, "Config parse error: {}", err),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for {}", value, key)
            }
            ConfigError::InvalidProfile(err) => write!(f, "Threshold profiles: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_) | ConfigError::InvalidValue { .. } => None,
            ConfigError::Parse(err) => Some(err),
            ConfigError::InvalidProfile(err) => Some(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.parameter_slots, 12);
        assert_eq!(config.level().unwrap(), LogLevel::Info);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\nlog_file = \"planner.log\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.level().unwrap(), LogLevel::Debug);
        assert_eq!(config.log_file.as_deref(), Some("planner.log"));
        assert_eq!(config.parameter_slots, PARAMETER_SLOTS);
        assert!(config.thresholds_path.is_none());
    }

    #[test]
    fn test_zero_slots_rejected() {
        let err = EngineConfig::from_toml_str("parameter_slots = 0").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "parameter_slots")
        );
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("parameter_slots = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut config = EngineConfig::from_toml_str("parameter_slots = 10").unwrap();
        config
            .apply_overrides(lookup(&[
                (ENV_PARAMETER_SLOTS, "8"),
                (ENV_LOG_LEVEL, "warn"),
                (ENV_THRESHOLDS_PATH, "/etc/pin/profiles.toml"),
            ]))
            .unwrap();
        assert_eq!(config.parameter_slots, 8);
        assert_eq!(config.level().unwrap(), LogLevel::Warning);
        assert_eq!(config.thresholds_path, Some(PathBuf::from("/etc/pin/profiles.toml")));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = EngineConfig::default();
        config.apply_overrides(lookup(&[(ENV_LOG_LEVEL, "  ")])).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_bad_override_values_rejected() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_PARAMETER_SLOTS, "twelve")]))
            .unwrap_err();
        assert!(err.to_string().contains("twelve"));

        let mut config = EngineConfig::default();
        assert!(config.apply_overrides(lookup(&[(ENV_LOG_LEVEL, "loud")])).is_err());
    }

    #[test]
    fn test_registry_from_thresholds_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[profiles]]
id = "va-deq"
source = "Virginia DEQ"
states = ["VA"]

[profiles.dissolved_oxygen]
critical_mg_l = 3.0
stressed_mg_l = 4.0

[profiles.bloom]
bloom_ug_l = 15.0
significant_ug_l = 30.0
severe_ug_l = 60.0

[profiles.turbidity]
elevated_fnu = 20.0
impaired_fnu = 40.0

[profiles.nutrients]
tn_elevated_mg_l = 1.0
tn_excessive_mg_l = 2.5
tp_elevated_mg_l = 0.05
tp_excessive_mg_l = 0.1

[profiles.bacteria]
e_coli_mpn = 235.0
enterococcus_mpn = 104.0
fecal_coliform_mpn = 200.0
"#
        )
        .unwrap();

        let config = EngineConfig {
            thresholds_path: Some(file.path().to_path_buf()),
            ..EngineConfig::default()
        };
        let registry = config.registry().unwrap();
        assert_eq!(registry.for_state("VA").id, "va-deq");
        assert_eq!(registry.for_state("MD").id, "md-dnr");
    }

    #[test]
    fn test_missing_thresholds_file_is_error() {
        let config = EngineConfig {
            thresholds_path: Some(PathBuf::from("/nonexistent/profiles.toml")),
            ..EngineConfig::default()
        };
        assert!(matches!(config.registry(), Err(ConfigError::InvalidProfile(_))));
    }
}

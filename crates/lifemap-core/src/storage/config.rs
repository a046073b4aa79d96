//! TOML-based application configuration.
//!
//! Stores the tunables of the flow engine:
//! - Propagation strategy and pass budget
//! - Default reporting range
//! - Weight to share-point table
//!
//! Configuration is stored at `~/.config/lifemap/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::flow::{FlowEngine, Propagation, TimeRange, WeightTable, DEFAULT_PASSES};

/// Which propagation strategy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Fixed,
    UntilStable,
}

/// Flow engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Pass count for the fixed strategy.
    #[serde(default = "default_passes")]
    pub passes: usize,
    /// Convergence threshold in minutes for the until-stable strategy.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Upper bound on passes for the until-stable strategy.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    #[serde(default = "default_range")]
    pub default_range: TimeRange,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lifemap/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub weights: WeightTable,
}

fn default_passes() -> usize {
    DEFAULT_PASSES
}
fn default_epsilon() -> f64 {
    1e-6
}
fn default_max_passes() -> usize {
    64
}
fn default_range() -> TimeRange {
    TimeRange::Month
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Fixed,
            passes: default_passes(),
            epsilon: default_epsilon(),
            max_passes: default_max_passes(),
            default_range: default_range(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from `path`, returning defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        tracing::debug!(path = %path.display(), "saved config");
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.flow.strategy == StrategyKind::Fixed && self.flow.passes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "flow.passes".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.flow.strategy == StrategyKind::UntilStable {
            if !(self.flow.epsilon.is_finite() && self.flow.epsilon >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: "flow.epsilon".into(),
                    message: "must be a finite, non-negative number".into(),
                });
            }
            if self.flow.max_passes == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "flow.max_passes".into(),
                    message: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory. The result is validated before it replaces `self`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    pub fn propagation(&self) -> Propagation {
        match self.flow.strategy {
            StrategyKind::Fixed => Propagation::FixedPasses {
                passes: self.flow.passes,
            },
            StrategyKind::UntilStable => Propagation::UntilStable {
                epsilon: self.flow.epsilon,
                max_passes: self.flow.max_passes,
            },
        }
    }

    /// Engine configured with this weight table and strategy.
    pub fn engine(&self) -> FlowEngine<WeightTable> {
        FlowEngine::new(self.weights.clone()).with_propagation(self.propagation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::WeightPolicy;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.flow.passes, 5);
        assert_eq!(parsed.flow.default_range, TimeRange::Month);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[flow]\nstrategy = \"until_stable\"\n").unwrap();
        assert_eq!(cfg.flow.strategy, StrategyKind::UntilStable);
        assert_eq!(cfg.flow.max_passes, 64);
        assert_eq!(cfg.weights, WeightTable::default());
        assert_eq!(
            cfg.propagation(),
            Propagation::UntilStable {
                epsilon: 1e-6,
                max_passes: 64
            }
        );
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("flow.passes").as_deref(), Some("5"));
        assert_eq!(cfg.get("flow.default_range").as_deref(), Some("M"));
        assert_eq!(cfg.get("weights.points.2").as_deref(), Some("1.0"));
        assert!(cfg.get("flow.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_value_updates_nested_fields() {
        let mut cfg = Config::default();
        cfg.set_value("flow.passes", "8").unwrap();
        cfg.set_value("flow.strategy", "until_stable").unwrap();
        cfg.set_value("flow.default_range", "W").unwrap();
        cfg.set_value("weights.points.3", "2.5").unwrap();

        assert_eq!(cfg.flow.passes, 8);
        assert_eq!(cfg.flow.strategy, StrategyKind::UntilStable);
        assert_eq!(cfg.flow.default_range, TimeRange::Week);
        assert_eq!(cfg.weights.points(3), 2.5);
    }

    #[test]
    fn set_value_replaces_weight_table() {
        let mut cfg = Config::default();
        cfg.set_value("weights.points", r#"{"1": 1.0, "2": 4.0}"#)
            .unwrap();
        assert_eq!(cfg.weights.points(2), 4.0);
        assert_eq!(cfg.weights.points(3), 4.0);
    }

    #[test]
    fn set_value_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("flow.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set_value("flow.passes", "many"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set_value("flow.default_range", "fortnight").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_value_rejects_zero_passes() {
        let mut cfg = Config::default();
        let err = cfg.set_value("flow.passes", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "flow.passes"));
        assert_eq!(cfg.flow.passes, 5);

        cfg.set_value("flow.strategy", "until_stable").unwrap();
        cfg.set_value("flow.max_passes", "0").unwrap_err();
        assert_eq!(cfg.flow.max_passes, 64);
    }

    #[test]
    fn load_from_rejects_zero_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[flow]\npasses = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn set_value_rejects_decreasing_weights() {
        let mut cfg = Config::default();
        let err = cfg.set_value("weights.points.3", "0.1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(cfg.weights, WeightTable::default());
    }

    #[test]
    fn save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let mut cfg = Config::default();
        cfg.set_value("flow.passes", "7").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.flow.passes, 7);
        assert_eq!(
            loaded.engine().propagation(),
            Propagation::FixedPasses { passes: 7 }
        );
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "flow = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}

//! Query planning configuration.
//!
//! The configuration is plain serde data so it can be loaded from JSON, or
//! from TOML with the `toml` feature.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// What the planner does when a query needs more key ranges than one scan accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RangeOverflow {
    /// Split the ranges across several scans (default)
    #[default]
    Batch,
    /// Fail with `AlfalfaError::CapacityExceeded`
    Reject,
}

/// Planner configuration.
///
/// # Example
///
/// ```rust
/// use alfalfa::{Config, RangeOverflow};
///
/// let config = Config::default();
/// assert_eq!(config.max_ranges_per_scan, 4);
///
/// let json = r#"{
///     "max_ranges_per_scan": 8,
///     "range_overflow": "reject"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.range_overflow, RangeOverflow::Reject);
/// assert!(config.coalesce_ranges);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound on key ranges sent in a single scan request
    #[serde(default = "Config::default_max_ranges_per_scan")]
    pub max_ranges_per_scan: usize,

    /// Behaviour when a query needs more ranges than `max_ranges_per_scan`
    #[serde(default)]
    pub range_overflow: RangeOverflow,

    /// Merge key ranges that abut into a single range before scanning
    #[serde(default = "Config::default_coalesce_ranges")]
    pub coalesce_ranges: bool,
}

impl Config {
    const fn default_max_ranges_per_scan() -> usize {
        4
    }

    const fn default_coalesce_ranges() -> bool {
        true
    }

    pub fn with_max_ranges_per_scan(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Max ranges per scan must be greater than zero");
        self.max_ranges_per_scan = limit;
        self
    }

    pub fn with_range_overflow(mut self, overflow: RangeOverflow) -> Self {
        self.range_overflow = overflow;
        self
    }

    pub fn with_coalesce_ranges(mut self, coalesce: bool) -> Self {
        self.coalesce_ranges = coalesce;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_ranges_per_scan == 0 {
            return Err("Max ranges per scan must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_ranges_per_scan: Self::default_max_ranges_per_scan(),
            range_overflow: RangeOverflow::default(),
            coalesce_ranges: Self::default_coalesce_ranges(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_ranges_per_scan, 4);
        assert_eq!(config.range_overflow, RangeOverflow::Batch);
        assert!(config.coalesce_ranges);
    }

    #[test]
    #[should_panic(expected = "Max ranges per scan must be greater than zero")]
    fn test_config_zero_limit_panics() {
        Config::default().with_max_ranges_per_scan(0);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_max_ranges_per_scan(16)
            .with_range_overflow(RangeOverflow::Reject)
            .with_coalesce_ranges(false);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.max_ranges_per_scan = 0;
        assert!(config.validate().is_err());

        assert!(Config::from_json(r#"{"max_ranges_per_scan": 0}"#).is_err());
        assert!(Config::from_json(r#"{"range_overflow": "explode"}"#).is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml() {
        let config = Config::from_toml("max_ranges_per_scan = 2\nrange_overflow = \"reject\"\n")
            .unwrap();
        assert_eq!(config.max_ranges_per_scan, 2);
        assert_eq!(config.range_overflow, RangeOverflow::Reject);

        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}

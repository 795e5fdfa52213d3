//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::ConfigError;

/// What to do when the shrink branch runs out of room below the candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorPolicy {
    /// Probe the untested floor of the range once before settling, and
    /// fall back to the last size known to fit. With a monotonic oracle the
    /// result never overflows unless `min_font_size` itself does.
    #[default]
    ProbeFloor,
    /// Settle at the last tried candidate, even if it overflowed.
    KeepLastCandidate,
}

/// Tunables for the controller and shell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Steps beyond this many retries settle unconditionally.
    pub retry_ceiling: u32,
    /// Pixels added to the allowed height to absorb subpixel rounding.
    pub height_slack: f32,
    /// Headroom above an estimate when narrowing the range.
    pub estimate_margin: f32,
    /// Result cache entry bound.
    pub cache_capacity: usize,
    /// Width used when the container has not been measured yet.
    pub default_container_width: f32,
    /// Opacity of text while converging (near zero, never fully hidden).
    pub converging_opacity: f32,
    /// Time between convergence steps in the shell.
    pub frame_interval_ms: u64,
    pub floor_policy: FloorPolicy,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            retry_ceiling: 12,
            height_slack: 2.0,
            estimate_margin: 2.0,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            default_container_width: 400.0,
            converging_opacity: 0.01,
            frame_interval_ms: 16,
            floor_policy: FloorPolicy::ProbeFloor,
        }
    }
}

impl FitConfig {
    /// Config for tests: small cache, no frame delay.
    pub fn for_testing() -> Self {
        Self {
            cache_capacity: 16,
            frame_interval_ms: 0,
            ..Self::default()
        }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("FitConfig: loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.height_slack.is_finite() || self.height_slack < 0.0 {
            return Err(ConfigError::Invalid {
                field: "height_slack",
                reason: format!("must be a non-negative number, got {}", self.height_slack),
            });
        }
        if !self.estimate_margin.is_finite() || self.estimate_margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "estimate_margin",
                reason: format!("must be a non-negative number, got {}", self.estimate_margin),
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if !self.default_container_width.is_finite() || self.default_container_width <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "default_container_width",
                reason: format!("must be positive, got {}", self.default_container_width),
            });
        }
        if !(0.0..=1.0).contains(&self.converging_opacity) {
            return Err(ConfigError::Invalid {
                field: "converging_opacity",
                reason: format!("must be within [0, 1], got {}", self.converging_opacity),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FitConfig::default();
        assert_eq!(config.retry_ceiling, 12);
        assert_eq!(config.height_slack, 2.0);
        assert_eq!(config.estimate_margin, 2.0);
        assert_eq!(config.floor_policy, FloorPolicy::ProbeFloor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            FitConfig::from_json_str(r#"{ "retry_ceiling": 6, "floor_policy": "keep_last_candidate" }"#)
                .unwrap();
        assert_eq!(config.retry_ceiling, 6);
        assert_eq!(config.floor_policy, FloorPolicy::KeepLastCandidate);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = FitConfig::from_json_str(r#"{ "cache_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cache_capacity", .. }));

        let err = FitConfig::from_json_str(r#"{ "converging_opacity": 2.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "converging_opacity", .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FitConfig::from_json_str("{ retry_ceiling"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slidefit.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "default_container_width": 960.0 }}"#).unwrap();
        drop(file);

        let config = FitConfig::from_path(&path).unwrap();
        assert_eq!(config.default_container_width, 960.0);
    }

    #[test]
    fn test_from_path_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "retry_ceiling": "twelve" }}"#).unwrap();
        assert!(FitConfig::from_path(file.path()).is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = FitConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

//! Runtime tuning shared by every instance of a component.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating an [`ActionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse action config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tuning values for the transition machine and its timelines.
///
/// Missing fields fall back to their defaults when deserializing.
///
/// # Example
///
/// ```rust
/// use actionline::ActionConfig;
///
/// let config = ActionConfig::from_json(r#"{ "net_sync_threshold_ms": 150.0 }"#).unwrap();
/// assert_eq!(config.net_sync_threshold_ms, 150.0);
/// assert_eq!(config.rollback_interval_secs, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Minimum time after a rollback before a new transition may be taken.
    pub rollback_interval_secs: f64,
    /// Timeline divergence tolerated on observers before a forced correction.
    pub net_sync_threshold_ms: f64,
    /// Sub-step used by action types that do not set their own.
    pub sub_step_secs: f32,
    /// Transition records kept per instance.
    pub trail_capacity: usize,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            rollback_interval_secs: 0.1,
            net_sync_threshold_ms: 200.0,
            sub_step_secs: 1.0 / 60.0,
            trail_capacity: 32,
        }
    }
}

impl ActionConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rollback_interval_secs.is_finite() || self.rollback_interval_secs < 0.0 {
            return Err(ConfigError::Invalid {
                field: "rollback_interval_secs",
                reason: format!("{} is not a non-negative duration", self.rollback_interval_secs),
            });
        }
        if !self.net_sync_threshold_ms.is_finite() || self.net_sync_threshold_ms < 0.0 {
            return Err(ConfigError::Invalid {
                field: "net_sync_threshold_ms",
                reason: format!("{} is not a non-negative duration", self.net_sync_threshold_ms),
            });
        }
        if !self.sub_step_secs.is_finite() || self.sub_step_secs <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "sub_step_secs",
                reason: format!("{} must be positive", self.sub_step_secs),
            });
        }
        Ok(())
    }
}

//! Environment-backed matching configuration.
//!
//! All settings have defaults. Override with `TRACK_MATCH_*` environment
//! variables, or build a [`MatchConfig`] directly.

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default score the top candidate must reach to skip arbitration.
pub const DEFAULT_LLM_SCORE_THRESHOLD: f64 = 85.0;

/// Default lead the top candidate must have over the runner-up.
pub const DEFAULT_LLM_SCORE_DIFFERENCE: f64 = 15.0;

/// Default number of top-ranked candidates sent to the arbitrator.
pub const DEFAULT_MAX_CANDIDATES_TO_ARBITRATE: usize = 3;

/// Scoring weights and escalation thresholds.
///
/// The three weights should sum to 1.0 for totals to stay within 0-100.
/// This is a documented precondition; [`MatchConfig::validate`] does not
/// renormalize or reject other sums.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Weight of the title signal. Default: `0.5`.
    pub title_weight: f64,

    /// Weight of the primary-artist signal. Default: `0.3`.
    pub artist_weight: f64,

    /// Weight of the duration signal. Default: `0.2`.
    pub duration_weight: f64,

    /// Minimum top score for the confident path. Default: `85`.
    pub llm_score_threshold: f64,

    /// Minimum gap between first and second score for the confident path. Default: `15`.
    pub llm_score_difference: f64,

    /// How many top candidates the arbitrator sees. Default: `3`.
    pub max_candidates_to_arbitrate: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            title_weight: 0.5,
            artist_weight: 0.3,
            duration_weight: 0.2,
            llm_score_threshold: DEFAULT_LLM_SCORE_THRESHOLD,
            llm_score_difference: DEFAULT_LLM_SCORE_DIFFERENCE,
            max_candidates_to_arbitrate: DEFAULT_MAX_CANDIDATES_TO_ARBITRATE,
        }
    }
}

impl MatchConfig {
    const ENV_TITLE_WEIGHT: &'static str = "TRACK_MATCH_TITLE_WEIGHT";
    const ENV_ARTIST_WEIGHT: &'static str = "TRACK_MATCH_ARTIST_WEIGHT";
    const ENV_DURATION_WEIGHT: &'static str = "TRACK_MATCH_DURATION_WEIGHT";
    const ENV_SCORE_THRESHOLD: &'static str = "TRACK_MATCH_LLM_SCORE_THRESHOLD";
    const ENV_SCORE_DIFFERENCE: &'static str = "TRACK_MATCH_LLM_SCORE_DIFFERENCE";
    const ENV_MAX_CANDIDATES: &'static str = "TRACK_MATCH_MAX_CANDIDATES_TO_ARBITRATE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            title_weight: parse_env(Self::ENV_TITLE_WEIGHT, defaults.title_weight)?,
            artist_weight: parse_env(Self::ENV_ARTIST_WEIGHT, defaults.artist_weight)?,
            duration_weight: parse_env(Self::ENV_DURATION_WEIGHT, defaults.duration_weight)?,
            llm_score_threshold: parse_env(Self::ENV_SCORE_THRESHOLD, defaults.llm_score_threshold)?,
            llm_score_difference: parse_env(
                Self::ENV_SCORE_DIFFERENCE,
                defaults.llm_score_difference,
            )?,
            max_candidates_to_arbitrate: parse_env(
                Self::ENV_MAX_CANDIDATES,
                defaults.max_candidates_to_arbitrate,
            )?,
        })
    }

    /// Rejects non-finite or negative numbers and a zero arbitration width.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("title_weight", self.title_weight),
            ("artist_weight", self.artist_weight),
            ("duration_weight", self.duration_weight),
            ("llm_score_threshold", self.llm_score_threshold),
            ("llm_score_difference", self.llm_score_difference),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: format!("{} must be a finite non-negative number", value),
                });
            }
        }

        if self.max_candidates_to_arbitrate == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_candidates_to_arbitrate",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn weights_sum(&self) -> f64 {
        self.title_weight + self.artist_weight + self.duration_weight
    }

    /// True when the weights sum to 1.0 (within float tolerance), i.e. totals stay in 0-100.
    pub fn weights_are_normalized(&self) -> bool {
        (self.weights_sum() - 1.0).abs() < 1e-9
    }
}

/// Reads `name` from the environment, falling back to `default` when unset.
pub(crate) fn parse_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::InvalidNumber {
                name,
                reason: e.to_string(),
                value,
            }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 6] = [
        MatchConfig::ENV_TITLE_WEIGHT,
        MatchConfig::ENV_ARTIST_WEIGHT,
        MatchConfig::ENV_DURATION_WEIGHT,
        MatchConfig::ENV_SCORE_THRESHOLD,
        MatchConfig::ENV_SCORE_DIFFERENCE,
        MatchConfig::ENV_MAX_CANDIDATES,
    ];

    fn clear_env() {
        for name in ALL_VARS {
            env::remove_var(name);
        }
    }

    fn set_env(name: &str, value: &str) {
        env::set_var(name, value);
    }

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.title_weight, 0.5);
        assert_eq!(config.artist_weight, 0.3);
        assert_eq!(config.duration_weight, 0.2);
        assert_eq!(config.llm_score_threshold, 85.0);
        assert_eq!(config.llm_score_difference, 15.0);
        assert_eq!(config.max_candidates_to_arbitrate, 3);
        assert!(config.weights_are_normalized());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_when_unset() {
        clear_env();
        let config = MatchConfig::from_env().unwrap();
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_env(MatchConfig::ENV_SCORE_THRESHOLD, "90");
        set_env(MatchConfig::ENV_DURATION_WEIGHT, " 0.4 ");
        set_env(MatchConfig::ENV_MAX_CANDIDATES, "5");
        let config = MatchConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.llm_score_threshold, 90.0);
        assert_eq!(config.duration_weight, 0.4);
        assert_eq!(config.max_candidates_to_arbitrate, 5);
        assert_eq!(config.title_weight, 0.5);
        assert!(!config.weights_are_normalized());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        set_env(MatchConfig::ENV_TITLE_WEIGHT, "heavy");
        let result = MatchConfig::from_env();
        clear_env();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("TRACK_MATCH_TITLE_WEIGHT"));
        assert!(err.to_string().contains("heavy"));
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let config = MatchConfig {
            artist_weight: -0.1,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatchConfig {
            llm_score_threshold: f64::NAN,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let config = MatchConfig {
            max_candidates_to_arbitrate: 0,
            ..MatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_candidates_to_arbitrate"));
    }

    #[test]
    fn test_validate_does_not_enforce_weight_sum() {
        let config = MatchConfig {
            title_weight: 2.0,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(!config.weights_are_normalized());
    }
}

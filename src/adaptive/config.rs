use serde::{Deserialize, Serialize};

use crate::adaptive::error::{AdaptiveError, Result};

const DEFAULT_LEARNING_RATE: f64 = 0.1;
const DEFAULT_DISCOUNT_FACTOR: f64 = 0.9;
const DEFAULT_EXPLORATION_RATE: f64 = 0.1;
const DEFAULT_OBSERVATION_TTL_MS: u64 = 5_000;
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Learning hyperparameters, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hyperparameters {
    learning_rate: f64,
    discount_factor: f64,
    exploration_rate: f64,
}

impl Hyperparameters {
    /// α ∈ (0, 1], γ ∈ [0, 1], ε ∈ [0, 1].
    pub fn new(learning_rate: f64, discount_factor: f64, exploration_rate: f64) -> Result<Self> {
        let params = Self {
            learning_rate,
            discount_factor,
            exploration_rate,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(AdaptiveError::InvalidHyperparameter {
                name: "learning_rate",
                value: self.learning_rate,
            });
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(AdaptiveError::InvalidHyperparameter {
                name: "discount_factor",
                value: self.discount_factor,
            });
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(AdaptiveError::InvalidHyperparameter {
                name: "exploration_rate",
                value: self.exploration_rate,
            });
        }
        Ok(())
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            exploration_rate: DEFAULT_EXPLORATION_RATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub hyperparameters: Hyperparameters,
    /// Seed for the exploration RNG; `None` draws one from the thread RNG.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Voice labels below this confidence count as absent evidence.
    #[serde(default)]
    pub voice_confidence_threshold: f64,
    /// Latched modality readings older than this are treated as absent.
    #[serde(default = "default_observation_ttl_ms")]
    pub observation_ttl_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            seed: None,
            voice_confidence_threshold: 0.0,
            observation_ttl_ms: DEFAULT_OBSERVATION_TTL_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        let defaults = Hyperparameters::default();

        config.hyperparameters = Hyperparameters {
            learning_rate: env_parse("ADAPTIVE_LEARNING_RATE").unwrap_or(defaults.learning_rate),
            discount_factor: env_parse("ADAPTIVE_DISCOUNT_FACTOR")
                .unwrap_or(defaults.discount_factor),
            exploration_rate: env_parse("ADAPTIVE_EXPLORATION_RATE")
                .unwrap_or(defaults.exploration_rate),
        };
        config.seed = env_parse("ADAPTIVE_SEED");
        if let Some(val) = env_parse("ADAPTIVE_VOICE_MIN_CONFIDENCE") {
            config.voice_confidence_threshold = val;
        }
        if let Some(val) = env_parse("ADAPTIVE_OBSERVATION_TTL_MS") {
            config.observation_ttl_ms = val;
        }
        if let Some(val) = env_parse("ADAPTIVE_QUEUE_CAPACITY") {
            config.queue_capacity = val;
        }

        config
    }

    /// Construction-time check; a session must not start on an invalid config.
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        if !(0.0..=1.0).contains(&self.voice_confidence_threshold) {
            return Err(AdaptiveError::InvalidHyperparameter {
                name: "voice_confidence_threshold",
                value: self.voice_confidence_threshold,
            });
        }
        if self.queue_capacity == 0 {
            return Err(AdaptiveError::InvalidHyperparameter {
                name: "queue_capacity",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

fn default_observation_ttl_ms() -> u64 {
    DEFAULT_OBSERVATION_TTL_MS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = Hyperparameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.learning_rate(), 0.1);
        assert_eq!(params.discount_factor(), 0.9);
        assert_eq!(params.exploration_rate(), 0.1);
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_learning_rate_bounds() {
        assert!(Hyperparameters::new(1.0, 0.9, 0.1).is_ok());
        let err = Hyperparameters::new(0.0, 0.9, 0.1).unwrap_err();
        assert!(matches!(
            err,
            AdaptiveError::InvalidHyperparameter { name: "learning_rate", .. }
        ));
        assert!(Hyperparameters::new(1.5, 0.9, 0.1).is_err());
        assert!(Hyperparameters::new(f64::NAN, 0.9, 0.1).is_err());
    }

    #[test]
    fn test_discount_and_exploration_bounds() {
        assert!(Hyperparameters::new(0.1, 0.0, 0.0).is_ok());
        assert!(Hyperparameters::new(0.1, 1.0, 1.0).is_ok());
        assert!(Hyperparameters::new(0.1, -0.1, 0.1).is_err());
        assert!(Hyperparameters::new(0.1, 0.9, 1.01).is_err());
        assert!(Hyperparameters::new(0.1, 0.9, f64::INFINITY).is_err());
    }

    #[test]
    fn test_config_validation_rejects_bad_threshold() {
        let config = EngineConfig {
            voice_confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let json = r#"{"hyperparameters":{"learningRate":0.2,"discountFactor":0.5,"explorationRate":0.0}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hyperparameters.learning_rate(), 0.2);
        assert_eq!(config.observation_ttl_ms, DEFAULT_OBSERVATION_TTL_MS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.seed.is_none());
    }
}

use crate::error::{invalid, Result};
use crate::normalize::RangeMode;

/// Upper bound on the number of learning-rate levels (`learning_rate / decay`).
pub const MAX_LEVELS: f64 = 100_000.0;

/// Hyperparameters of one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub clusters: usize,
    pub learning_rate: f64,
    pub decay: f64,
    /// Full passes over the data at each learning-rate level.
    pub repeats: usize,
    pub seed: Option<u64>,
    pub range_mode: RangeMode,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            learning_rate: 0.3,
            decay: 0.05,
            repeats: 10,
            seed: None,
            range_mode: RangeMode::Absolute,
        }
    }
}

impl TrainingConfig {
    pub fn new(clusters: usize) -> Self {
        Self {
            clusters,
            ..Self::default()
        }
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn range_mode(mut self, range_mode: RangeMode) -> Self {
        self.range_mode = range_mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters < 2 {
            return invalid(format!("need at least 2 clusters, got {}", self.clusters));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(self.decay > 0.0 && self.decay.is_finite()) {
            return invalid(format!("decay must be positive, got {}", self.decay));
        }
        if self.learning_rate / self.decay > MAX_LEVELS {
            return invalid(format!(
                "learning rate {} with decay {} needs more than {} levels",
                self.learning_rate, self.decay, MAX_LEVELS
            ));
        }
        if self.repeats == 0 {
            return invalid("repeats must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = TrainingConfig::default();
        assert_eq!(cfg.clusters, 3);
        assert_eq!(cfg.repeats, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(TrainingConfig::new(1).validate().is_err());
        assert!(TrainingConfig::new(2).learning_rate(0.0).validate().is_err());
        assert!(TrainingConfig::new(2).learning_rate(1.5).validate().is_err());
        assert!(TrainingConfig::new(2).learning_rate(f64::NAN).validate().is_err());
        assert!(TrainingConfig::new(2).decay(0.0).validate().is_err());
        assert!(TrainingConfig::new(2).decay(-0.1).validate().is_err());
        assert!(TrainingConfig::new(2).repeats(0).validate().is_err());
        assert!(TrainingConfig::new(2).learning_rate(1.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_tiny_decay() {
        let cfg = TrainingConfig::new(2).learning_rate(0.3).decay(1e-300);
        assert!(matches!(
            cfg.validate(),
            Err(crate::error::ClusterError::InvalidConfiguration(_))
        ));
        assert!(TrainingConfig::new(2).learning_rate(1.0).decay(1e-12).validate().is_err());
        assert!(TrainingConfig::new(2)
            .learning_rate(1.0)
            .decay(0.001)
            .validate()
            .is_ok());
    }
}

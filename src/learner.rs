//! Winner-take-all competitive learning over a fixed set of prototypes.
//!
//! Only the best matching unit (BMU) of each presented vector moves; there is
//! no neighbourhood. Records are presented in input order, and each update is
//! visible to the next record of the same pass.

use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TrainingConfig;
use crate::distance::squared_euclidean;
use crate::error::{invalid, ClusterError, Result};

/// Slack used when counting learning-rate levels, so that e.g. 0.3 / 0.05
/// counts as 6 steps despite rounding.
const LEVEL_TOLERANCE: f64 = 1e-9;

/// Learning rates `lr0, lr0 - dlr, ...` down to the last one that is still `>= 0`.
///
/// Rates are computed from the level index rather than by repeated
/// subtraction, and a final rate within tolerance of zero is reported as
/// exactly `0.0`.
#[derive(Debug, Clone)]
pub struct LearningRateSchedule {
    initial: f64,
    decay: f64,
    level: usize,
    levels: usize,
}

impl LearningRateSchedule {
    pub fn new(initial: f64, decay: f64) -> Self {
        let levels = ((initial / decay + LEVEL_TOLERANCE).floor() as usize).saturating_add(1);
        Self {
            initial,
            decay,
            level: 0,
            levels,
        }
    }

    /// Total number of levels, i.e. `floor(lr0 / dlr) + 1`.
    pub fn levels(&self) -> usize {
        self.levels
    }
}

impl Iterator for LearningRateSchedule {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.level >= self.levels {
            return None;
        }
        let rate = self.initial - self.level as f64 * self.decay;
        self.level += 1;
        if rate.abs() <= LEVEL_TOLERANCE * self.decay {
            Some(0.0)
        } else {
            Some(rate.max(0.0))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.levels - self.level;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LearningRateSchedule {}

/// State after one learning-rate level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStats {
    pub rate: f64,
    /// Sum of squared distances from each record to its BMU.
    pub quantization_error: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSummary {
    pub levels: Vec<LevelStats>,
    pub passes: usize,
    pub updates: usize,
}

impl TrainingSummary {
    pub fn final_error(&self) -> Option<f64> {
        self.levels.last().map(|l| l.quantization_error)
    }
}

/// Index and distance of the prototype closest to `x`. Ties go to the lowest index.
pub(crate) fn nearest_prototype(prototypes: ArrayView2<f64>, x: ArrayView1<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, w) in prototypes.outer_iter().enumerate() {
        let dist = squared_euclidean(w, x).sqrt();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    (best, best_dist)
}

/// Owns the K x N prototype matrix and trains it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitiveLearner {
    prototypes: Array2<f64>,
}

impl CompetitiveLearner {
    /// K prototypes of dimension `dim`, each component uniform in [0, 1).
    pub fn initialize(clusters: usize, dim: usize, seed: Option<u64>) -> Result<Self> {
        if clusters < 2 {
            return invalid(format!("need at least 2 clusters, got {}", clusters));
        }
        if dim == 0 {
            return invalid("prototypes need at least one component");
        }
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let prototypes = Array2::from_shape_simple_fn((clusters, dim), || rng.gen::<f64>());
        Ok(Self { prototypes })
    }

    /// Start from an explicit prototype matrix (normalized space).
    pub fn from_prototypes(prototypes: Array2<f64>) -> Result<Self> {
        if prototypes.nrows() < 2 {
            return invalid(format!(
                "need at least 2 prototypes, got {}",
                prototypes.nrows()
            ));
        }
        if prototypes.ncols() == 0 {
            return invalid("prototypes need at least one component");
        }
        Ok(Self { prototypes })
    }

    pub fn clusters(&self) -> usize {
        self.prototypes.nrows()
    }

    pub fn dim(&self) -> usize {
        self.prototypes.ncols()
    }

    pub fn prototypes(&self) -> &Array2<f64> {
        &self.prototypes
    }

    fn check_dim(&self, width: usize) -> Result<()> {
        if width != self.dim() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.dim(),
                actual: width,
            });
        }
        Ok(())
    }

    pub fn best_matching_unit(&self, x: ArrayView1<f64>) -> Result<usize> {
        self.check_dim(x.len())?;
        Ok(nearest_prototype(self.prototypes.view(), x).0)
    }

    /// Sum over records of the squared distance to their BMU.
    pub fn quantization_error(&self, data: ArrayView2<f64>) -> Result<f64> {
        self.check_dim(data.ncols())?;
        Ok(self.error_of(data))
    }

    fn error_of(&self, data: ArrayView2<f64>) -> f64 {
        data.outer_iter()
            .map(|x| {
                let (_, d) = nearest_prototype(self.prototypes.view(), x);
                d * d
            })
            .sum()
    }

    /// Run the full learning-rate schedule over `data` (already normalized).
    ///
    /// All checks happen before the first update, so a rejected call leaves
    /// the prototypes untouched.
    pub fn train(
        &mut self,
        data: ArrayView2<f64>,
        config: &TrainingConfig,
    ) -> Result<TrainingSummary> {
        config.validate()?;
        if config.clusters != self.clusters() {
            return invalid(format!(
                "configured for {} clusters but learner holds {}",
                config.clusters,
                self.clusters()
            ));
        }
        if data.nrows() == 0 {
            return invalid("no records to train on");
        }
        if data.nrows() < self.clusters() {
            return invalid(format!(
                "Not enough records ({}) for {} clusters",
                data.nrows(),
                self.clusters()
            ));
        }
        self.check_dim(data.ncols())?;

        let schedule = LearningRateSchedule::new(config.learning_rate, config.decay);
        let mut summary = TrainingSummary::default();

        for rate in schedule {
            for _ in 0..config.repeats {
                for x in data.outer_iter() {
                    let (winner, _) = nearest_prototype(self.prototypes.view(), x);
                    Zip::from(self.prototypes.row_mut(winner))
                        .and(x)
                        .for_each(|w, &xi| *w += rate * (xi - *w));
                    summary.updates += 1;
                }
                summary.passes += 1;
            }
            summary.levels.push(LevelStats {
                rate,
                quantization_error: self.error_of(data),
            });
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_schedule_boundary() {
        let rates: Vec<f64> = LearningRateSchedule::new(0.3, 0.05).collect();
        assert_eq!(rates.len(), 7);
        let expected = [0.3, 0.25, 0.2, 0.15, 0.1, 0.05, 0.0];
        for (r, e) in rates.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*r, *e, epsilon = 1e-12);
        }
        assert_eq!(*rates.last().unwrap(), 0.0);
    }

    #[test]
    fn test_schedule_without_exact_zero() {
        let s = LearningRateSchedule::new(0.25, 0.1);
        assert_eq!(s.len(), 3);
        let rates: Vec<f64> = s.collect();
        assert_abs_diff_eq!(rates[2], 0.05, epsilon = 1e-12);

        assert_eq!(LearningRateSchedule::new(1.0, 0.3).levels(), 4);

        // 0.3 - 3 * 0.1 rounds just below zero; it still counts as a 0.0 level
        let rates: Vec<f64> = LearningRateSchedule::new(0.3, 0.1).collect();
        assert_eq!(rates.len(), 4);
        assert_eq!(rates[3], 0.0);
        assert_eq!(LearningRateSchedule::new(0.5, 1.0).levels(), 1);
    }

    #[test]
    fn test_initialize_is_seeded() {
        let a = CompetitiveLearner::initialize(4, 3, Some(11)).unwrap();
        let b = CompetitiveLearner::initialize(4, 3, Some(11)).unwrap();
        let c = CompetitiveLearner::initialize(4, 3, Some(12)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.prototypes().shape(), &[4, 3]);
        assert!(a.prototypes().iter().all(|&w| (0.0..1.0).contains(&w)));
    }

    #[test]
    fn test_initialize_rejects_bad_shape() {
        assert!(CompetitiveLearner::initialize(1, 3, Some(0)).is_err());
        assert!(CompetitiveLearner::initialize(3, 0, Some(0)).is_err());
        assert!(CompetitiveLearner::from_prototypes(array![[0.0, 0.0]]).is_err());
    }

    #[test]
    fn test_bmu_tie_goes_to_lowest_index() {
        let learner =
            CompetitiveLearner::from_prototypes(array![[1.0, 1.0], [1.0, 1.0], [0.0, 0.0]])
                .unwrap();
        assert_eq!(learner.best_matching_unit(array![1.0, 1.0].view()).unwrap(), 0);
        assert_eq!(learner.best_matching_unit(array![0.1, 0.1].view()).unwrap(), 2);
        // equidistant from (1,1) and (0,0)
        assert_eq!(learner.best_matching_unit(array![0.5, 0.5].view()).unwrap(), 0);
        assert!(learner.best_matching_unit(array![1.0].view()).is_err());
    }

    #[test]
    fn test_single_level_update_rule() {
        let mut learner =
            CompetitiveLearner::from_prototypes(array![[0.0, 0.0], [10.0, 10.0]]).unwrap();
        let data = array![[1.0, 1.0], [9.0, 9.0]];
        let cfg = TrainingConfig::new(2).learning_rate(0.5).decay(1.0).repeats(1);
        let summary = learner.train(data.view(), &cfg).unwrap();

        assert_eq!(summary.levels.len(), 1);
        assert_eq!(summary.passes, 1);
        assert_eq!(summary.updates, 2);
        assert_eq!(learner.prototypes(), &array![[0.5, 0.5], [9.5, 9.5]]);
        // each record now sits at distance sqrt(0.5) from its BMU
        assert_abs_diff_eq!(summary.final_error().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_updates_are_sequential_within_a_pass() {
        // the second record sees prototype 0 already moved by the first
        let mut learner =
            CompetitiveLearner::from_prototypes(array![[0.0], [100.0]]).unwrap();
        let data = array![[2.0], [2.0]];
        let cfg = TrainingConfig::new(2).learning_rate(0.5).decay(1.0).repeats(1);
        learner.train(data.view(), &cfg).unwrap();
        assert_eq!(learner.prototypes()[[0, 0]], 1.5);
        assert_eq!(learner.prototypes()[[1, 0]], 100.0);
    }

    #[test]
    fn test_zero_rate_level_leaves_prototypes() {
        let start = array![[0.2, 0.2], [0.8, 0.8]];
        let data = array![[0.0, 0.0], [1.0, 1.0]];

        let mut learner = CompetitiveLearner::from_prototypes(start.clone()).unwrap();
        let cfg = TrainingConfig::new(2).learning_rate(0.1).decay(0.1).repeats(1);
        let summary = learner.train(data.view(), &cfg).unwrap();
        assert_eq!(summary.levels.len(), 2);
        assert_eq!(summary.levels[1].rate, 0.0);
        assert_eq!(summary.levels[0].quantization_error, summary.levels[1].quantization_error);

        // after the 0.1 level the prototypes moved once, toward their own record
        assert_abs_diff_eq!(learner.prototypes()[[0, 0]], 0.18, epsilon = 1e-12);
        assert_abs_diff_eq!(learner.prototypes()[[1, 0]], 0.82, epsilon = 1e-12);
    }

    #[test]
    fn test_train_counts_levels_and_passes() {
        let data = array![[0.0, 0.1], [0.1, 0.0], [0.9, 1.0], [1.0, 0.9], [0.5, 0.5]];
        let mut learner = CompetitiveLearner::initialize(2, 2, Some(3)).unwrap();
        let cfg = TrainingConfig::new(2).learning_rate(0.3).decay(0.05);
        let summary = learner.train(data.view(), &cfg).unwrap();

        assert_eq!(summary.levels.len(), 7);
        assert_eq!(summary.passes, 70);
        assert_eq!(summary.updates, 70 * 5);
        assert!(summary.levels.iter().all(|l| l.quantization_error.is_finite()));
    }

    #[test]
    fn test_training_is_deterministic() {
        let data = array![[0.3, 0.7], [0.9, 0.1], [0.2, 0.2], [0.6, 0.4], [0.8, 0.8]];
        let cfg = TrainingConfig::new(3).seed(42);

        let mut a = CompetitiveLearner::initialize(3, 2, cfg.seed).unwrap();
        let mut b = CompetitiveLearner::initialize(3, 2, cfg.seed).unwrap();
        let sa = a.train(data.view(), &cfg).unwrap();
        let sb = b.train(data.view(), &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_train_rejects_before_mutating() {
        let start = array![[0.2, 0.2], [0.8, 0.8]];
        let mut learner = CompetitiveLearner::from_prototypes(start.clone()).unwrap();

        let empty = Array2::<f64>::zeros((0, 2));
        assert!(learner.train(empty.view(), &TrainingConfig::new(2)).is_err());

        let one = array![[0.5, 0.5]];
        assert!(learner.train(one.view(), &TrainingConfig::new(2)).is_err());

        let wide = array![[0.5, 0.5, 0.5], [0.1, 0.1, 0.1]];
        assert!(matches!(
            learner.train(wide.view(), &TrainingConfig::new(2)),
            Err(ClusterError::DimensionMismatch { expected: 2, actual: 3 })
        ));

        let ok = array![[0.5, 0.5], [0.1, 0.1]];
        assert!(learner.train(ok.view(), &TrainingConfig::new(3)).is_err());
        assert!(learner
            .train(ok.view(), &TrainingConfig::new(2).decay(0.0))
            .is_err());
        assert!(matches!(
            learner.train(ok.view(), &TrainingConfig::new(2).decay(1e-300)),
            Err(ClusterError::InvalidConfiguration(_))
        ));

        assert_eq!(learner.prototypes(), &start);
    }
}

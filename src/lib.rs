pub mod assign;
pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod export;
pub mod ingest;
pub mod learner;
pub mod normalize;
pub mod report;

use ndarray::Array2;

pub use assign::{assign, Assignment};
pub use config::TrainingConfig;
pub use dataset::{DataSet, Identity};
pub use error::{ClusterError, Result};
pub use ingest::{LoadOptions, RowFilter};
pub use learner::{CompetitiveLearner, LearningRateSchedule, TrainingSummary};
pub use normalize::{Normalizer, RangeMode};
pub use report::{ClusterReport, ClusterSummary};

/// Everything produced by one clustering run
#[derive(Debug, Clone)]
pub struct ClusterModel {
    pub normalizer: Normalizer,
    pub learner: CompetitiveLearner,
    pub assignment: Assignment,
    pub summary: TrainingSummary,
    pub report: ClusterReport,
}

/// Normalize, train from seeded random prototypes, assign and report.
///
/// The dataset itself is left untouched; normalization works on a copy.
pub fn cluster_dataset(dataset: &DataSet, config: &TrainingConfig) -> Result<ClusterModel> {
    config.validate()?;
    let learner =
        CompetitiveLearner::initialize(config.clusters, dataset.n_features(), config.seed)?;
    run(dataset, config, learner)
}

/// Same as [`cluster_dataset`], starting from the given normalized-space prototypes.
pub fn cluster_dataset_with(
    dataset: &DataSet,
    config: &TrainingConfig,
    prototypes: Array2<f64>,
) -> Result<ClusterModel> {
    config.validate()?;
    run(dataset, config, CompetitiveLearner::from_prototypes(prototypes)?)
}

fn run(
    dataset: &DataSet,
    config: &TrainingConfig,
    mut learner: CompetitiveLearner,
) -> Result<ClusterModel> {
    let mut data = dataset.features.clone();
    let normalizer = Normalizer::fit_transform(&mut data, config.range_mode)?;

    let summary = learner.train(data.view(), config)?;
    let assignment = assign(learner.prototypes().view(), data.view())?;
    let report = ClusterReport::build(
        dataset,
        &assignment,
        learner.prototypes().view(),
        &normalizer,
    )?;

    Ok(ClusterModel {
        normalizer,
        learner,
        assignment,
        summary,
        report,
    })
}

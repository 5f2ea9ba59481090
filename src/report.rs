use std::fmt;

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::assign::Assignment;
use crate::dataset::{DataSet, Identity};
use crate::error::{ClusterError, Result};
use crate::normalize::Normalizer;

/// One cluster as seen by exporters and plots.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub index: usize,
    pub members: Vec<Identity>,
    /// Prototype mapped back to raw feature scale.
    pub prototype: Array1<f64>,
}

impl ClusterSummary {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Per-cluster sizes, members and de-normalized prototypes, ordered by cluster index.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterReport {
    pub feature_names: Vec<String>,
    pub clusters: Vec<ClusterSummary>,
}

impl ClusterReport {
    pub fn build(
        dataset: &DataSet,
        assignment: &Assignment,
        prototypes: ArrayView2<f64>,
        normalizer: &Normalizer,
    ) -> Result<Self> {
        if assignment.clusters() != prototypes.nrows() {
            return Err(ClusterError::DimensionMismatch {
                expected: prototypes.nrows(),
                actual: assignment.clusters(),
            });
        }
        let raw = normalizer.inverse_rows(prototypes)?;
        let pairs = assignment.labelled(&dataset.identities)?;

        let mut clusters: Vec<ClusterSummary> = raw
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(index, row)| ClusterSummary {
                index,
                members: Vec::with_capacity(assignment.members(index).len()),
                prototype: row.to_owned(),
            })
            .collect();
        for (cluster, identity) in pairs {
            clusters[cluster].members.push(identity.clone());
        }

        Ok(Self {
            feature_names: dataset.feature_names.clone(),
            clusters,
        })
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(ClusterSummary::size).collect()
    }

    /// Sizes in ascending order, for display.
    pub fn sorted_sizes(&self) -> Vec<usize> {
        let mut sizes = self.sizes();
        sizes.sort_unstable();
        sizes
    }

    /// De-normalized prototypes stacked as a K x N matrix.
    pub fn prototype_matrix(&self) -> Array2<f64> {
        let n = self.feature_names.len();
        let mut out = Array2::zeros((self.clusters.len(), n));
        for (mut row, c) in out.axis_iter_mut(Axis(0)).zip(&self.clusters) {
            row.assign(&c.prototype);
        }
        out
    }
}

impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.clusters {
            writeln!(f, "Cluster {} has {} elements", c.index + 1, c.size())?;
        }
        write!(f, "{:?}", self.sorted_sizes())
    }
}

use ndarray::{Array2, ArrayView2, Axis};

use crate::dataset::Identity;
use crate::error::{invalid, ClusterError, Result};
use crate::learner::nearest_prototype;

/// Hard assignment of every record to one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// `labels[i]` is the cluster of record `i`.
    pub labels: Vec<usize>,
    /// Record indices per cluster, in input order.
    pub groups: Vec<Vec<usize>>,
}

impl Assignment {
    pub fn clusters(&self) -> usize {
        self.groups.len()
    }

    pub fn members(&self, cluster: usize) -> &[usize] {
        &self.groups[cluster]
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Vec::len).collect()
    }

    /// `(cluster, identity)` for every record, in input order.
    pub fn labelled<'a>(&self, identities: &'a [Identity]) -> Result<Vec<(usize, &'a Identity)>> {
        if identities.len() != self.labels.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.labels.len(),
                actual: identities.len(),
            });
        }
        Ok(self.labels.iter().copied().zip(identities).collect())
    }

    /// The rows of `data` belonging to each cluster.
    pub fn grouped_rows(&self, data: ArrayView2<f64>) -> Result<Vec<Array2<f64>>> {
        if data.nrows() != self.labels.len() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.labels.len(),
                actual: data.nrows(),
            });
        }
        Ok(self
            .groups
            .iter()
            .map(|members| data.select(Axis(0), members))
            .collect())
    }
}

/// Assign each row of `data` to its nearest prototype. Does not retrain.
pub fn assign(prototypes: ArrayView2<f64>, data: ArrayView2<f64>) -> Result<Assignment> {
    if prototypes.nrows() == 0 {
        return invalid("no prototypes to assign to");
    }
    if prototypes.ncols() != data.ncols() {
        return Err(ClusterError::DimensionMismatch {
            expected: prototypes.ncols(),
            actual: data.ncols(),
        });
    }

    let mut labels = Vec::with_capacity(data.nrows());
    let mut groups = vec![Vec::new(); prototypes.nrows()];
    for (i, x) in data.outer_iter().enumerate() {
        let (cluster, _) = nearest_prototype(prototypes, x);
        labels.push(cluster);
        groups[cluster].push(i);
    }
    Ok(Assignment { labels, groups })
}

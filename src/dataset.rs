use std::fmt;

use ndarray::Array2;

use crate::error::{invalid, ClusterError, Result};

/// The two pass-through labels of a record (e.g. player and team).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub primary: String,
    pub secondary: String,
}

impl Identity {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.primary, self.secondary)
    }
}

/// Labeled numeric records: row `i` of `features` belongs to `identities[i]`.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub identities: Vec<Identity>,
    pub features: Array2<f64>,
    pub feature_names: Vec<String>,
}

impl DataSet {
    /// Build a dataset from in-memory records. All feature vectors must share one length.
    pub fn from_records(records: Vec<(Identity, Vec<f64>)>) -> Result<Self> {
        let ncols = match records.first() {
            Some((_, row)) => row.len(),
            None => return invalid("no records given"),
        };
        if ncols == 0 {
            return invalid("records have no features");
        }

        let nrows = records.len();
        let mut identities = Vec::with_capacity(nrows);
        let mut flat = Vec::with_capacity(nrows * ncols);
        for (i, (identity, row)) in records.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(ClusterError::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
            if let Some(j) = row.iter().position(|x| !x.is_finite()) {
                return invalid(format!(
                    "record {} ({}): feature {} is not finite ({})",
                    i + 1,
                    identity.primary,
                    j,
                    row[j]
                ));
            }
            identities.push(identity);
            flat.extend(row);
        }

        let features = Array2::from_shape_vec((nrows, ncols), flat)
            .map_err(|e| ClusterError::InvalidConfiguration(e.to_string()))?;
        let feature_names = (0..ncols).map(|j| format!("f{}", j)).collect();

        Ok(Self {
            identities,
            features,
            feature_names,
        })
    }

    /// Replace the generated feature names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.n_features() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.n_features(),
                actual: names.len(),
            });
        }
        self.feature_names = names;
        Ok(self)
    }

    pub fn n_records(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

use ndarray::ArrayView1;

use crate::error::{ClusterError, Result};

/// Euclidean distance between two vectors of equal length.
pub fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(squared_euclidean(a, b).sqrt())
}

/// Sum of squared component differences; callers guarantee equal lengths.
#[inline]
pub(crate) fn squared_euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

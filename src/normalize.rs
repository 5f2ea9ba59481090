//! Per-feature linear scaling into a bounded range, and its inverse.
//!
//! For every feature `j` the scaler stores `(a_j, b_j)` with
//! `normalized = a_j * raw + b_j`, where `a_j = 1 / (M_j - m_j)` and
//! `b_j = -m_j / (M_j - m_j)`. `M_j` and `m_j` are the largest and smallest
//! absolute values of the feature over the whole dataset.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{invalid, ClusterError, Result};

/// How the per-feature range is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeMode {
    /// Independent max and min of `|x|`.
    #[default]
    Absolute,
    /// Single running scan seeded with the raw first value, where the minimum
    /// only moves when the maximum did not. Kept for parity with older results.
    LegacyScan,
}

/// Scale and offset of one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
    pub scale: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    coefficients: Vec<Coefficient>,
}

fn absolute_range(column: ArrayView1<f64>) -> (f64, f64) {
    column.iter().fold((f64::MIN, f64::MAX), |(hi, lo), x| {
        let x = x.abs();
        (hi.max(x), lo.min(x))
    })
}

fn legacy_range(column: ArrayView1<f64>) -> (f64, f64) {
    let first = column[0];
    let (mut hi, mut lo) = (first, first);
    for x in column.iter() {
        let x = x.abs();
        if x > hi {
            hi = x;
        } else if x < lo {
            lo = x;
        }
    }
    (hi, lo)
}

impl Normalizer {
    /// Compute coefficients from every row of `data`.
    pub fn fit(data: ArrayView2<f64>, mode: RangeMode) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return invalid("cannot normalize an empty dataset");
        }

        let mut coefficients = Vec::with_capacity(data.ncols());
        for (feature, column) in data.axis_iter(Axis(1)).enumerate() {
            if let Some(record) = column.iter().position(|x| !x.is_finite()) {
                return invalid(format!(
                    "feature {} of record {} is not finite ({})",
                    feature,
                    record + 1,
                    column[record]
                ));
            }
            let (hi, lo) = match mode {
                RangeMode::Absolute => absolute_range(column),
                RangeMode::LegacyScan => legacy_range(column),
            };
            let range = hi - lo;
            if range == 0.0 || !range.is_finite() {
                return Err(ClusterError::DegenerateRange { feature, value: hi });
            }
            coefficients.push(Coefficient {
                scale: 1.0 / range,
                offset: -lo / range,
            });
        }
        Ok(Self { coefficients })
    }

    pub fn from_coefficients(coefficients: Vec<Coefficient>) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.n_features() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.n_features(),
                actual: width,
            });
        }
        Ok(())
    }

    /// Map raw rows into normalized space, in place.
    pub fn transform(&self, data: &mut Array2<f64>) -> Result<()> {
        self.check_width(data.ncols())?;
        for mut row in data.axis_iter_mut(Axis(0)) {
            for (x, c) in row.iter_mut().zip(&self.coefficients) {
                *x = c.scale * *x + c.offset;
            }
        }
        Ok(())
    }

    /// Fit on `data`, then normalize it in place.
    pub fn fit_transform(data: &mut Array2<f64>, mode: RangeMode) -> Result<Self> {
        let normalizer = Self::fit(data.view(), mode)?;
        normalizer.transform(data)?;
        Ok(normalizer)
    }

    /// Map one normalized vector back to raw scale.
    pub fn inverse(&self, v: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_width(v.len())?;
        Ok(v.iter()
            .zip(&self.coefficients)
            .map(|(x, c)| (x - c.offset) / c.scale)
            .collect())
    }

    pub fn inverse_rows(&self, data: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for mut row in out.axis_iter_mut(Axis(0)) {
            for (x, c) in row.iter_mut().zip(&self.coefficients) {
                *x = (*x - c.offset) / c.scale;
            }
        }
        Ok(out)
    }
}

//! # Regridding
//!
//! Turns a sparse list of `(x, y, value)` bin results into a dense 2-D field
//! suitable for contouring: rows follow the sorted unique `y`, columns the
//! sorted unique `x`, and cells with no input stay `NaN`.
use std::collections::BTreeSet;

use nalgebra::DMatrix;
use ordered_float::OrderedFloat;

/// Dense field on the grid spanned by the unique coordinates of its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    /// Sorted unique x coordinates (columns)
    pub x: Vec<f64>,
    /// Sorted unique y coordinates (rows)
    pub y: Vec<f64>,
    /// `values[(row, col)]` is the value at `(x[col], y[row])`, `NaN` when absent
    pub values: DMatrix<f64>,
}

impl GriddedField {
    pub fn nrows(&self) -> usize {
        self.y.len()
    }

    pub fn ncols(&self) -> usize {
        self.x.len()
    }

    /// Value at `(x[col], y[row])`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// Coordinate matrices `(X, Y)` shaped like `values`, as `meshgrid(x, y)` would build them.
    pub fn mesh(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let (nr, nc) = (self.nrows(), self.ncols());
        let xs = DMatrix::from_fn(nr, nc, |_, c| self.x[c]);
        let ys = DMatrix::from_fn(nr, nc, |r, _| self.y[r]);
        (xs, ys)
    }

    /// Largest finite value of the field.
    pub fn max_finite(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .max_by(f64::total_cmp)
    }

    /// Row-major copy of the values, one `Vec` per `y`.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    /// Multiply every cell by a constant (e.g. N² × 10⁴ for display).
    pub fn scaled(&self, factor: f64) -> GriddedField {
        GriddedField {
            x: self.x.clone(),
            y: self.y.clone(),
            values: &self.values * factor,
        }
    }
}

/// Build a dense grid from sparse `(x, y, value)` triples.
///
/// Arguments
/// -----------------
/// * `points`: Bin results; when a coordinate pair repeats the last value wins.
///
/// Return
/// ----------
/// * The [`GriddedField`]; an empty input gives a `0 × 0` field.
pub fn regrid<I>(points: I) -> GriddedField
where
    I: IntoIterator<Item = (f64, f64, f64)>,
{
    let points: Vec<_> = points.into_iter().collect();

    let xs: BTreeSet<OrderedFloat<f64>> = points.iter().map(|p| OrderedFloat(p.0)).collect();
    let ys: BTreeSet<OrderedFloat<f64>> = points.iter().map(|p| OrderedFloat(p.1)).collect();
    let xs: Vec<OrderedFloat<f64>> = xs.into_iter().collect();
    let ys: Vec<OrderedFloat<f64>> = ys.into_iter().collect();

    let mut values = DMatrix::from_element(ys.len(), xs.len(), f64::NAN);
    for (x, y, v) in points {
        if let (Ok(col), Ok(row)) = (
            xs.binary_search(&OrderedFloat(x)),
            ys.binary_search(&OrderedFloat(y)),
        ) {
            values[(row, col)] = v;
        }
    }

    GriddedField {
        x: xs.into_iter().map(|v| v.0).collect(),
        y: ys.into_iter().map(|v| v.0).collect(),
        values,
    }
}

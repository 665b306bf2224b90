//! Two-dimensional row-major arrays.
//!
//! A [`Grid<T>`] stores `rows * cols` values; element `(row, col)` lives at
//! `row * cols + col`. Unlike a simulation field there is no wrapping and no
//! clamping: NaN is a legal value and marks samples outside the data domain.
//! [`DynGrid`] tags a grid with its runtime [`Precision`] so that inputs of
//! mixed widths can be gathered before the precision is resolved.

use crate::error::LicError;
use crate::precision::{Precision, Real};
use serde::{Deserialize, Serialize};

/// A dense 2D array in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

fn checked_len(rows: usize, cols: usize) -> Result<usize, LicError> {
    if rows == 0 || cols == 0 {
        return Err(LicError::InvalidDimensions);
    }
    rows.checked_mul(cols).ok_or(LicError::InvalidDimensions)
}

impl<T: Copy> Grid<T> {
    /// Creates a grid with every element set to `value`.
    ///
    /// Returns `LicError::InvalidDimensions` if either dimension is zero
    /// or if `rows * cols` overflows `usize`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Result<Self, LicError> {
        let len = checked_len(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![value; len],
        })
    }

    /// Wraps an existing row-major buffer, validating `data.len() == rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, LicError> {
        let expected = checked_len(rows, cols)?;
        if data.len() != expected {
            return Err(LicError::DimensionMismatch {
                lhs_rows: rows,
                lhs_cols: cols,
                rhs_rows: data.len(),
                rhs_cols: 1,
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a grid by evaluating `f(row, col)` for every element in row-major order.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Result<Self, LicError> {
        let len = checked_len(rows, cols)?;
        let data = (0..len).map(|i| f(i / cols, i % cols)).collect();
        Ok(Self { rows, cols, data })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Read-only access to the row-major buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the row-major buffer.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the grid. Hot loops index with
    /// coordinates they have already clamped.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Overwrites the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = row * self.cols + col;
        self.data[idx] = value;
    }

    /// Borrow of one row.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Applies `f` element-wise, producing a grid of the same shape.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// True if `other` has the same `(rows, cols)`.
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// `LicError::DimensionMismatch` unless `other` has the same shape.
    pub fn ensure_same_shape<U>(&self, other: &Grid<U>) -> Result<(), LicError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(LicError::DimensionMismatch {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: other.rows,
                rhs_cols: other.cols,
            })
        }
    }

    /// Iterates over all elements yielding `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(|(i, &v)| (i / self.cols, i % self.cols, v))
    }
}

impl<T: Real> Grid<T> {
    /// Smallest and largest finite values, or `None` if there are none.
    pub fn finite_range(&self) -> Option<(T, T)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Number of NaN elements.
    pub fn nan_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }
}

/// A grid whose element precision is only known at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DynGrid {
    Single(Grid<f32>),
    Double(Grid<f64>),
}

impl DynGrid {
    /// Element precision.
    pub fn precision(&self) -> Precision {
        match self {
            DynGrid::Single(_) => Precision::Single,
            DynGrid::Double(_) => Precision::Double,
        }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            DynGrid::Single(g) => g.shape(),
            DynGrid::Double(g) => g.shape(),
        }
    }

    /// Copies the grid into precision `T`, rounding when narrowing.
    pub fn cast<T: Real>(&self) -> Grid<T> {
        match self {
            DynGrid::Single(g) => g.map(T::cast_f32),
            DynGrid::Double(g) => g.map(T::cast_f64),
        }
    }

    /// Widened `f64` copy, whatever the stored precision.
    pub fn to_f64(&self) -> Grid<f64> {
        self.cast::<f64>()
    }
}

impl From<Grid<f32>> for DynGrid {
    fn from(g: Grid<f32>) -> Self {
        DynGrid::Single(g)
    }
}

impl From<Grid<f64>> for DynGrid {
    fn from(g: Grid<f64>) -> Self {
        DynGrid::Double(g)
    }
}

/// Layout of coordinate arrays produced by [`meshgrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indexing {
    /// Cartesian: shape `(ny, nx)`, x varies along columns.
    #[default]
    Xy,
    /// Matrix: shape `(nx, ny)`, x varies along rows.
    Ij,
}

/// Builds coordinate arrays from two axis vectors.
///
/// With [`Indexing::Xy`] the result has shape `(yv.len(), xv.len())` and
/// `xx[(r, c)] = xv[c]`; with [`Indexing::Ij`] it has shape
/// `(xv.len(), yv.len())` and `xx[(r, c)] = xv[r]`.
pub fn meshgrid<T: Copy>(
    xv: &[T],
    yv: &[T],
    indexing: Indexing,
) -> Result<(Grid<T>, Grid<T>), LicError> {
    match indexing {
        Indexing::Xy => {
            let xx = Grid::from_fn(yv.len(), xv.len(), |_, c| xv[c])?;
            let yy = Grid::from_fn(yv.len(), xv.len(), |r, _| yv[r])?;
            Ok((xx, yy))
        }
        Indexing::Ij => {
            let xx = Grid::from_fn(xv.len(), yv.len(), |r, _| xv[r])?;
            let yy = Grid::from_fn(xv.len(), yv.len(), |_, c| yv[c])?;
            Ok((xx, yy))
        }
    }
}

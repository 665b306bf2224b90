//! Error types for the LIC core.
//!
//! Every fatal condition is detected at an entry point before any expensive
//! work starts. Out-of-domain samples are not errors: they come back as NaN.

use thiserror::Error;

/// Errors produced by regridding, tracing and convolution.
#[derive(Debug, Error)]
pub enum LicError {
    /// A grid was requested with zero rows or columns, or `rows * cols` overflows.
    #[error("invalid dimensions: rows and cols must be non-zero")]
    InvalidDimensions,

    /// Two input arrays that must share a shape do not.
    #[error("shape mismatch for '{name}': expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    InvalidShape {
        name: String,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    /// The coordinate mesh has fewer than 2x2 samples and cannot hold a single cell.
    #[error("mesh of {rows}x{cols} samples is too small: at least 2x2 required")]
    MeshTooSmall { rows: usize, cols: usize },

    /// A resolved axis range has zero width, is inverted, or is not finite.
    #[error("degenerate {axis} range [{lo}, {hi}]: bounds must be finite with lo < hi")]
    DegenerateRange { axis: char, lo: f64, hi: f64 },

    /// The operand set handed to the precision resolver carried no precision.
    #[error("cannot resolve precision: {0}")]
    PrecisionResolution(String),

    /// `size_interpolated` was zero, or a `size x size` grid would overflow.
    #[error("invalid interpolation size {0}: must be at least 1 and fit a size x size grid")]
    InvalidSize(usize),

    /// Two grids consumed together (vector components, noise texture) differ in shape.
    #[error("dimension mismatch: {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
    DimensionMismatch {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    /// A numeric parameter was outside its valid range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Kernel weights were malformed.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// A named field source is not registered.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A named colormap is not registered.
    #[error("unknown colormap: {0}")]
    UnknownColormap(String),

    /// A precision name could not be parsed.
    #[error("unknown precision: {0}")]
    UnknownPrecision(String),

    /// Writing an output artifact failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl LicError {
    /// Shorthand for [`LicError::InvalidParameter`].
    pub fn parameter(name: &str, reason: impl Into<String>) -> Self {
        LicError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

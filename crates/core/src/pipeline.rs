//! End-to-end rendering of an analytic field over a rectangular box.
//!
//! [`render`] samples a [`FieldSource`] on a mesh grid, resamples it onto a
//! uniform `size x size` grid, convolves a seeded noise texture along the
//! flow and optionally adds hillshade relief. The field magnitude travels
//! along as the scalar overlay.

use crate::convolve::{lic_dyn, LicParams};
use crate::error::LicError;
use crate::field_source::{magnitude, FieldSource};
use crate::grid::{meshgrid, DynGrid, Grid, Indexing};
use crate::params::{param_f64, param_string, param_u64, param_usize};
use crate::precision::{Precision, Real};
use crate::regrid::{regrid, Bounds, DynResampled, RegridInput};
use crate::shade::{hillshade_dyn, ShadeParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

/// How mesh samples are distributed along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSpacing {
    #[default]
    Linear,
    /// Logarithmic: samples crowd towards the low end of the axis.
    Log,
}

impl AxisSpacing {
    /// `n` values from `lo` to `hi` inclusive.
    pub fn values(self, lo: f64, hi: f64, n: usize) -> Vec<f64> {
        if n == 1 {
            return vec![lo];
        }
        let last = (n - 1) as f64;
        let mut v: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / last;
                let u = match self {
                    AxisSpacing::Linear => t,
                    AxisSpacing::Log => (10f64.powf(t) - 1.0) / 9.0,
                };
                lo + (hi - lo) * u
            })
            .collect();
        v[n - 1] = hi;
        v
    }
}

/// The sampled box and the output layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxSpec {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    /// Mesh samples along x.
    pub nx: usize,
    /// Mesh samples along y.
    pub ny: usize,
    pub spacing: AxisSpacing,
    pub indexing: Indexing,
    /// Precision of the sampled mesh arrays.
    pub precision: Precision,
    /// Output axis length.
    pub size: usize,
    pub bounds: Bounds,
    /// Noise texture seed.
    pub seed: u64,
}

impl Default for BoxSpec {
    fn default() -> Self {
        Self {
            x0: -1.0,
            x1: 1.0,
            y0: -1.0,
            y1: 1.0,
            nx: 64,
            ny: 64,
            spacing: AxisSpacing::Linear,
            indexing: Indexing::Xy,
            precision: Precision::Double,
            size: 256,
            bounds: Bounds::default(),
            seed: 1,
        }
    }
}

impl BoxSpec {
    /// Reads box keys from JSON, falling back to defaults, then validates.
    pub fn from_json(params: &Value) -> Result<Self, LicError> {
        let d = Self::default();
        let spacing = match param_string(params, "spacing", "linear").as_str() {
            "linear" => AxisSpacing::Linear,
            "log" => AxisSpacing::Log,
            other => {
                return Err(LicError::parameter(
                    "spacing",
                    format!("unknown spacing '{other}'"),
                ))
            }
        };
        let indexing = match param_string(params, "indexing", "xy").as_str() {
            "xy" => Indexing::Xy,
            "ij" => Indexing::Ij,
            other => {
                return Err(LicError::parameter(
                    "indexing",
                    format!("unknown indexing '{other}'"),
                ))
            }
        };
        let spec = Self {
            x0: param_f64(params, "x0", d.x0),
            x1: param_f64(params, "x1", d.x1),
            y0: param_f64(params, "y0", d.y0),
            y1: param_f64(params, "y1", d.y1),
            nx: param_usize(params, "nx", d.nx),
            ny: param_usize(params, "ny", d.ny),
            spacing,
            indexing,
            precision: param_string(params, "precision", d.precision.name()).parse()?,
            size: param_usize(params, "size", d.size),
            bounds: Bounds::from_json(params),
            seed: param_u64(params, "seed", d.seed),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), LicError> {
        for (axis, lo, hi) in [('x', self.x0, self.x1), ('y', self.y0, self.y1)] {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(LicError::DegenerateRange { axis, lo, hi });
            }
        }
        if self.nx < 2 || self.ny < 2 {
            return Err(LicError::MeshTooSmall {
                rows: self.ny,
                cols: self.nx,
            });
        }
        if self.size == 0 || self.size.checked_mul(self.size).is_none() {
            return Err(LicError::InvalidSize(self.size));
        }
        Ok(())
    }
}

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq)]
pub struct LicImage {
    /// Uniform grid with the resampled field and its magnitude as `fieldo`.
    pub grid: DynResampled,
    /// LIC texture, `size x size`, row `j` at `yo[j]`.
    pub image: DynGrid,
    /// Hillshade of `image`, when shading was requested.
    pub relief: Option<DynGrid>,
}

impl LicImage {
    pub fn precision(&self) -> Precision {
        self.image.precision()
    }

    /// Resampled field magnitude.
    pub fn magnitude(&self) -> Option<DynGrid> {
        self.grid.field()
    }
}

fn with_precision(grid: Grid<f64>, precision: Precision) -> DynGrid {
    match precision {
        Precision::Single => DynGrid::Single(grid.map(|v| v as f32)),
        Precision::Double => DynGrid::Double(grid),
    }
}

/// Samples `source` over the box into `(xx, yy, v1, v2, magnitude)` at the box precision.
pub fn sample_mesh(
    source: &dyn FieldSource,
    spec: &BoxSpec,
) -> Result<[DynGrid; 5], LicError> {
    spec.validate()?;
    let xv = spec.spacing.values(spec.x0, spec.x1, spec.nx);
    let yv = spec.spacing.values(spec.y0, spec.y1, spec.ny);
    let (xx, yy) = meshgrid(&xv, &yv, spec.indexing)?;
    let (rows, cols) = xx.shape();

    let mut v1 = Grid::filled(rows, cols, 0.0)?;
    let mut v2 = Grid::filled(rows, cols, 0.0)?;
    let mut mag = Grid::filled(rows, cols, 0.0)?;
    for (r, c, x) in xx.iter() {
        let y = yy.get(r, c);
        let (vx, vy) = source.sample(x, y);
        v1.set(r, c, vx);
        v2.set(r, c, vy);
        mag.set(r, c, magnitude(source, x, y));
    }

    let p = spec.precision;
    Ok([
        with_precision(xx, p),
        with_precision(yy, p),
        with_precision(v1, p),
        with_precision(v2, p),
        with_precision(mag, p),
    ])
}

/// Renders `source` over the box described by `spec`.
#[instrument(skip_all, fields(size = spec.size, precision = %spec.precision))]
pub fn render(
    source: &dyn FieldSource,
    spec: &BoxSpec,
    lic: &LicParams,
    shade: Option<&ShadeParams>,
) -> Result<LicImage, LicError> {
    lic.validate()?;
    if let Some(s) = shade {
        s.validate()?;
    }
    let [xx, yy, v1, v2, mag] = sample_mesh(source, spec)?;
    let grid = regrid(&RegridInput {
        xx: &xx,
        yy: &yy,
        v1: &v1,
        v2: &v2,
        field: Some(&mag),
        bounds: spec.bounds,
        size: spec.size,
    })?;
    debug!(precision = %grid.precision(), "field resampled");

    let image = lic_dyn(&grid, spec.seed, lic)?;
    let relief = shade.map(|s| hillshade_dyn(&image, s)).transpose()?;
    Ok(LicImage {
        grid,
        image,
        relief,
    })
}

/// Finite `(min, max)` of any precision grid, widened to `f64`.
pub fn finite_range_f64(grid: &DynGrid) -> Option<(f64, f64)> {
    fn widen<T: Real>(g: &Grid<T>) -> Option<(f64, f64)> {
        g.finite_range().map(|(lo, hi)| (lo.as_f64(), hi.as_f64()))
    }
    match grid {
        DynGrid::Single(g) => widen(g),
        DynGrid::Double(g) => widen(g),
    }
}

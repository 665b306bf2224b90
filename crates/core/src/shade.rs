//! Hillshade relief for LIC images.
//!
//! Treats the image as a height map lit by a distant source and returns the
//! Lambertian intensity normalised to `[0, 1]`. Gradients are central
//! differences in the interior and one-sided on the edges.

use crate::error::LicError;
use crate::grid::{DynGrid, Grid};
use crate::params::param_f64;
use crate::precision::Real;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Light position and height exaggeration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadeParams {
    /// Compass direction of the light, degrees clockwise from north (+y).
    pub azimuth_deg: f64,
    /// Elevation of the light above the horizon, degrees.
    pub altitude_deg: f64,
    /// Height multiplier applied before taking gradients.
    pub vert_exag: f64,
}

impl Default for ShadeParams {
    fn default() -> Self {
        Self {
            azimuth_deg: 0.0,
            altitude_deg: 45.0,
            vert_exag: 5.0,
        }
    }
}

impl ShadeParams {
    pub fn from_json(params: &Value) -> Result<Self, LicError> {
        let d = Self::default();
        let shade = Self {
            azimuth_deg: param_f64(params, "azimuth_deg", d.azimuth_deg),
            altitude_deg: param_f64(params, "altitude_deg", d.altitude_deg),
            vert_exag: param_f64(params, "vert_exag", d.vert_exag),
        };
        shade.validate()?;
        Ok(shade)
    }

    pub fn validate(&self) -> Result<(), LicError> {
        if !self.azimuth_deg.is_finite() {
            return Err(LicError::parameter("azimuth_deg", "must be finite"));
        }
        if !(0.0..=90.0).contains(&self.altitude_deg) {
            return Err(LicError::parameter(
                "altitude_deg",
                format!("must lie in [0, 90], got {}", self.altitude_deg),
            ));
        }
        if !self.vert_exag.is_finite() {
            return Err(LicError::parameter("vert_exag", "must be finite"));
        }
        Ok(())
    }

    /// Unit vector pointing at the light.
    fn light(&self) -> [f64; 3] {
        let az = (90.0 - self.azimuth_deg).to_radians();
        let alt = self.altitude_deg.to_radians();
        [az.cos() * alt.cos(), az.sin() * alt.cos(), alt.sin()]
    }
}

/// Derivative along one axis of `values` at index `i` with unit spacing.
fn gradient<T: Real>(at: impl Fn(usize) -> T, i: usize, n: usize) -> T {
    if n < 2 {
        return T::zero();
    }
    if i == 0 {
        at(1) - at(0)
    } else if i == n - 1 {
        at(n - 1) - at(n - 2)
    } else {
        (at(i + 1) - at(i - 1)) * T::cast_f64(0.5)
    }
}

/// Shades `image` and returns intensities in `[0, 1]`; NaN cells stay NaN.
pub fn hillshade<T: Real>(image: &Grid<T>, params: &ShadeParams) -> Result<Grid<T>, LicError> {
    params.validate()?;
    let (rows, cols) = image.shape();
    let exag = T::cast_f64(params.vert_exag);
    let [lx, ly, lz] = params.light().map(T::cast_f64);

    let raw = Grid::from_fn(rows, cols, |r, c| {
        if image.get(r, c).is_nan() {
            return T::nan();
        }
        let dx = gradient(|i| image.get(r, i), c, cols) * exag;
        let dy = gradient(|j| image.get(j, c), r, rows) * exag;
        let norm = (dx * dx + dy * dy + T::one()).sqrt();
        (-dx * lx - dy * ly + lz) / norm
    })?;

    let Some((lo, hi)) = raw.finite_range() else {
        return Ok(raw);
    };
    let span = hi - lo;
    Ok(raw.map(|v| {
        if span > T::zero() {
            (v - lo) / span
        } else {
            v.max(T::zero()).min(T::one())
        }
    }))
}

/// [`hillshade`] at the image's own precision.
pub fn hillshade_dyn(image: &DynGrid, params: &ShadeParams) -> Result<DynGrid, LicError> {
    match image {
        DynGrid::Single(g) => hillshade(g, params).map(DynGrid::Single),
        DynGrid::Double(g) => hillshade(g, params).map(DynGrid::Double),
    }
}

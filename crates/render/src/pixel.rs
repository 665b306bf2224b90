//! Pure-computation RGBA conversion of LIC output.
//!
//! Always available (no feature gate) so callers that do their own encoding
//! can share the conversion with the `png` snapshot path.

use crate::colormap::Colormap;
use lic_core::pipeline::finite_range_f64;
use lic_core::{DynGrid, Grid, LicError, LicImage};
use serde_json::Value;

/// How an image is turned into pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub colormap: Colormap,
    /// Blend the colormapped field magnitude over the gray texture.
    pub overlay: bool,
    /// Overlay opacity in `[0, 1]`.
    pub alpha: f64,
    /// Put the largest `y` on the top pixel row.
    pub flip_y: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colormap: Colormap::gray(),
            overlay: false,
            alpha: 0.5,
            flip_y: true,
        }
    }
}

impl RenderOptions {
    /// Reads `colormap`, `overlay`, `alpha` and `flip_y` from JSON.
    pub fn from_json(params: &Value) -> Result<Self, LicError> {
        let d = Self::default();
        let colormap = match params.get("colormap").and_then(Value::as_str) {
            Some(name) => Colormap::from_name(name)?,
            None => d.colormap,
        };
        let opts = Self {
            colormap,
            overlay: params
                .get("overlay")
                .and_then(Value::as_bool)
                .unwrap_or(d.overlay),
            alpha: lic_core::params::param_f64(params, "alpha", d.alpha),
            flip_y: params
                .get("flip_y")
                .and_then(Value::as_bool)
                .unwrap_or(d.flip_y),
        };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<(), LicError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(LicError::parameter(
                "alpha",
                format!("must lie in [0, 1], got {}", self.alpha),
            ));
        }
        Ok(())
    }
}

/// Maps values to `[0, 1]` by their finite min/max; a flat grid maps to 0.5.
fn normalise(grid: &DynGrid) -> Grid<f64> {
    let g = grid.to_f64();
    match finite_range_f64(grid) {
        Some((lo, hi)) if hi > lo => g.map(|v| (v - lo) / (hi - lo)),
        Some(_) => g.map(|v| if v.is_finite() { 0.5 } else { f64::NAN }),
        None => g,
    }
}

fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Converts a LIC image to an RGBA8 buffer, `rows * cols * 4` bytes.
///
/// Without an overlay the normalised texture is sampled through the
/// colormap. With one, the normalised overlay is colormapped and blended
/// over the gray texture with `alpha`. A `relief` in `[0, 1]` multiplies the
/// result. NaN texture pixels become transparent black.
pub fn image_to_rgba(
    image: &DynGrid,
    overlay: Option<&DynGrid>,
    relief: Option<&DynGrid>,
    opts: &RenderOptions,
) -> Result<Vec<u8>, LicError> {
    opts.validate()?;
    let (rows, cols) = image.shape();
    for other in overlay.iter().chain(relief.iter()) {
        if other.shape() != (rows, cols) {
            let (r, c) = other.shape();
            return Err(LicError::DimensionMismatch {
                lhs_rows: rows,
                lhs_cols: cols,
                rhs_rows: r,
                rhs_cols: c,
            });
        }
    }

    let texture = normalise(image);
    let overlay = overlay.map(normalise);
    let relief = relief.map(DynGrid::to_f64);

    let mut buf = Vec::with_capacity(rows * cols * 4);
    for out_row in 0..rows {
        let row = if opts.flip_y { rows - 1 - out_row } else { out_row };
        for col in 0..cols {
            let t = texture.get(row, col);
            let rgb = match &overlay {
                None => opts.colormap.sample(t),
                Some(ov) => {
                    let gray = (!t.is_nan()).then_some([t; 3]);
                    match (gray, opts.colormap.sample(ov.get(row, col))) {
                        (Some(g), Some(c)) => Some(std::array::from_fn(|k| {
                            opts.alpha * c[k] + (1.0 - opts.alpha) * g[k]
                        })),
                        (g, _) => g,
                    }
                }
            };
            let shade = relief
                .as_ref()
                .map(|r| r.get(row, col))
                .filter(|s| s.is_finite())
                .unwrap_or(1.0);
            match rgb {
                Some([r, g, b]) => buf.extend_from_slice(&[
                    to_byte(r * shade),
                    to_byte(g * shade),
                    to_byte(b * shade),
                    255,
                ]),
                None => buf.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
    }
    Ok(buf)
}

/// [`image_to_rgba`] for a rendered [`LicImage`], overlaying its magnitude if asked.
pub fn lic_to_rgba(lic: &LicImage, opts: &RenderOptions) -> Result<Vec<u8>, LicError> {
    let magnitude = if opts.overlay { lic.magnitude() } else { None };
    image_to_rgba(&lic.image, magnitude.as_ref(), lic.relief.as_ref(), opts)
}

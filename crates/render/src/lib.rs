#![deny(unsafe_code)]
//! Field registry, colormaps and image output for LIC renders.
//!
//! This crate sits between `lic-core` (which does the numerics) and the CLI.
//! It maps field names to [`FieldSource`] implementations, turns LIC output
//! into RGBA pixels and, with the `png` feature, writes PNG files.

pub mod colormap;
pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

pub use colormap::Colormap;
pub use pixel::{image_to_rgba, lic_to_rgba, RenderOptions};

use lic_core::field_source::{
    Composite, CurlNoise, Dipole, FieldSource, Masked, Saddle, Source, Uniform, Vortex,
};
use lic_core::params::{param_f64, param_u64};
use lic_core::LicError;
use serde_json::Value;

/// All registered field names.
const FIELD_NAMES: &[&str] = &[
    "uniform", "vortex", "saddle", "source", "sink", "dipole", "curl", "obstacle",
    "composite",
];

/// Named demo fields, each configurable from JSON.
///
/// Use [`FieldKind::from_name`] for string-based construction (CLI, recipes).
pub enum FieldKind {
    /// Constant wind `(vx, vy)`.
    Uniform(Uniform),
    /// Rotation about `(x, y)`.
    Vortex(Vortex),
    /// Hyperbolic point at `(x, y)`.
    Saddle(Saddle),
    /// Outward or inward radial flow (`source` / `sink`).
    Source(Source),
    /// Source/sink pair.
    Dipole(Dipole),
    /// Perlin curl noise.
    Curl(CurlNoise),
    /// Uniform wind with a NaN disk where there is no data.
    Obstacle(Masked),
    /// Sum of `layers`, each `{"field": name, "params": {...}}`.
    Composite(Composite),
}

impl FieldKind {
    /// Constructs a field by name.
    ///
    /// Returns `LicError::UnknownField` if the name is not recognised.
    pub fn from_name(name: &str, params: &Value) -> Result<Self, LicError> {
        let x = param_f64(params, "x", 0.0);
        let y = param_f64(params, "y", 0.0);
        let strength = param_f64(params, "strength", 1.0);
        let field = match name {
            "uniform" => FieldKind::Uniform(Uniform {
                vx: param_f64(params, "vx", 1.0),
                vy: param_f64(params, "vy", 0.0),
            }),
            "vortex" => FieldKind::Vortex(Vortex {
                x,
                y,
                strength,
                radius: param_f64(params, "radius", 0.0),
            }),
            "saddle" => FieldKind::Saddle(Saddle { x, y, strength }),
            "source" => FieldKind::Source(Source { x, y, strength }),
            "sink" => FieldKind::Source(Source {
                x,
                y,
                strength: -strength,
            }),
            "dipole" => FieldKind::Dipole(Dipole {
                x,
                y,
                separation: param_f64(params, "separation", 1.0),
                strength,
            }),
            "curl" => {
                let seed = u32::try_from(param_u64(params, "noise_seed", 0))
                    .map_err(|_| LicError::parameter("noise_seed", "must fit in 32 bits"))?;
                FieldKind::Curl(CurlNoise::new(param_f64(params, "scale", 2.0), strength, seed))
            }
            "obstacle" => FieldKind::Obstacle(Masked::new(
                Box::new(Uniform {
                    vx: param_f64(params, "vx", 1.0),
                    vy: param_f64(params, "vy", 0.0),
                }),
                x,
                y,
                param_f64(params, "radius", 0.3),
            )),
            "composite" => FieldKind::Composite(composite(params)?),
            _ => return Err(LicError::UnknownField(name.to_string())),
        };
        Ok(field)
    }

    /// Returns a slice of all registered field names.
    pub fn list_fields() -> &'static [&'static str] {
        FIELD_NAMES
    }
}

impl FieldSource for FieldKind {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            FieldKind::Uniform(f) => f.sample(x, y),
            FieldKind::Vortex(f) => f.sample(x, y),
            FieldKind::Saddle(f) => f.sample(x, y),
            FieldKind::Source(f) => f.sample(x, y),
            FieldKind::Dipole(f) => f.sample(x, y),
            FieldKind::Curl(f) => f.sample(x, y),
            FieldKind::Obstacle(f) => f.sample(x, y),
            FieldKind::Composite(f) => f.sample(x, y),
        }
    }
}

/// Builds the `layers` of a composite field; without layers, a vortex in a
/// uniform stream.
fn composite(params: &Value) -> Result<Composite, LicError> {
    let Some(layers) = params.get("layers") else {
        return Ok(Composite::new()
            .add(Box::new(Vortex {
                x: 0.0,
                y: 0.0,
                strength: 1.0,
                radius: 0.5,
            }))
            .add(Box::new(Uniform { vx: 0.5, vy: 0.0 })));
    };
    let layers = layers
        .as_array()
        .filter(|l| !l.is_empty())
        .ok_or_else(|| LicError::parameter("layers", "must be a non-empty list"))?;
    layers.iter().try_fold(Composite::new(), |acc, layer| {
        let name = layer
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| LicError::parameter("layers", "every layer needs a 'field' name"))?;
        let empty = Value::Object(serde_json::Map::new());
        let params = layer.get("params").unwrap_or(&empty);
        Ok(acc.add(Box::new(FieldKind::from_name(name, params)?)))
    })
}

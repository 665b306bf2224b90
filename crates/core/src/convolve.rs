//! Line integral convolution.
//!
//! Every output pixel is the kernel-weighted average of the noise texture
//! along the streamline through that pixel. [`convolve_pixel`] is a pure
//! function of the field, texture, kernel and pixel index, so the image is
//! filled row-parallel without coordination.

use crate::error::LicError;
use crate::grid::{DynGrid, Grid};
use crate::kernel::KernelShape;
use crate::noise_texture::noise_texture;
use crate::params::{param_f64, param_f64_list, param_string, param_usize};
use crate::precision::Real;
use crate::regrid::{DynResampled, Resampled};
use crate::stream::{Direction, Integrator, Tracer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument};

const DEFAULT_STEP_LENGTH: f64 = 0.5;
const DEFAULT_STEPS: usize = 25;
const DEFAULT_ITERATIONS: usize = 1;

/// Tracer and kernel settings for one LIC run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicParams {
    /// Distance advanced per step, in cells.
    pub step_length: f64,
    /// Maximum steps in each direction; the kernel has `2 * steps + 1` weights.
    pub steps: usize,
    pub kernel: KernelShape,
    /// Number of convolution passes; each pass convolves the previous output.
    pub iterations: usize,
    pub integrator: Integrator,
}

impl Default for LicParams {
    fn default() -> Self {
        Self {
            step_length: DEFAULT_STEP_LENGTH,
            steps: DEFAULT_STEPS,
            kernel: KernelShape::default(),
            iterations: DEFAULT_ITERATIONS,
            integrator: Integrator::default(),
        }
    }
}

impl LicParams {
    /// Reads `step_length`, `steps`, `iterations`, `integrator` and the kernel
    /// (`kernel` name, optional `sigma`, or `weights` for a custom profile)
    /// from JSON, falling back to defaults, then validates.
    pub fn from_json(params: &Value) -> Result<Self, LicError> {
        let steps = param_usize(params, "steps", DEFAULT_STEPS);
        let kernel = match param_f64_list(params, "weights") {
            Some(weights) => KernelShape::Custom { weights },
            None => match param_string(params, "kernel", "sine").as_str() {
                "gaussian" if params.get("sigma").is_some() => KernelShape::Gaussian {
                    sigma: param_f64(params, "sigma", 1.0),
                },
                name => KernelShape::from_name(name, steps)?,
            },
        };
        let integrator = match param_string(params, "integrator", "euler").as_str() {
            "euler" => Integrator::Euler,
            "rk4" => Integrator::Rk4,
            other => {
                return Err(LicError::parameter(
                    "integrator",
                    format!("unknown integrator '{other}'"),
                ))
            }
        };
        let lic = Self {
            step_length: param_f64(params, "step_length", DEFAULT_STEP_LENGTH),
            steps,
            kernel,
            iterations: param_usize(params, "iterations", DEFAULT_ITERATIONS),
            integrator,
        };
        lic.validate()?;
        Ok(lic)
    }

    /// Checks ranges and that the kernel materialises for `steps`.
    pub fn validate(&self) -> Result<(), LicError> {
        if !(self.step_length.is_finite() && self.step_length > 0.0) {
            return Err(LicError::parameter(
                "step_length",
                format!("must be finite and positive, got {}", self.step_length),
            ));
        }
        if self.iterations == 0 {
            return Err(LicError::parameter("iterations", "must be at least 1"));
        }
        self.kernel.weights::<f64>(self.steps).map(|_| ())
    }
}

/// Convolves `noise` along the streamline through pixel `(col, row)`.
///
/// `weights` must hold `2 * tracer.max_steps() + 1` entries. A pixel whose
/// traces both stop immediately returns its own noise value.
pub fn convolve_pixel<T: Real>(
    tracer: &Tracer<'_, T>,
    weights: &[T],
    noise: &Grid<T>,
    col: usize,
    row: usize,
) -> T {
    let n = tracer.max_steps();
    debug_assert_eq!(weights.len(), 2 * n + 1);
    let own = noise.get(row, col);
    let mut acc = weights[n] * own;
    let mut total = weights[n];

    tracer.walk(col, row, Direction::Forward, |k, p| {
        acc = acc + weights[n + k] * noise.get(p.row, p.col);
        total = total + weights[n + k];
    });
    tracer.walk(col, row, Direction::Backward, |k, p| {
        acc = acc + weights[n - k] * noise.get(p.row, p.col);
        total = total + weights[n - k];
    });

    if total > T::zero() {
        acc / total
    } else {
        own
    }
}

/// Runs LIC over the whole field and returns the output image.
///
/// `v1`, `v2` and `noise` must share a shape. The output has the same shape
/// and precision.
#[instrument(skip_all, fields(rows = v1.rows(), cols = v1.cols(), steps = params.steps))]
pub fn line_integral_convolution<T: Real>(
    v1: &Grid<T>,
    v2: &Grid<T>,
    noise: &Grid<T>,
    params: &LicParams,
) -> Result<Grid<T>, LicError> {
    params.validate()?;
    v1.ensure_same_shape(noise)?;
    let tracer = Tracer::new(
        v1,
        v2,
        T::cast_f64(params.step_length),
        params.steps,
        params.integrator,
    )?;
    let weights = params.kernel.weights::<T>(params.steps)?;

    let started = Instant::now();
    let mut texture = noise.clone();
    for pass in 0..params.iterations {
        texture = convolve_pass(&tracer, &weights, &texture)?;
        debug!(pass, "convolution pass complete");
    }
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "lic done");
    Ok(texture)
}

fn convolve_pass<T: Real>(
    tracer: &Tracer<'_, T>,
    weights: &[T],
    noise: &Grid<T>,
) -> Result<Grid<T>, LicError> {
    let (rows, cols) = noise.shape();
    let mut out = Grid::filled(rows, cols, T::zero())?;
    out.data_mut()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, line)| {
            for (col, px) in line.iter_mut().enumerate() {
                *px = convolve_pixel(tracer, weights, noise, col, row);
            }
        });
    Ok(out)
}

/// LIC of a resampled grid with a seeded noise texture, at the grid's precision.
pub fn lic_dyn(
    grid: &DynResampled,
    seed: u64,
    params: &LicParams,
) -> Result<DynGrid, LicError> {
    fn run<T: Real>(r: &Resampled<T>, seed: u64, params: &LicParams) -> Result<Grid<T>, LicError> {
        let (rows, cols) = r.v1o.shape();
        let noise = noise_texture::<T>(rows, cols, seed)?;
        line_integral_convolution(&r.v1o, &r.v2o, &noise, params)
    }
    match grid {
        DynResampled::Single(r) => run(r, seed, params).map(DynGrid::Single),
        DynResampled::Double(r) => run(r, seed, params).map(DynGrid::Double),
    }
}

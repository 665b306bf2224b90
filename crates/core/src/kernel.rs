//! Convolution kernel profiles.
//!
//! A kernel for `n` steps per direction has `2n + 1` weights; index `n` is
//! the start cell, `n + k` the k-th forward step and `n - k` the k-th
//! backward step.

use crate::error::LicError;
use crate::precision::Real;
use serde::{Deserialize, Serialize};

/// Weighting profile along a streamline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum KernelShape {
    /// Every sample weighs the same.
    Box,
    /// Half sine wave, `sin(pi (k + 1) / (L + 1))`; never zero inside the kernel.
    #[default]
    Sine,
    /// Gaussian falloff; `sigma` is measured in steps.
    Gaussian { sigma: f64 },
    /// Explicit weights, `2n + 1` long.
    Custom { weights: Vec<f64> },
}

impl KernelShape {
    /// Looks a profile up by name. `gaussian` gets `sigma = steps / 2`.
    pub fn from_name(name: &str, steps: usize) -> Result<Self, LicError> {
        match name {
            "box" => Ok(KernelShape::Box),
            "sine" => Ok(KernelShape::Sine),
            "gaussian" => Ok(KernelShape::Gaussian {
                sigma: (steps as f64 / 2.0).max(0.5),
            }),
            _ => Err(LicError::InvalidKernel(format!("unknown kernel '{name}'"))),
        }
    }

    /// Names accepted by [`KernelShape::from_name`].
    pub fn list_names() -> &'static [&'static str] {
        &["sine", "box", "gaussian"]
    }

    /// Materialises `2 * steps + 1` weights at precision `T`.
    ///
    /// Fails with `LicError::InvalidKernel` if a weight is negative or not
    /// finite, if all weights are zero, or if a custom kernel has the wrong
    /// length. Fails with `LicError::InvalidParameter` if `steps` is too large
    /// for a kernel to exist.
    pub fn weights<T: Real>(&self, steps: usize) -> Result<Vec<T>, LicError> {
        let len = steps
            .checked_mul(2)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| {
                LicError::parameter("steps", format!("{steps} overflows the kernel length"))
            })?;
        if let KernelShape::Custom { weights } = self {
            if weights.len() != len {
                return Err(LicError::InvalidKernel(format!(
                    "custom kernel has {} weights, {len} needed for {steps} steps",
                    weights.len()
                )));
            }
        }

        let mut raw: Vec<f64> = Vec::new();
        raw.try_reserve_exact(len).map_err(|_| {
            LicError::parameter("steps", format!("no room for a kernel of {steps} steps"))
        })?;
        match self {
            KernelShape::Box => raw.resize(len, 1.0),
            KernelShape::Sine => raw.extend(
                (0..len).map(|k| (std::f64::consts::PI * (k + 1) as f64 / (len + 1) as f64).sin()),
            ),
            KernelShape::Gaussian { sigma } => {
                if !(sigma.is_finite() && *sigma > 0.0) {
                    return Err(LicError::InvalidKernel(format!(
                        "gaussian sigma must be finite and positive, got {sigma}"
                    )));
                }
                raw.extend((0..len).map(|k| {
                    let d = k as f64 - steps as f64;
                    (-0.5 * (d / sigma).powi(2)).exp()
                }));
            }
            KernelShape::Custom { weights } => raw.extend_from_slice(weights),
        }

        if let Some(bad) = raw.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(LicError::InvalidKernel(format!(
                "weights must be finite and non-negative, found {bad}"
            )));
        }
        if raw.iter().all(|&w| w == 0.0) {
            return Err(LicError::InvalidKernel("all weights are zero".to_string()));
        }
        Ok(raw.into_iter().map(T::cast_f64).collect())
    }
}

//! Analytic vector fields for building LIC inputs.
//!
//! A [`FieldSource`] returns `(vx, vy)` at any point of the plane. Sources
//! include a uniform wind, a vortex, a saddle, point sources and sinks, a
//! dipole, Perlin curl noise, a NaN mask and composites that sum sources.
//!
//! All implementations are deterministic: same inputs produce the same output.

use glam::DVec2;
use noise::{NoiseFn, Perlin};

/// A source of 2D vectors sampled in world coordinates.
pub trait FieldSource: Send + Sync {
    /// Sample the field at `(x, y)`. Returns `(vx, vy)`; NaN marks "no data".
    fn sample(&self, x: f64, y: f64) -> (f64, f64);
}

/// Distances below this are treated as zero.
const SINGULARITY_EPS: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Constant flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    pub vx: f64,
    pub vy: f64,
}

/// Counter-clockwise rotation about a centre.
///
/// With `radius <= 0` this is rigid rotation `(-ry, rx) * strength`; otherwise
/// the speed is damped by a Gaussian of width `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vortex {
    pub x: f64,
    pub y: f64,
    pub strength: f64,
    pub radius: f64,
}

/// Hyperbolic point: `(rx, -ry) * strength` about the centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saddle {
    pub x: f64,
    pub y: f64,
    pub strength: f64,
}

/// Radial flow, outward for positive `strength` and inward (a sink) for negative.
///
/// Speed falls off as `1 / r`; the centre itself is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Source {
    pub x: f64,
    pub y: f64,
    pub strength: f64,
}

/// A source at `+separation / 2` on the x axis paired with a sink at
/// `-separation / 2`, around the centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dipole {
    pub x: f64,
    pub y: f64,
    pub separation: f64,
    pub strength: f64,
}

/// Curl of scalar Perlin noise: divergence-free swirls.
pub struct CurlNoise {
    noise: Perlin,
    scale: f64,
    strength: f64,
    eps: f64,
}

/// Wraps another source and reports NaN inside a disk, modelling missing data.
pub struct Masked {
    inner: Box<dyn FieldSource>,
    centre: DVec2,
    radius: f64,
}

/// Sums the vectors of several [`FieldSource`]s.
#[derive(Default)]
pub struct Composite {
    sources: Vec<Box<dyn FieldSource>>,
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

impl CurlNoise {
    /// Curl noise with a finite-difference epsilon of 0.001.
    pub fn new(scale: f64, strength: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            strength,
            eps: 0.001,
        }
    }
}

impl Masked {
    pub fn new(inner: Box<dyn FieldSource>, x: f64, y: f64, radius: f64) -> Self {
        Self {
            inner,
            centre: DVec2::new(x, y),
            radius,
        }
    }
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source (builder pattern).
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, source: Box<dyn FieldSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn tuple(v: DVec2) -> (f64, f64) {
    (v.x, v.y)
}

/// Outward `strength / r` flow from `centre`; zero at the centre.
fn radial(centre: DVec2, p: DVec2, strength: f64) -> DVec2 {
    let r = p - centre;
    let dist_sq = r.length_squared();
    if dist_sq < SINGULARITY_EPS * SINGULARITY_EPS {
        return DVec2::ZERO;
    }
    r * (strength / dist_sq)
}

// ---------------------------------------------------------------------------
// FieldSource implementations
// ---------------------------------------------------------------------------

impl FieldSource for Uniform {
    fn sample(&self, _x: f64, _y: f64) -> (f64, f64) {
        (self.vx, self.vy)
    }
}

impl FieldSource for Vortex {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        let r = DVec2::new(x, y) - DVec2::new(self.x, self.y);
        let falloff = if self.radius > SINGULARITY_EPS {
            (-r.length_squared() / (2.0 * self.radius * self.radius)).exp()
        } else {
            1.0
        };
        tuple(r.perp() * (self.strength * falloff))
    }
}

impl FieldSource for Saddle {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        let r = DVec2::new(x - self.x, y - self.y);
        tuple(DVec2::new(r.x, -r.y) * self.strength)
    }
}

impl FieldSource for Source {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        tuple(radial(
            DVec2::new(self.x, self.y),
            DVec2::new(x, y),
            self.strength,
        ))
    }
}

impl FieldSource for Dipole {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        let p = DVec2::new(x, y);
        let centre = DVec2::new(self.x, self.y);
        let offset = DVec2::new(self.separation / 2.0, 0.0);
        let out = radial(centre + offset, p, self.strength);
        let into = radial(centre - offset, p, -self.strength);
        tuple(out + into)
    }
}

impl FieldSource for CurlNoise {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        let s = DVec2::new(x, y) * self.scale;
        let eps = self.eps * self.scale;
        if eps.abs() < SINGULARITY_EPS {
            return (0.0, 0.0);
        }
        // Curl of a scalar F: (dF/dy, -dF/dx).
        let f = |p: DVec2| self.noise.get([p.x, p.y]);
        let df_dy = (f(s + DVec2::Y * eps) - f(s - DVec2::Y * eps)) / (2.0 * eps);
        let df_dx = (f(s + DVec2::X * eps) - f(s - DVec2::X * eps)) / (2.0 * eps);
        (df_dy * self.strength, -df_dx * self.strength)
    }
}

impl FieldSource for Masked {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        if DVec2::new(x, y).distance(self.centre) < self.radius {
            return (f64::NAN, f64::NAN);
        }
        self.inner.sample(x, y)
    }
}

impl FieldSource for Composite {
    fn sample(&self, x: f64, y: f64) -> (f64, f64) {
        self.sources.iter().fold((0.0, 0.0), |(ax, ay), source| {
            let (sx, sy) = source.sample(x, y);
            (ax + sx, ay + sy)
        })
    }
}

/// Euclidean length of the field at `(x, y)`; NaN where the field is NaN.
pub fn magnitude(source: &dyn FieldSource, x: f64, y: f64) -> f64 {
    let (vx, vy) = source.sample(x, y);
    vx.hypot(vy)
}

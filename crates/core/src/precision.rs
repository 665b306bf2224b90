//! Working-precision resolution.
//!
//! Inputs arrive with mixed floating-point widths: coordinate arrays may be
//! `f32` while the vector components are `f64`, and bounds may be plain
//! integers, single or double scalars, or absent. [`resolve`] runs once up
//! front and yields a single [`Precision`] tag; every later stage is
//! monomorphised over the matching [`Real`] type, so no coercion happens
//! past that point.

use crate::error::LicError;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Floating-point width of a computation. Ordered so that `max` promotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// IEEE-754 binary32.
    Single,
    /// IEEE-754 binary64.
    Double,
}

impl Precision {
    /// Canonical lowercase name (`"single"` / `"double"`).
    pub fn name(self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Double => "double",
        }
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Precision {
    type Err = LicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "f32" | "float32" => Ok(Precision::Single),
            "double" | "f64" | "float64" => Ok(Precision::Double),
            _ => Err(LicError::UnknownPrecision(s.to_string())),
        }
    }
}

/// One participant of a precision resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A numeric array stored at the given precision.
    Array(Precision),
    /// A scalar with an explicit floating-point type.
    Scalar(Precision),
    /// A plain number without a floating-point type (an integer literal).
    Literal,
    /// An optional input that was not supplied.
    Absent,
}

impl Operand {
    /// The precision this operand imposes, if any.
    pub fn precision(self) -> Option<Precision> {
        match self {
            Operand::Array(p) | Operand::Scalar(p) => Some(p),
            Operand::Literal | Operand::Absent => None,
        }
    }
}

/// A bound value as supplied by a caller.
///
/// Integers are neutral and never force promotion; `f32` and `f64` values
/// carry their width into the resolution. In JSON, integers and `f64` are
/// bare numbers and `f32` is written `{"f32": v}` so its width survives a
/// round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScalarRepr", into = "ScalarRepr")]
pub enum Scalar {
    Int(i64),
    F64(f64),
    F32(f32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScalarRepr {
    Int(i64),
    F64(f64),
    F32 { f32: f32 },
}

impl From<ScalarRepr> for Scalar {
    fn from(r: ScalarRepr) -> Self {
        match r {
            ScalarRepr::Int(v) => Scalar::Int(v),
            ScalarRepr::F64(v) => Scalar::F64(v),
            ScalarRepr::F32 { f32 } => Scalar::F32(f32),
        }
    }
}

impl From<Scalar> for ScalarRepr {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Int(v) => ScalarRepr::Int(v),
            Scalar::F64(v) => ScalarRepr::F64(v),
            Scalar::F32(f32) => ScalarRepr::F32 { f32 },
        }
    }
}

impl Scalar {
    /// The value widened to `f64` (exact for `f32`; integers beyond 2^53 round).
    pub fn value(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::F32(v) => f64::from(v),
            Scalar::F64(v) => v,
        }
    }

    /// The operand this scalar contributes to a resolution.
    pub fn operand(self) -> Operand {
        match self {
            Scalar::Int(_) => Operand::Literal,
            Scalar::F32(_) => Operand::Scalar(Precision::Single),
            Scalar::F64(_) => Operand::Scalar(Precision::Double),
        }
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

/// Maps an optional bound to its operand; `None` is [`Operand::Absent`].
pub fn bound_operand(bound: Option<Scalar>) -> Operand {
    bound.map_or(Operand::Absent, Scalar::operand)
}

/// Resolves the common precision of a set of operands.
///
/// The result is the highest precision among the operands that carry one.
/// Literals and absent operands are ignored. An empty set, or one where no
/// operand carries a precision, is a caller bug and yields
/// [`LicError::PrecisionResolution`].
pub fn resolve<I>(operands: I) -> Result<Precision, LicError>
where
    I: IntoIterator<Item = Operand>,
{
    let mut seen = 0usize;
    let resolved = operands
        .into_iter()
        .inspect(|_| seen += 1)
        .filter_map(Operand::precision)
        .max();
    match resolved {
        Some(p) => Ok(p),
        None if seen == 0 => Err(LicError::PrecisionResolution(
            "empty operand set".to_string(),
        )),
        None => Err(LicError::PrecisionResolution(format!(
            "none of the {seen} operands carries a floating-point precision"
        ))),
    }
}

/// Floating-point element type of every grid in the pipeline.
///
/// Implemented for `f32` and `f64` only; [`Real::PRECISION`] links each type
/// to its [`Precision`] tag.
pub trait Real: Float + Default + Debug + Display + Send + Sync + 'static {
    /// The tag this type materialises.
    const PRECISION: Precision;

    /// Converts from `f64`, rounding to nearest when narrowing.
    fn cast_f64(v: f64) -> Self;

    /// Converts from `f32` (always exact).
    fn cast_f32(v: f32) -> Self;

    /// Widens to `f64` (always exact).
    fn as_f64(self) -> f64;
}

impl Real for f32 {
    const PRECISION: Precision = Precision::Single;

    fn cast_f64(v: f64) -> Self {
        v as f32
    }

    fn cast_f32(v: f32) -> Self {
        v
    }

    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Real for f64 {
    const PRECISION: Precision = Precision::Double;

    fn cast_f64(v: f64) -> Self {
        v
    }

    fn cast_f32(v: f32) -> Self {
        f64::from(v)
    }

    fn as_f64(self) -> f64 {
        self
    }
}

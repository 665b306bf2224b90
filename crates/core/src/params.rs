//! Typed lookups into a JSON parameter object.
//!
//! Lookups are forgiving: a missing key or a value of the wrong JSON type
//! yields the caller's default. Range checks happen afterwards, in the
//! `validate` methods of the parameter structs that use these helpers.

use crate::precision::Scalar;
use serde_json::Value;

/// `params[name]` as `f64`; integers are accepted and widened.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// `params[name]` as `usize`; only non-negative integers qualify.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// `params[name]` as `u64`; only non-negative integers qualify.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// `params[name]` as an owned string.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map_or_else(|| default.to_owned(), String::from)
}

/// `params[name]` as an optional bound.
///
/// Integer JSON numbers become [`Scalar::Int`] (precision-neutral), `{"f32": v}`
/// becomes [`Scalar::F32`] and all other numbers become [`Scalar::F64`].
/// Missing keys, `null` and non-numbers give `None`.
pub fn param_scalar(params: &Value, name: &str) -> Option<Scalar> {
    let value = params.get(name)?;
    if let Some(i) = value.as_i64() {
        return Some(Scalar::Int(i));
    }
    if let Some(v) = value.get("f32").and_then(Value::as_f64) {
        return Some(Scalar::F32(v as f32));
    }
    value.as_f64().map(Scalar::F64)
}

/// `params[name]` as a list of `f64`; any non-number element voids the list.
pub fn param_f64_list(params: &Value, name: &str) -> Option<Vec<f64>> {
    params
        .get(name)?
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect()
}

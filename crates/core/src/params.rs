//! Lenient helpers for reading typed options out of a `serde_json::Value` object.
//!
//! Each helper takes a JSON value, a key name, and a default. If the key is
//! missing or the value is not the expected type, the default is returned.

use serde_json::Value;

/// Extracts a `u32` from `params[name]`, returning `default` if missing,
/// wrong type, negative, or larger than `u32::MAX`.
pub fn param_u32(params: &Value, name: &str, default: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Extracts a `String` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}

/// Extracts a fixed-size `f32` array from `params[name]`.
///
/// Returns `default` unless the value is an array of exactly `N` numbers.
pub fn param_f32_array<const N: usize>(params: &Value, name: &str, default: [f32; N]) -> [f32; N] {
    let Some(items) = params.get(name).and_then(Value::as_array) else {
        return default;
    };
    if items.len() != N {
        return default;
    }
    let mut out = [0.0f32; N];
    for (slot, item) in out.iter_mut().zip(items) {
        match item.as_f64() {
            Some(v) => *slot = v as f32,
            None => return default,
        }
    }
    out
}
